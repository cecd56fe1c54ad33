//! # MimiCoach Library
//!
//! Internal library for the mimicoach binary: an English vocabulary coach
//! that starts the day's song when the user arrives home.
//!
//! ## Architecture
//!
//! - **Geofence**: `geo` (haversine distance, proximity decision), `location`
//!   (providers and the background sampler), `trigger` (the edge-triggered
//!   playback state machine) and `core` (the daemon loop that ties them together)
//! - **User data**: `settings` (home location, radius, preferences), `words`,
//!   `library` (songs) and `session` (accounts), persisted under `state`
//! - **Output**: `playback` (song selection, player and speech commands)
//! - **Configuration**: `config` for `mimicoach.toml` with hot reload
//! - **Commands**: `args` parses the command line, `commands` implements it
//! - **Infrastructure**: `io` (lock file, signals), `logger` and `common`

// Import macros from logger module for use in all submodules
#[macro_use]
pub mod logger;

pub mod args;
pub mod commands;
pub mod common;
pub mod config;
pub mod core;
pub mod geo;
pub mod io;
pub mod library;
pub mod location;
pub mod playback;
pub mod session;
pub mod settings;
pub mod state;
pub mod trigger;
pub mod words;
