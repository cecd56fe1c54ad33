//! Configuration for the location sampler and the external players.
//!
//! The configuration lives in `mimicoach.toml` under `$XDG_CONFIG_HOME/mimicoach/`
//! (or the directory given with `--config`). A commented default file is written
//! on first run. Every field is optional; missing values fall back to the
//! constants in `common::constants`.
//!
//! User-facing preferences that the app itself edits (home location, proximity
//! radius, language, volume...) are not here; they live in the settings store
//! under the state directory.
//!
//! ## Example
//!
//! ```toml
//! #[Location]
//! provider = "geoclue"    # "geoclue", "static" or "replay"
//! poll_interval = 30      # Seconds between location samples (5-3600)
//! sample_timeout = 15     # Seconds to wait for a single fix (1-120)
//! max_fix_accuracy = 150  # Ignore fixes less accurate than this in meters (0 = accept all)
//! ```

pub mod builder;
pub mod loading;
pub mod validation;
pub mod watcher;

#[cfg(test)]
mod tests;

use anyhow::Result;
use serde::Deserialize;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use crate::common::constants::*;
use crate::common::utils::format_coordinates;
use crate::location::SamplerSettings;

pub use builder::create_default_config;
pub use loading::{get_config_path, get_custom_config_dir, load, load_from_path, set_config_dir};
pub use watcher::start_config_watcher;

/// Which location source feeds the sampler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderKind {
    /// The desktop location service (GeoClue2 over D-Bus).
    GeoClue,
    /// A constant coordinate, for desktops that never move.
    Static,
    /// A recorded JSON-lines track.
    Replay,
}

impl ProviderKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderKind::GeoClue => "geoclue",
            ProviderKind::Static => "static",
            ProviderKind::Replay => "replay",
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "geoclue" => Ok(ProviderKind::GeoClue),
            "static" => Ok(ProviderKind::Static),
            "replay" => Ok(ProviderKind::Replay),
            other => anyhow::bail!(
                "Unknown location provider '{}' (expected \"geoclue\", \"static\" or \"replay\")",
                other
            ),
        }
    }
}

/// Contents of `mimicoach.toml`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Config {
    pub provider: Option<String>,
    pub poll_interval: Option<u64>,
    pub sample_timeout: Option<u64>,
    pub max_fix_accuracy: Option<f64>,
    pub static_latitude: Option<f64>,
    pub static_longitude: Option<f64>,
    pub replay_track: Option<String>,
    pub player_command: Option<String>,
    pub speech_command: Option<String>,
}

impl Config {
    /// Load the configuration from the default (or `--config`) location.
    pub fn load() -> Result<Self> {
        loading::load()
    }

    pub fn provider_kind(&self) -> Result<ProviderKind> {
        self.provider.as_deref().unwrap_or(DEFAULT_PROVIDER).parse()
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval.unwrap_or(DEFAULT_POLL_INTERVAL))
    }

    pub fn sample_timeout(&self) -> Duration {
        Duration::from_secs(self.sample_timeout.unwrap_or(DEFAULT_SAMPLE_TIMEOUT))
    }

    pub fn max_fix_accuracy(&self) -> f64 {
        self.max_fix_accuracy.unwrap_or(DEFAULT_MAX_FIX_ACCURACY)
    }

    pub fn player_command(&self) -> &str {
        self.player_command
            .as_deref()
            .unwrap_or(DEFAULT_PLAYER_COMMAND)
    }

    pub fn speech_command(&self) -> &str {
        self.speech_command
            .as_deref()
            .unwrap_or(DEFAULT_SPEECH_COMMAND)
    }

    pub fn sampler_settings(&self) -> SamplerSettings {
        SamplerSettings {
            poll_interval: self.poll_interval(),
            timeout: self.sample_timeout(),
        }
    }

    /// Print the effective configuration.
    pub fn log_config(&self) {
        log_block_start!("Loaded configuration");

        match self.provider_kind() {
            Ok(ProviderKind::Static) => {
                if let (Some(lat), Some(lon)) = (self.static_latitude, self.static_longitude) {
                    log_indented!("Provider: static ({})", format_coordinates(lat, lon));
                } else {
                    log_indented!("Provider: static");
                }
            }
            Ok(ProviderKind::Replay) => {
                log_indented!(
                    "Provider: replay ({})",
                    self.replay_track.as_deref().unwrap_or("no track")
                );
            }
            Ok(kind) => log_indented!("Provider: {}", kind),
            Err(_) => log_indented!("Provider: {}", self.provider.as_deref().unwrap_or("?")),
        }

        log_indented!(
            "Poll interval: {}s, sample timeout: {}s",
            self.poll_interval().as_secs(),
            self.sample_timeout().as_secs()
        );

        let accuracy = self.max_fix_accuracy();
        if accuracy > 0.0 {
            log_indented!("Fix accuracy limit: {:.0} m", accuracy);
        } else {
            log_indented!("Fix accuracy limit: none");
        }

        log_indented!("Player: {}", self.player_command());
        log_indented!("Speech: {}", self.speech_command());
    }
}
