//! The geofence daemon loop.
//!
//! One thread owns all mutable state: the settings store, the playback
//! trigger, the sampler and the song library. Everything else (the sampler
//! thread, the signal thread, the file watcher) only sends [`CoreMessage`]s
//! into a single channel, which the loop consumes in arrival order:
//!
//! ```text
//!   sampler thread ──Sample──┐
//!   signal thread ──Reload/Shutdown──┤
//!   file watcher ──Reload/SettingsChanged──┴──▶ Core::execute ──▶ PlaybackTrigger ──▶ Playback
//! ```
//!
//! The sampler only runs while the trigger is listening (a home location is
//! set and geofencing is enabled). Switching geofencing off or shutting down
//! bumps the sampler generation, so a fix that was still being acquired is
//! dropped when it arrives.
//!
//! After every trigger event the loop publishes a [`GeofenceStatus`] next to
//! the settings file for `mimicoach geofence status`.

use anyhow::Result;
use chrono::{Local, NaiveDate, Utc};
use std::path::PathBuf;
use std::sync::mpsc::{Receiver, Sender};

use crate::common::constants::STATUS_FILE_NAME;
use crate::common::utils::private_path;
use crate::config::{self, Config};
use crate::library::SongLibrary;
use crate::location::{self, LocationProvider, SampleMessage, Sampler};
use crate::playback::{Playback, create_sink};
use crate::settings::{SettingsEvent, SettingsStore};
use crate::state::status::{GeofenceStatus, clear_status, write_status};
use crate::trigger::{PlaybackTrigger, TriggerEvent, log_trigger_event};

#[cfg(test)]
mod tests;

/// Everything the core loop reacts to.
#[derive(Debug, Clone, PartialEq)]
pub enum CoreMessage {
    /// A fix or location error from the sampler.
    Sample(SampleMessage),
    /// Re-read `mimicoach.toml` (file change, SIGHUP or SIGUSR2).
    Reload,
    /// `settings.json` changed on disk.
    SettingsChanged,
    /// SIGINT or SIGTERM.
    Shutdown,
}

/// Whether the loop keeps going after a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopControl {
    Continue,
    Exit,
}

/// Dependencies for creating a [`Core`].
pub struct CoreParams {
    pub config: Config,
    pub settings: SettingsStore,
    pub library: SongLibrary,
    pub provider: Box<dyn LocationProvider>,
    pub playback: Playback,
    pub sender: Sender<CoreMessage>,
    pub receiver: Receiver<CoreMessage>,
    pub debug_enabled: bool,
}

pub struct Core {
    config: Config,
    settings: SettingsStore,
    library: SongLibrary,
    trigger: PlaybackTrigger,
    sampler: Sampler,
    // Provider waiting for the sampler's next start, set until first use or after a reload
    pending_provider: Option<Box<dyn LocationProvider>>,
    playback: Playback,
    status_path: PathBuf,
    sender: Sender<CoreMessage>,
    receiver: Receiver<CoreMessage>,
    debug_enabled: bool,
}

impl Core {
    pub fn new(params: CoreParams) -> Self {
        let trigger = PlaybackTrigger::new(
            params.settings.get_home_location(),
            params.settings.get_proximity_config(),
            params.config.max_fix_accuracy(),
        );

        let status_path = params.settings.path().with_file_name(STATUS_FILE_NAME);

        Self {
            config: params.config,
            settings: params.settings,
            library: params.library,
            trigger,
            sampler: Sampler::new(),
            pending_provider: Some(params.provider),
            playback: params.playback,
            status_path,
            sender: params.sender,
            receiver: params.receiver,
            debug_enabled: params.debug_enabled,
        }
    }

    pub fn trigger(&self) -> &PlaybackTrigger {
        &self.trigger
    }

    pub fn sampler(&self) -> &Sampler {
        &self.sampler
    }

    /// Arm the geofence and run until shutdown.
    pub fn execute(mut self) -> Result<()> {
        if let Some(custom_dir) = config::get_custom_config_dir() {
            log_block_start!("Base directory: {}", private_path(&custom_dir));
        }

        self.start()?;

        while let Ok(message) = self.receiver.recv() {
            if self.handle_message(message)? == LoopControl::Exit {
                break;
            }
        }

        self.shutdown();
        Ok(())
    }

    /// Arm the trigger and start sampling if it is listening.
    pub fn start(&mut self) -> Result<()> {
        match self.trigger.home() {
            Some(home) => {
                log_block_start!("Home: {}", home.label());
                log_indented!(
                    "Radius: {:.0} m, geofencing {}",
                    self.trigger.proximity().radius_m,
                    if self.trigger.proximity().enabled {
                        "on"
                    } else {
                        "off"
                    }
                );
            }
            None => {
                log_pipe!();
                log_warning!("No home location set");
                log_indented!("Run 'mimicoach home set <lat> <lon>' or 'mimicoach home here'");
            }
        }
        log_indented!("Playback: {}", self.playback.sink_name());

        let event = self.trigger.arm();
        log_trigger_event(&event, self.debug_enabled);
        self.publish_status();
        self.sync_sampler()
    }

    /// Process one message.
    pub fn handle_message(&mut self, message: CoreMessage) -> Result<LoopControl> {
        match message {
            CoreMessage::Sample(sample) => self.handle_sample(&sample),
            CoreMessage::Reload => {
                log_block_start!("Reloading configuration");
                match Config::load() {
                    Ok(config) => self.apply_config(config)?,
                    Err(e) => {
                        log_pipe!();
                        log_error!("Failed to reload configuration: {e:#}");
                        log_indented!("Continuing with the previous configuration");
                    }
                }
                let events = self.settings.reload();
                self.apply_settings_events(events)?;
            }
            CoreMessage::SettingsChanged => {
                let events = self.settings.reload();
                self.apply_settings_events(events)?;
            }
            CoreMessage::Shutdown => {
                log_block_start!("Shutting down");
                return Ok(LoopControl::Exit);
            }
        }
        Ok(LoopControl::Continue)
    }

    fn handle_sample(&mut self, sample: &SampleMessage) {
        if !self.sampler.is_current(sample) {
            if self.debug_enabled {
                log_pipe!();
                log_debug!(
                    "Dropped sample {} from sampler run {} (current run {})",
                    sample.sequence,
                    sample.generation,
                    self.sampler.generation()
                );
            }
            return;
        }

        let event = self.trigger.on_sample(sample);
        log_trigger_event(&event, self.debug_enabled);
        self.publish_status();

        if event.fires_play() {
            self.on_entered_home(Local::now().date_naive());
        }
    }

    /// Welcome the user home and start today's song when auto-play is on.
    fn on_entered_home(&mut self, day: NaiveDate) {
        let app = self.settings.app().clone();

        if app.geofence_notifications {
            log_info!("Welcome home!");
        }

        if !app.auto_play {
            log_indented!("Auto-play is off");
            return;
        }

        // The CLI may have seeded or changed the library since startup
        if let Err(e) = self.library.reload() {
            log_warning!("Failed to reload the song library: {e:#}");
        }

        match self
            .playback
            .play_todays_song(self.library.songs(), &app, day)
        {
            Ok(Some(song)) => log_indented!("Today's song: {}", song.summary()),
            Ok(None) => {
                log_warning!("The song library is empty");
                log_indented!("Run 'mimicoach songs seed' to install the built-in songs");
            }
            Err(e) => log_error!("Failed to start playback: {e:#}"),
        }
    }

    /// Apply a freshly loaded configuration.
    pub fn apply_config(&mut self, config: Config) -> Result<()> {
        if config == self.config {
            log_indented!("Configuration unchanged");
            return Ok(());
        }

        self.trigger.set_max_fix_accuracy(config.max_fix_accuracy());
        self.playback.set_sink(create_sink(config.player_command()));

        match location::create_provider(&config) {
            Ok(provider) => self.pending_provider = Some(provider),
            Err(e) => log_error!("Keeping the previous location provider: {e:#}"),
        }
        // Restarted below with the new provider and timing
        self.sampler.stop();

        self.config = config;
        self.config.log_config();
        self.sync_sampler()
    }

    /// Feed settings changes to the trigger and resync the sampler.
    pub fn apply_settings_events(&mut self, events: Vec<SettingsEvent>) -> Result<()> {
        if events.is_empty() {
            return Ok(());
        }

        let mut resample = false;
        for event in events {
            let trigger_event = match event {
                SettingsEvent::HomeChanged(home) => {
                    match &home {
                        Some(home) => log_block_start!("Home location changed: {}", home.label()),
                        None => log_block_start!("Home location cleared"),
                    }
                    resample = true;
                    self.trigger.set_home(home)
                }
                SettingsEvent::ProximityChanged(proximity) => {
                    log_block_start!(
                        "Geofence settings changed: radius {:.0} m, {}",
                        proximity.radius_m,
                        if proximity.enabled { "on" } else { "off" }
                    );
                    // A new radius can change the decision for the current position
                    resample = true;
                    self.trigger.set_proximity(proximity)
                }
                SettingsEvent::AppChanged(_) => {
                    if self.debug_enabled {
                        log_pipe!();
                        log_debug!("Application settings changed");
                    }
                    TriggerEvent::None
                }
            };
            log_trigger_event(&trigger_event, self.debug_enabled);
        }
        self.publish_status();

        if resample && self.trigger.is_listening() {
            self.sampler.stop();
        }
        self.sync_sampler()
    }

    /// Run the sampler exactly while the trigger is listening.
    fn sync_sampler(&mut self) -> Result<()> {
        let listening = self.trigger.is_listening();
        let active = self.sampler.is_running();

        if !listening {
            if active {
                self.sampler.stop();
                if self.debug_enabled {
                    log_pipe!();
                    log_debug!("Location sampling stopped");
                }
            }
            return Ok(());
        }
        if active {
            return Ok(());
        }

        let sender = self.sender.clone();
        let emit = move |sample: SampleMessage| sender.send(CoreMessage::Sample(sample)).is_ok();
        let settings = self.config.sampler_settings();

        let generation = match self.pending_provider.take() {
            Some(provider) => self.sampler.start(provider, settings, emit)?,
            None => self.sampler.restart(Some(settings), emit)?,
        };

        if self.debug_enabled {
            log_pipe!();
            log_debug!(
                "Location sampling started ({}, run {}, every {}s)",
                self.sampler.provider_name().unwrap_or("unknown"),
                generation,
                settings.poll_interval.as_secs()
            );
        }
        Ok(())
    }

    /// Write the trigger snapshot for other processes.
    fn publish_status(&self) {
        let status =
            GeofenceStatus::from_trigger(&self.trigger.status(), std::process::id(), Utc::now());
        if let Err(e) = write_status(&self.status_path, &status) {
            log_warning!("Failed to publish geofence status: {e:#}");
        }
    }

    fn shutdown(&mut self) {
        self.sampler.stop();
        if let Err(e) = clear_status(&self.status_path) {
            log_warning!("{e:#}");
        }
        let status = self.trigger.status();
        log_decorated!(
            "Geofence {} ({} play{} this session)",
            status.state,
            status.plays,
            if status.plays == 1 { "" } else { "s" }
        );
    }
}
