//! User settings and the saved home location.
//!
//! One [`SettingsStore`] owns everything the user can change at runtime: the
//! home location, the geofence radius and switch, and the general app
//! preferences. It is persisted as a single JSON document (`settings.json`) in
//! the state directory. Changes are announced to subscribers as
//! [`SettingsEvent`]s, both for changes made through the store and for changes
//! picked up by [`SettingsStore::reload`] after another process wrote the file.
//!
//! Fields missing from the file take their defaults, so older files keep
//! loading as settings are added.

mod values;

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver, Sender};

use crate::common::constants::*;
use crate::common::validation::validate_radius;
use crate::geo::{Coordinate, HomeLocation};
use crate::state::{read_json, write_json_atomic};
use crate::words::Difficulty;

pub use values::{GenrePreference, Language, ReviewInterval, Theme};

#[cfg(test)]
mod tests;

/// Geofence radius and switch.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProximityConfig {
    pub radius_m: f64,
    pub enabled: bool,
}

impl Default for ProximityConfig {
    fn default() -> Self {
        Self {
            radius_m: DEFAULT_HOME_RADIUS,
            enabled: DEFAULT_GEOFENCE_ENABLED,
        }
    }
}

/// General preferences.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppSettings {
    pub auto_play: bool,
    /// Percent, 0-100
    pub volume: u8,
    pub music_genre: GenrePreference,
    pub geofence_notifications: bool,
    pub learning_reminders: bool,
    pub daily_goal_reminders: bool,
    pub theme: Theme,
    pub language: Language,
    pub offline_mode: bool,
    pub daily_word_goal: u32,
    pub difficulty_level: Difficulty,
    pub review_interval: ReviewInterval,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            auto_play: DEFAULT_AUTO_PLAY,
            volume: DEFAULT_VOLUME,
            music_genre: GenrePreference::All,
            geofence_notifications: true,
            learning_reminders: true,
            daily_goal_reminders: true,
            theme: Theme::Light,
            language: Language::Ja,
            offline_mode: false,
            daily_word_goal: DEFAULT_DAILY_WORD_GOAL,
            difficulty_level: Difficulty::Intermediate,
            review_interval: ReviewInterval::Daily,
        }
    }
}

/// What changed in the store.
#[derive(Debug, Clone, PartialEq)]
pub enum SettingsEvent {
    HomeChanged(Option<HomeLocation>),
    ProximityChanged(ProximityConfig),
    AppChanged(AppSettings),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
struct SettingsDocument {
    #[serde(skip_serializing_if = "Option::is_none")]
    home: Option<HomeLocation>,
    proximity: ProximityConfig,
    app: AppSettings,
}

pub struct SettingsStore {
    path: PathBuf,
    document: SettingsDocument,
    subscribers: Vec<Sender<SettingsEvent>>,
}

impl SettingsStore {
    /// Open the store in `state_dir`. A missing file gives the defaults.
    pub fn open(state_dir: &Path) -> Result<Self> {
        let path = state_dir.join(SETTINGS_FILE_NAME);
        let document = load_document(&path);
        Ok(Self {
            path,
            document,
            subscribers: Vec::new(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn get_home_location(&self) -> Option<HomeLocation> {
        self.document.home.clone()
    }

    pub fn set_home_location(
        &mut self,
        coordinate: Coordinate,
        address: Option<String>,
    ) -> Result<HomeLocation> {
        let home = HomeLocation::new(coordinate, address);
        self.document.home = Some(home.clone());
        self.save()?;
        self.notify(SettingsEvent::HomeChanged(Some(home.clone())));
        Ok(home)
    }

    pub fn clear_home_location(&mut self) -> Result<()> {
        if self.document.home.take().is_some() {
            self.save()?;
            self.notify(SettingsEvent::HomeChanged(None));
        }
        Ok(())
    }

    pub fn get_proximity_config(&self) -> ProximityConfig {
        self.document.proximity
    }

    /// Set radius and switch together. The radius must be within 50-500 m.
    pub fn set_proximity_config(&mut self, radius_m: f64, enabled: bool) -> Result<ProximityConfig> {
        let proximity = ProximityConfig {
            radius_m: validate_radius(radius_m)?,
            enabled,
        };
        if proximity != self.document.proximity {
            self.document.proximity = proximity;
            self.save()?;
            self.notify(SettingsEvent::ProximityChanged(proximity));
        }
        Ok(proximity)
    }

    pub fn set_geofence_enabled(&mut self, enabled: bool) -> Result<ProximityConfig> {
        let radius_m = self.document.proximity.radius_m;
        self.set_proximity_config(radius_m, enabled)
    }

    pub fn set_home_radius(&mut self, radius_m: f64) -> Result<ProximityConfig> {
        let enabled = self.document.proximity.enabled;
        self.set_proximity_config(radius_m, enabled)
    }

    pub fn app(&self) -> &AppSettings {
        &self.document.app
    }

    pub fn language(&self) -> Language {
        self.document.app.language
    }

    /// Set one setting by its key, as given on the command line.
    pub fn set_value(&mut self, key: &str, value: &str) -> Result<()> {
        match key {
            "geofence_enabled" => {
                self.set_geofence_enabled(values::parse_bool(key, value)?)?;
            }
            "home_radius" => {
                self.set_home_radius(values::parse_number(key, value)?)?;
            }
            _ => {
                let mut app = self.document.app.clone();
                values::apply(&mut app, key, value)?;
                if app != self.document.app {
                    self.document.app = app.clone();
                    self.save()?;
                    self.notify(SettingsEvent::AppChanged(app));
                }
            }
        }
        Ok(())
    }

    /// All settings as `(key, value)` pairs for display.
    pub fn describe(&self) -> Vec<(&'static str, String)> {
        let proximity = self.document.proximity;
        let mut rows = vec![
            ("geofence_enabled", proximity.enabled.to_string()),
            ("home_radius", format!("{}", proximity.radius_m)),
        ];
        rows.extend(values::describe(&self.document.app));
        rows
    }

    /// Receive an event for every later change.
    pub fn subscribe(&mut self) -> Receiver<SettingsEvent> {
        let (tx, rx) = mpsc::channel();
        self.subscribers.push(tx);
        rx
    }

    /// Re-read the file and announce what another process changed.
    pub fn reload(&mut self) -> Vec<SettingsEvent> {
        let fresh = load_document(&self.path);
        let mut events = Vec::new();

        if fresh.home != self.document.home {
            events.push(SettingsEvent::HomeChanged(fresh.home.clone()));
        }
        if fresh.proximity != self.document.proximity {
            events.push(SettingsEvent::ProximityChanged(fresh.proximity));
        }
        if fresh.app != self.document.app {
            events.push(SettingsEvent::AppChanged(fresh.app.clone()));
        }

        self.document = fresh;
        for event in &events {
            self.notify(event.clone());
        }
        events
    }

    fn save(&self) -> Result<()> {
        write_json_atomic(&self.path, &self.document)
    }

    fn notify(&mut self, event: SettingsEvent) {
        self.subscribers.retain(|tx| tx.send(event.clone()).is_ok());
    }
}

/// Read the settings document, falling back to defaults for a missing or
/// unreadable file.
fn load_document(path: &Path) -> SettingsDocument {
    match read_json::<SettingsDocument>(path) {
        Ok(Some(document)) => sanitize(document),
        Ok(None) => SettingsDocument::default(),
        Err(e) => {
            log_pipe!();
            log_warning!("Ignoring unreadable settings file: {e}");
            log_indented!("Using default settings");
            SettingsDocument::default()
        }
    }
}

/// Bring hand-edited values back into range.
fn sanitize(mut document: SettingsDocument) -> SettingsDocument {
    let radius = document.proximity.radius_m;
    if validate_radius(radius).is_err() {
        let clamped = if radius.is_finite() {
            radius.clamp(MINIMUM_HOME_RADIUS, MAXIMUM_HOME_RADIUS)
        } else {
            DEFAULT_HOME_RADIUS
        };
        log_pipe!();
        log_warning!("Home radius {radius} m is out of range, using {clamped} m");
        document.proximity.radius_m = clamped;
    }
    if let Some(home) = &document.home
        && Coordinate::new(home.coordinate.latitude, home.coordinate.longitude).is_err()
    {
        log_pipe!();
        log_warning!("Saved home location is invalid and was ignored");
        document.home = None;
    }
    document.app.volume = document.app.volume.min(100);
    document.app.daily_word_goal = document
        .app
        .daily_word_goal
        .clamp(MINIMUM_DAILY_WORD_GOAL, MAXIMUM_DAILY_WORD_GOAL);
    document
}
