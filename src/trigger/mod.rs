//! Edge-triggered playback decision for the home geofence.
//!
//! The trigger keeps the memory that a single proximity check lacks. Each
//! accepted sample moves it between `Outside` and `Inside`; only the move into
//! `Inside` asks for a song to be played:
//!
//! ```text
//!            arm()               sample far           sample near
//!   Idle ───────────▶ Armed ───────────────▶ Outside ─────────────▶ Inside ══▶ play
//!     ▲                 │  sample near                  ◀─────────────
//!     │ disarm()        └───────────────────▶ Inside    sample far
//!     │                                        ══▶ play
//!   (any)            geofencing disabled: (any but Idle) ──▶ Armed
//! ```
//!
//! Samples are rejected without touching the state when they are stale (an
//! older sampler generation, an older sequence number, or an older timestamp
//! than the last applied sample), too imprecise, or when the trigger is not
//! listening. Location errors leave the state as it is and only mark the
//! geofence as unavailable until the next good sample.

mod logging;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::geo::{HomeLocation, is_near_home};
use crate::location::{LocationError, LocationFix, SampleMessage};
use crate::settings::ProximityConfig;

pub use logging::log_trigger_event;


/// Where the trigger believes the device is relative to home.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GeofenceState {
    /// Not listening: no home location, or not started yet.
    Idle,
    /// Listening, position relative to home not known yet.
    Armed,
    Outside,
    Inside,
}

impl GeofenceState {
    pub fn display_name(&self) -> &'static str {
        match self {
            GeofenceState::Idle => "Idle",
            GeofenceState::Armed => "Armed",
            GeofenceState::Outside => "Outside",
            GeofenceState::Inside => "Inside",
        }
    }
}

impl fmt::Display for GeofenceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// Why a sample did not reach the state machine.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RejectReason {
    NotArmed,
    Disabled,
    /// From a sampler run that has since been cancelled.
    StaleGeneration { generation: u64, current: u64 },
    /// Same run, but not newer than the last applied sample.
    OutOfOrder,
    Inaccurate { accuracy_m: f64, limit_m: f64 },
}

/// The outcome of feeding an input to the trigger.
#[derive(Debug, Clone, PartialEq)]
pub enum TriggerEvent {
    /// Nothing changed.
    None,
    Armed,
    Disarmed,
    /// Geofencing was switched off; the trigger waits in `Armed`.
    Suspended,
    /// First sample after arming placed the device away from home.
    Outside { distance_m: f64 },
    /// Transition into the home radius. Fires playback.
    EnteredHome { distance_m: f64 },
    /// Transition out of the home radius. Playback is left alone.
    LeftHome { distance_m: f64 },
    Rejected(RejectReason),
    Unavailable(LocationError),
}

impl TriggerEvent {
    /// Whether this event should start a song.
    pub fn fires_play(&self) -> bool {
        matches!(self, TriggerEvent::EnteredHome { .. })
    }
}

/// Snapshot for status output.
#[derive(Debug, Clone, PartialEq)]
pub struct TriggerStatus {
    pub state: GeofenceState,
    pub enabled: bool,
    pub unavailable: Option<LocationError>,
    pub last_distance_m: Option<f64>,
    pub last_sample_at: Option<DateTime<Utc>>,
    pub plays: u64,
}

#[derive(Debug, Clone)]
pub struct PlaybackTrigger {
    state: GeofenceState,
    home: Option<HomeLocation>,
    proximity: ProximityConfig,
    max_fix_accuracy: f64,
    generation: u64,
    last_sequence: Option<u64>,
    last_taken_at: Option<DateTime<Utc>>,
    last_distance_m: Option<f64>,
    unavailable: Option<LocationError>,
    plays: u64,
}

impl PlaybackTrigger {
    pub fn new(home: Option<HomeLocation>, proximity: ProximityConfig, max_fix_accuracy: f64) -> Self {
        Self {
            state: GeofenceState::Idle,
            home,
            proximity,
            max_fix_accuracy,
            generation: 0,
            last_sequence: None,
            last_taken_at: None,
            last_distance_m: None,
            unavailable: None,
            plays: 0,
        }
    }

    pub fn state(&self) -> GeofenceState {
        self.state
    }

    pub fn home(&self) -> Option<&HomeLocation> {
        self.home.as_ref()
    }

    pub fn proximity(&self) -> ProximityConfig {
        self.proximity
    }

    /// Whether a sampler should be running for this trigger.
    pub fn is_listening(&self) -> bool {
        self.state != GeofenceState::Idle && self.proximity.enabled
    }

    pub fn status(&self) -> TriggerStatus {
        TriggerStatus {
            state: self.state,
            enabled: self.proximity.enabled,
            unavailable: self.unavailable,
            last_distance_m: self.last_distance_m,
            last_sample_at: self.last_taken_at,
            plays: self.plays,
        }
    }

    /// `Idle -> Armed` when geofencing is enabled and a home location exists.
    pub fn arm(&mut self) -> TriggerEvent {
        if self.state != GeofenceState::Idle || self.home.is_none() || !self.proximity.enabled {
            return TriggerEvent::None;
        }
        self.state = GeofenceState::Armed;
        self.unavailable = None;
        TriggerEvent::Armed
    }

    /// Any state `-> Idle`.
    pub fn disarm(&mut self) -> TriggerEvent {
        if self.state == GeofenceState::Idle {
            return TriggerEvent::None;
        }
        self.state = GeofenceState::Idle;
        self.last_distance_m = None;
        self.unavailable = None;
        TriggerEvent::Disarmed
    }

    /// Replace the home location.
    ///
    /// A new home makes the current position unknown again: the trigger goes
    /// back to `Armed` (or `Idle` when the home was cleared) and the next sample
    /// decides, so arriving at the new home still plays.
    pub fn set_home(&mut self, home: Option<HomeLocation>) -> TriggerEvent {
        if self.home == home {
            return TriggerEvent::None;
        }
        self.home = home;
        self.last_distance_m = None;

        match (&self.home, self.state) {
            (None, _) => self.disarm(),
            (Some(_), GeofenceState::Idle) => self.arm(),
            (Some(_), _) => {
                self.state = GeofenceState::Armed;
                TriggerEvent::Armed
            }
        }
    }

    /// Apply a radius or enabled change.
    pub fn set_proximity(&mut self, proximity: ProximityConfig) -> TriggerEvent {
        let was_enabled = self.proximity.enabled;
        self.proximity = proximity;

        match (was_enabled, proximity.enabled) {
            (true, false) if self.state != GeofenceState::Idle => {
                self.state = GeofenceState::Armed;
                self.last_distance_m = None;
                self.unavailable = None;
                TriggerEvent::Suspended
            }
            (false, true) => self.arm(),
            _ => TriggerEvent::None,
        }
    }

    pub fn set_max_fix_accuracy(&mut self, max_fix_accuracy: f64) {
        self.max_fix_accuracy = max_fix_accuracy;
    }

    /// Feed one sampler message.
    pub fn on_sample(&mut self, message: &SampleMessage) -> TriggerEvent {
        if let Some(reason) = self.check_stamp(message.generation, message.sequence) {
            return TriggerEvent::Rejected(reason);
        }
        match &message.result {
            Ok(fix) => self.on_fix(message.generation, message.sequence, fix),
            Err(error) => self.on_location_error(message.generation, message.sequence, *error),
        }
    }

    fn on_fix(&mut self, generation: u64, sequence: u64, fix: &LocationFix) -> TriggerEvent {
        if self.state == GeofenceState::Idle {
            return TriggerEvent::Rejected(RejectReason::NotArmed);
        }
        if !self.proximity.enabled {
            return TriggerEvent::Rejected(RejectReason::Disabled);
        }
        let Some(home) = &self.home else {
            return TriggerEvent::Rejected(RejectReason::NotArmed);
        };
        if let Some(last) = self.last_taken_at
            && fix.taken_at < last
        {
            return TriggerEvent::Rejected(RejectReason::OutOfOrder);
        }
        if !fix.is_precise_enough(self.max_fix_accuracy) {
            return TriggerEvent::Rejected(RejectReason::Inaccurate {
                accuracy_m: fix.accuracy_m.unwrap_or(f64::NAN),
                limit_m: self.max_fix_accuracy,
            });
        }

        let distance_m = fix.coordinate.distance_to(&home.coordinate);
        let near = is_near_home(Some(&fix.coordinate), &home.coordinate, self.proximity.radius_m);

        self.accept_stamp(generation, sequence);
        self.last_taken_at = Some(fix.taken_at);
        self.last_distance_m = Some(distance_m);
        self.unavailable = None;

        let previous = self.state;
        self.state = if near {
            GeofenceState::Inside
        } else {
            GeofenceState::Outside
        };

        match (previous, self.state) {
            (GeofenceState::Armed | GeofenceState::Outside, GeofenceState::Inside) => {
                self.plays += 1;
                TriggerEvent::EnteredHome { distance_m }
            }
            (GeofenceState::Inside, GeofenceState::Outside) => TriggerEvent::LeftHome { distance_m },
            (GeofenceState::Armed, GeofenceState::Outside) => TriggerEvent::Outside { distance_m },
            _ => TriggerEvent::None,
        }
    }

    fn on_location_error(&mut self, generation: u64, sequence: u64, error: LocationError) -> TriggerEvent {
        if self.state == GeofenceState::Idle {
            return TriggerEvent::Rejected(RejectReason::NotArmed);
        }
        if !self.proximity.enabled {
            return TriggerEvent::Rejected(RejectReason::Disabled);
        }
        self.accept_stamp(generation, sequence);
        let changed = self.unavailable != Some(error);
        self.unavailable = Some(error);
        if changed {
            TriggerEvent::Unavailable(error)
        } else {
            TriggerEvent::None
        }
    }

    fn check_stamp(&self, generation: u64, sequence: u64) -> Option<RejectReason> {
        if generation < self.generation {
            return Some(RejectReason::StaleGeneration {
                generation,
                current: self.generation,
            });
        }
        if generation == self.generation
            && let Some(last) = self.last_sequence
            && sequence <= last
        {
            return Some(RejectReason::OutOfOrder);
        }
        None
    }

    fn accept_stamp(&mut self, generation: u64, sequence: u64) {
        if generation > self.generation {
            self.generation = generation;
        }
        self.last_sequence = Some(sequence);
    }
}
