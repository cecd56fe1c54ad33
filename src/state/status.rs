//! Live geofence status published by the running daemon.
//!
//! The daemon rewrites `status.json` in its state directory after every
//! trigger event, so `mimicoach geofence status` (a separate process) can show
//! what the daemon currently believes: where the device is relative to home,
//! and whether location is unavailable.

use anyhow::{Context, Result};
use chrono::{DateTime, Local, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use super::{read_json, write_json_atomic};
use crate::common::constants::STATUS_FILE_NAME;
use crate::common::utils::{format_distance, private_path};
use crate::location::LocationError;
use crate::trigger::{GeofenceState, TriggerStatus};

/// Snapshot of the daemon's trigger, as written to disk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeofenceStatus {
    /// Daemon that wrote the snapshot
    pub pid: u32,
    pub state: GeofenceState,
    pub enabled: bool,
    pub unavailable: Option<LocationError>,
    pub last_distance_m: Option<f64>,
    pub last_sample_at: Option<DateTime<Utc>>,
    pub plays: u64,
    pub updated_at: DateTime<Utc>,
}

impl GeofenceStatus {
    pub fn from_trigger(status: &TriggerStatus, pid: u32, updated_at: DateTime<Utc>) -> Self {
        Self {
            pid,
            state: status.state,
            enabled: status.enabled,
            unavailable: status.unavailable,
            last_distance_m: status.last_distance_m,
            last_sample_at: status.last_sample_at,
            plays: status.plays,
            updated_at,
        }
    }

    /// Rows for `geofence status`.
    pub fn describe(&self) -> Vec<(&'static str, String)> {
        let location = match self.unavailable {
            Some(error) => format!("unavailable ({error})"),
            None => "ok".to_string(),
        };
        let distance = self
            .last_distance_m
            .map(format_distance)
            .unwrap_or_else(|| "unknown".to_string());
        let last_fix = self
            .last_sample_at
            .map(|at| at.with_timezone(&Local).format("%Y-%m-%d %H:%M:%S").to_string())
            .unwrap_or_else(|| "none yet".to_string());

        vec![
            ("State", self.state.to_string()),
            ("Location", location),
            ("Distance from home", distance),
            ("Last fix", last_fix),
            ("Songs played", self.plays.to_string()),
        ]
    }
}

pub fn status_path(state_dir: &Path) -> PathBuf {
    state_dir.join(STATUS_FILE_NAME)
}

pub fn write_status(path: &Path, status: &GeofenceStatus) -> Result<()> {
    write_json_atomic(path, status)
}

pub fn read_status(path: &Path) -> Result<Option<GeofenceStatus>> {
    read_json(path)
}

/// Remove the snapshot when the daemon exits.
pub fn clear_status(path: &Path) -> Result<()> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e).with_context(|| format!("Failed to remove {}", private_path(path))),
    }
}
