//! Switch the geofence on or off, change its radius and show what the daemon sees.

use anyhow::Result;
use std::path::Path;

use crate::args::GeofenceCommand;
use crate::io::lock::{LockOwner, get_lock_path, is_process_running, parse_lock_content};
use crate::state::status::{GeofenceStatus, read_status, status_path};

pub fn handle_geofence_command(command: GeofenceCommand) -> Result<()> {
    let (state_dir, mut settings) = super::open_settings()?;

    match command {
        GeofenceCommand::On => {
            settings.set_geofence_enabled(true)?;
            log_block_start!("Geofencing enabled");
            if settings.get_home_location().is_none() {
                log_pipe!();
                log_warning!("No home location set, nothing will trigger yet");
            }
        }
        GeofenceCommand::Off => {
            settings.set_geofence_enabled(false)?;
            log_block_start!("Geofencing disabled");
        }
        GeofenceCommand::Radius(radius_m) => {
            let proximity = settings.set_home_radius(radius_m)?;
            log_block_start!("Home radius set to {:.0} m", proximity.radius_m);
        }
        GeofenceCommand::Status => {
            let proximity = settings.get_proximity_config();
            log_block_start!(
                "Geofencing {}",
                if proximity.enabled { "on" } else { "off" }
            );
            log_indented!("Radius: {:.0} m", proximity.radius_m);
            match settings.get_home_location() {
                Some(home) => log_indented!("Home: {}", home.label()),
                None => log_indented!("Home: not set"),
            }

            let Some(owner) = running_daemon() else {
                log_indented!("Daemon: not running");
                log_end!();
                return Ok(());
            };
            log_indented!("Daemon: running (PID: {})", owner.pid);

            match published_status(&state_dir, &owner) {
                Some(status) => {
                    log_pipe!();
                    let rows = status.describe();
                    let width = rows.iter().map(|(label, _)| label.len()).max().unwrap_or(0);
                    for (label, value) in rows {
                        log_indented!("{label:<width$}  {value}");
                    }
                    if let Some(error) = status.unavailable {
                        log_pipe!();
                        log_warning!("Location is unavailable: {error}");
                    }
                }
                None => log_indented!("Geofence state: not reported yet"),
            }
        }
    }

    log_end!();
    Ok(())
}

fn running_daemon() -> Option<LockOwner> {
    std::fs::read_to_string(get_lock_path())
        .ok()
        .and_then(|content| parse_lock_content(&content))
        .filter(|owner| is_process_running(owner.pid))
}

/// The daemon's snapshot, unless it was left behind by an earlier daemon.
fn published_status(state_dir: &Path, owner: &LockOwner) -> Option<GeofenceStatus> {
    read_status(&status_path(state_dir))
        .ok()
        .flatten()
        .filter(|status| status.pid == owner.pid)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::location::LocationError;
    use crate::state::status::write_status;
    use crate::trigger::{GeofenceState, TriggerStatus};
    use chrono::Utc;
    use tempfile::tempdir;

    fn owner(pid: u32) -> LockOwner {
        LockOwner {
            pid,
            config_dir: None,
        }
    }

    #[test]
    fn test_published_status_belongs_to_running_daemon() {
        let dir = tempdir().unwrap();
        assert!(published_status(dir.path(), &owner(100)).is_none());

        let trigger = TriggerStatus {
            state: GeofenceState::Armed,
            enabled: true,
            unavailable: Some(LocationError::Timeout),
            last_distance_m: None,
            last_sample_at: None,
            plays: 0,
        };
        let status = GeofenceStatus::from_trigger(&trigger, 100, Utc::now());
        write_status(&status_path(dir.path()), &status).unwrap();

        assert_eq!(published_status(dir.path(), &owner(100)), Some(status));
        // Left behind by a daemon that was killed
        assert!(published_status(dir.path(), &owner(200)).is_none());
    }
}
