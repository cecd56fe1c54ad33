//! Provider that replays a recorded track.
//!
//! Track files are JSON lines, one entry per sample. An entry is either a fix or
//! a failure; blank lines and lines starting with `#` are skipped:
//!
//! ```text
//! # leaving the station, walking home
//! {"latitude": 35.6862, "longitude": 139.6503, "accuracy": 12.0, "timestamp": "2026-10-18T08:00:00Z"}
//! {"error": "timeout"}
//! {"latitude": 35.6762, "longitude": 139.6504}
//! ```
//!
//! Entries without a timestamp are stamped with the time they are replayed.
//! Once the track is exhausted every further call reports `PositionUnavailable`.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::collections::VecDeque;
use std::fs;
use std::path::Path;
use std::time::Duration;

use super::{LocationError, LocationFix, LocationProvider};
use crate::common::utils::private_path;
use crate::geo::Coordinate;

/// One line of a track file.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum TrackEntry {
    Failure {
        error: LocationError,
    },
    Fix {
        latitude: f64,
        longitude: f64,
        #[serde(default)]
        accuracy: Option<f64>,
        #[serde(default)]
        timestamp: Option<DateTime<Utc>>,
    },
}

impl TrackEntry {
    fn into_result(self) -> Result<LocationFix, LocationError> {
        match self {
            TrackEntry::Failure { error } => Err(error),
            TrackEntry::Fix {
                latitude,
                longitude,
                accuracy,
                timestamp,
            } => {
                // A recorded point outside the valid ranges is not a usable position
                let coordinate = Coordinate::new(latitude, longitude)
                    .map_err(|_| LocationError::PositionUnavailable)?;
                Ok(LocationFix::new(
                    coordinate,
                    accuracy,
                    timestamp.unwrap_or_else(Utc::now),
                ))
            }
        }
    }
}

/// Parse the contents of a track file.
pub fn parse_track(content: &str) -> Result<Vec<TrackEntry>> {
    content
        .lines()
        .enumerate()
        .filter(|(_, line)| {
            let line = line.trim();
            !line.is_empty() && !line.starts_with('#')
        })
        .map(|(index, line)| {
            serde_json::from_str(line.trim())
                .with_context(|| format!("Invalid track entry on line {}", index + 1))
        })
        .collect()
}

pub struct ReplayProvider {
    entries: VecDeque<TrackEntry>,
}

impl ReplayProvider {
    pub fn new(entries: Vec<TrackEntry>) -> Self {
        Self {
            entries: entries.into(),
        }
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read track file {}", private_path(path)))?;
        let entries = parse_track(&content)
            .with_context(|| format!("Failed to parse track file {}", private_path(path)))?;
        Ok(Self::new(entries))
    }

    /// Entries not yet replayed.
    pub fn remaining(&self) -> usize {
        self.entries.len()
    }
}

impl LocationProvider for ReplayProvider {
    fn name(&self) -> &'static str {
        "replay"
    }

    fn current_location(&mut self, _timeout: Duration) -> Result<LocationFix, LocationError> {
        match self.entries.pop_front() {
            Some(entry) => entry.into_result(),
            None => Err(LocationError::PositionUnavailable),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TRACK: &str = r#"
# commute home
{"latitude": 35.6862, "longitude": 139.6503, "accuracy": 12.0, "timestamp": "2026-10-18T08:00:00Z"}

{"error": "permission_denied"}
{"latitude": 35.6762, "longitude": 139.6504}
"#;

    #[test]
    fn test_parse_track_skips_comments_and_blanks() {
        let entries = parse_track(TRACK).unwrap();
        assert_eq!(entries.len(), 3);
        assert_eq!(
            entries[1],
            TrackEntry::Failure {
                error: LocationError::PermissionDenied
            }
        );
    }

    #[test]
    fn test_parse_track_reports_line_number() {
        let err = parse_track("{\"latitude\": 1.0, \"longitude\": 2.0}\nnot json").unwrap_err();
        assert!(err.to_string().contains("line 2"), "{err}");
    }

    #[test]
    fn test_replay_order_and_exhaustion() {
        let mut provider = ReplayProvider::new(parse_track(TRACK).unwrap());
        let timeout = Duration::from_secs(1);

        let first = provider.current_location(timeout).unwrap();
        assert_eq!(first.coordinate.latitude, 35.6862);
        assert_eq!(first.accuracy_m, Some(12.0));
        assert_eq!(first.taken_at.to_rfc3339(), "2026-10-18T08:00:00+00:00");

        assert_eq!(
            provider.current_location(timeout),
            Err(LocationError::PermissionDenied)
        );
        assert!(provider.current_location(timeout).is_ok());
        assert_eq!(provider.remaining(), 0);
        assert_eq!(
            provider.current_location(timeout),
            Err(LocationError::PositionUnavailable)
        );
    }

    #[test]
    fn test_out_of_range_entry_is_unavailable() {
        let mut provider = ReplayProvider::new(parse_track(r#"{"latitude": 95.0, "longitude": 0.0}"#).unwrap());
        assert_eq!(
            provider.current_location(Duration::from_secs(1)),
            Err(LocationError::PositionUnavailable)
        );
    }
}
