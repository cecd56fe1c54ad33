//! Location sampling.
//!
//! A [`LocationProvider`] answers one question, "where is the device now?", and
//! either returns a [`LocationFix`] or fails with a [`LocationError`]. Every
//! failure is terminal for that call; retrying is the caller's decision.
//!
//! The [`sampler::Sampler`] turns a provider into a periodic, restartable stream
//! of samples for the geofence loop.
//!
//! ## Providers
//!
//! - [`geoclue::GeoClueProvider`]: the desktop location service over D-Bus
//! - [`fixed::FixedProvider`]: a constant coordinate from the configuration
//! - [`replay::ReplayProvider`]: fixes read from a JSON-lines track file

pub mod fixed;
pub mod geoclue;
pub mod replay;
pub mod sampler;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

use crate::config::{Config, ProviderKind};
use crate::geo::Coordinate;

pub use sampler::{SampleMessage, Sampler, SamplerSettings};

/// One position reported by a provider.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LocationFix {
    pub coordinate: Coordinate,
    /// Radius of uncertainty in meters, when the provider reports one.
    pub accuracy_m: Option<f64>,
    pub taken_at: DateTime<Utc>,
}

impl LocationFix {
    pub fn new(coordinate: Coordinate, accuracy_m: Option<f64>, taken_at: DateTime<Utc>) -> Self {
        Self {
            coordinate,
            accuracy_m,
            taken_at,
        }
    }

    /// Whether the fix is precise enough to decide proximity.
    ///
    /// `max_accuracy_m <= 0` accepts every fix. Fixes without an accuracy figure
    /// are accepted.
    pub fn is_precise_enough(&self, max_accuracy_m: f64) -> bool {
        if max_accuracy_m <= 0.0 {
            return true;
        }
        match self.accuracy_m {
            Some(accuracy) => accuracy.is_finite() && accuracy <= max_accuracy_m,
            None => true,
        }
    }
}

/// Why a location could not be obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LocationError {
    #[error("location access was denied")]
    PermissionDenied,
    #[error("current position is unavailable")]
    PositionUnavailable,
    #[error("timed out waiting for a location fix")]
    Timeout,
    #[error("no location service is available on this system")]
    Unsupported,
}

/// Source of the device's current position.
#[cfg_attr(test, mockall::automock)]
pub trait LocationProvider: Send {
    /// Short name for log output.
    fn name(&self) -> &'static str;

    /// Obtain a single fix, waiting at most `timeout`.
    fn current_location(&mut self, timeout: Duration) -> Result<LocationFix, LocationError>;
}

/// Build the provider selected in the configuration.
pub fn create_provider(config: &Config) -> Result<Box<dyn LocationProvider>> {
    let provider: Box<dyn LocationProvider> = match config.provider_kind()? {
        ProviderKind::GeoClue => Box::new(geoclue::GeoClueProvider::new()),
        ProviderKind::Static => {
            let (Some(latitude), Some(longitude)) = (config.static_latitude, config.static_longitude)
            else {
                anyhow::bail!("provider = \"static\" requires static_latitude and static_longitude");
            };
            let coordinate = Coordinate::new(latitude, longitude)?;
            Box::new(fixed::FixedProvider::new(coordinate))
        }
        ProviderKind::Replay => {
            let path = config
                .replay_track
                .as_ref()
                .map(PathBuf::from)
                .context("provider = \"replay\" requires replay_track")?;
            Box::new(replay::ReplayProvider::from_path(&path)?)
        }
    };
    Ok(provider)
}
