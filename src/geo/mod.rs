//! Geographic primitives for the home geofence.
//!
//! ## Module Structure
//!
//! - [`distance`]: great-circle distance and the near-home decision
//!
//! A [`Coordinate`] is a plain latitude/longitude pair in decimal degrees. Values
//! coming from the user or from configuration go through [`Coordinate::new`],
//! which rejects anything outside the valid ranges; values coming from a location
//! service are trusted as reported.

pub mod distance;

use serde::{Deserialize, Serialize};

use crate::common::utils::format_coordinates;
use crate::common::validation::ValidationError;

pub use distance::{haversine_distance, is_near_home};

#[cfg(test)]
mod tests;

/// A point on the earth in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinate {
    /// Build a validated coordinate.
    pub fn new(latitude: f64, longitude: f64) -> Result<Self, ValidationError> {
        if !latitude.is_finite() || !(-90.0..=90.0).contains(&latitude) {
            return Err(ValidationError::CoordinateOutOfRange {
                field: "latitude",
                value: latitude,
                min: -90.0,
                max: 90.0,
            });
        }
        if !longitude.is_finite() || !(-180.0..=180.0).contains(&longitude) {
            return Err(ValidationError::CoordinateOutOfRange {
                field: "longitude",
                value: longitude,
                min: -180.0,
                max: 180.0,
            });
        }
        Ok(Self {
            latitude,
            longitude,
        })
    }

    /// Parse a `latitude` and `longitude` given as text (CLI input).
    pub fn parse(latitude: &str, longitude: &str) -> Result<Self, ValidationError> {
        let lat = latitude
            .trim()
            .parse::<f64>()
            .map_err(|_| ValidationError::invalid("latitude", format!("'{latitude}' is not a number")))?;
        let lon = longitude
            .trim()
            .parse::<f64>()
            .map_err(|_| {
                ValidationError::invalid("longitude", format!("'{longitude}' is not a number"))
            })?;
        Self::new(lat, lon)
    }

    /// Great-circle distance to `other` in meters.
    pub fn distance_to(&self, other: &Coordinate) -> f64 {
        haversine_distance(self, other)
    }
}

impl std::fmt::Display for Coordinate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", format_coordinates(self.latitude, self.longitude))
    }
}

/// The user's saved home: a coordinate and an optional human-readable address.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HomeLocation {
    pub coordinate: Coordinate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
}

impl HomeLocation {
    pub fn new(coordinate: Coordinate, address: Option<String>) -> Self {
        // Blank addresses are stored as absent
        let address = address
            .map(|a| a.trim().to_string())
            .filter(|a| !a.is_empty());
        Self {
            coordinate,
            address,
        }
    }

    /// Address if one was given, otherwise the formatted coordinate.
    pub fn label(&self) -> String {
        self.address
            .clone()
            .unwrap_or_else(|| self.coordinate.to_string())
    }
}
