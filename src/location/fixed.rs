//! Provider that always reports the same coordinate.
//!
//! Useful on machines without a location service, where the user knows whether
//! the machine sits at home (a desktop at home is always "home").

use chrono::Utc;
use std::time::Duration;

use super::{LocationError, LocationFix, LocationProvider};
use crate::geo::Coordinate;

pub struct FixedProvider {
    coordinate: Coordinate,
}

impl FixedProvider {
    pub fn new(coordinate: Coordinate) -> Self {
        Self { coordinate }
    }
}

impl LocationProvider for FixedProvider {
    fn name(&self) -> &'static str {
        "static"
    }

    fn current_location(&mut self, _timeout: Duration) -> Result<LocationFix, LocationError> {
        Ok(LocationFix::new(self.coordinate, Some(0.0), Utc::now()))
    }
}
