//! Great-circle distance and the near-home decision.
//!
//! Distances are computed with the haversine formula on a spherical earth of
//! mean radius [`EARTH_RADIUS_METERS`]. The formula stays well-conditioned for
//! small separations and remains finite at the poles and across the
//! antimeridian, where a flat-plane difference of raw degrees is meaningless.

use super::Coordinate;
use crate::common::constants::EARTH_RADIUS_METERS;

/// Great-circle distance between two coordinates in meters.
///
/// Always finite and non-negative for finite input, and symmetric in its
/// arguments.
pub fn haversine_distance(a: &Coordinate, b: &Coordinate) -> f64 {
    let phi1 = a.latitude.to_radians();
    let phi2 = b.latitude.to_radians();
    let delta_phi = (b.latitude - a.latitude).to_radians();
    let delta_lambda = (b.longitude - a.longitude).to_radians();

    let h = (delta_phi / 2.0).sin().powi(2)
        + phi1.cos() * phi2.cos() * (delta_lambda / 2.0).sin().powi(2);

    // Rounding can push h marginally outside [0, 1] for antipodal points
    let h = h.clamp(0.0, 1.0);

    2.0 * EARTH_RADIUS_METERS * h.sqrt().asin()
}

/// Decide whether `sample` lies within `radius_m` meters of `home`.
///
/// - No sample yet: `false`, an unknown position never counts as home.
/// - Negative or non-finite radius: `false`.
/// - Zero radius: only the exact home point matches.
pub fn is_near_home(sample: Option<&Coordinate>, home: &Coordinate, radius_m: f64) -> bool {
    let Some(sample) = sample else {
        return false;
    };
    if !radius_m.is_finite() || radius_m < 0.0 {
        return false;
    }

    haversine_distance(sample, home) <= radius_m
}
