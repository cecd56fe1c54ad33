//! One-off proximity check of a coordinate against the saved home.

use anyhow::Result;

use crate::common::utils::format_distance;
use crate::geo::{Coordinate, HomeLocation, is_near_home};
use crate::settings::ProximityConfig;

/// Result of checking one position.
#[derive(Debug, Clone, PartialEq)]
pub struct ProximityCheck {
    pub distance_m: f64,
    pub near: bool,
}

pub fn check_position(
    position: &Coordinate,
    home: &HomeLocation,
    proximity: ProximityConfig,
) -> ProximityCheck {
    ProximityCheck {
        distance_m: position.distance_to(&home.coordinate),
        near: is_near_home(Some(position), &home.coordinate, proximity.radius_m),
    }
}

pub fn handle_check_command(latitude: f64, longitude: f64) -> Result<()> {
    let position = Coordinate::new(latitude, longitude)?;
    let (_, settings) = super::open_settings()?;

    let Some(home) = settings.get_home_location() else {
        anyhow::bail!("No home location set. Run 'mimicoach home set <lat> <lon>' first");
    };
    let proximity = settings.get_proximity_config();
    let result = check_position(&position, &home, proximity);

    log_block_start!("Position: {position}");
    log_indented!("Home: {}", home.label());
    log_indented!("Distance: {}", format_distance(result.distance_m));
    log_indented!(
        "{} the {:.0} m radius",
        if result.near { "Inside" } else { "Outside" },
        proximity.radius_m
    );
    if !proximity.enabled {
        log_pipe!();
        log_warning!("Geofencing is disabled, arrivals will not start playback");
    }
    log_end!();
    Ok(())
}
