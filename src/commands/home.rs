//! Show, set or clear the saved home location.

use anyhow::{Context, Result};

use crate::args::HomeCommand;
use crate::common::utils::format_distance;
use crate::config::Config;
use crate::geo::Coordinate;
use crate::location::create_provider;
use crate::settings::SettingsStore;

pub fn handle_home_command(command: HomeCommand, debug_enabled: bool) -> Result<()> {
    let (_, mut settings) = super::open_settings()?;

    match command {
        HomeCommand::Show => show_home(&settings),
        HomeCommand::Set {
            latitude,
            longitude,
            address,
        } => {
            let coordinate = Coordinate::new(latitude, longitude)?;
            let home = settings.set_home_location(coordinate, address)?;
            log_block_start!("Home location set: {}", home.label());
            if home.address.is_some() {
                log_indented!("Coordinates: {}", home.coordinate);
            }
        }
        HomeCommand::Here => {
            let config = Config::load()?;
            let mut provider = create_provider(&config)?;
            log_block_start!("Requesting the current position from {}", provider.name());

            let fix = provider
                .current_location(config.sample_timeout())
                .context("Failed to determine the current position")?;
            if debug_enabled {
                log_pipe!();
                log_debug!("Fix taken at {}", fix.taken_at.format("%Y-%m-%d %H:%M:%S UTC"));
            }
            if !fix.is_precise_enough(config.max_fix_accuracy()) {
                log_pipe!();
                log_warning!(
                    "The fix is imprecise ({}), consider setting the home with coordinates",
                    fix.accuracy_m.map(format_distance).unwrap_or_default()
                );
            }

            let home = settings.set_home_location(fix.coordinate, None)?;
            log_block_start!("Home location set: {}", home.label());
            if let Some(accuracy) = fix.accuracy_m {
                log_indented!("Accuracy: {}", format_distance(accuracy));
            }
        }
        HomeCommand::Clear => {
            if settings.get_home_location().is_none() {
                log_block_start!("No home location set");
            } else {
                settings.clear_home_location()?;
                log_block_start!("Home location cleared");
            }
        }
    }

    log_end!();
    Ok(())
}

fn show_home(settings: &SettingsStore) {
    match settings.get_home_location() {
        Some(home) => {
            log_block_start!("Home: {}", home.label());
            if home.address.is_some() {
                log_indented!("Coordinates: {}", home.coordinate);
            }
        }
        None => {
            log_block_start!("No home location set");
            log_indented!("Run 'mimicoach home set <lat> <lon>' or 'mimicoach home here'");
        }
    }

    let proximity = settings.get_proximity_config();
    log_indented!(
        "Radius: {:.0} m, geofencing {}",
        proximity.radius_m,
        if proximity.enabled { "on" } else { "off" }
    );
}
