//! Small shared helpers: path privacy, coordinate formatting and command templates.

use std::path::Path;
use std::process::{Command, Stdio};

use anyhow::{Context, Result};

/// Display a path with the home directory replaced by `~`.
pub fn private_path(path: &Path) -> String {
    if let Some(home) = dirs::home_dir()
        && let Ok(rest) = path.strip_prefix(&home)
    {
        return format!("~/{}", rest.display());
    }
    path.display().to_string()
}

/// Format a coordinate pair as `35.676°N, 139.650°E`.
pub fn format_coordinates(latitude: f64, longitude: f64) -> String {
    let lat_dir = if latitude >= 0.0 { "N" } else { "S" };
    let lon_dir = if longitude >= 0.0 { "E" } else { "W" };
    format!(
        "{:.3}°{}, {:.3}°{}",
        latitude.abs(),
        lat_dir,
        longitude.abs(),
        lon_dir
    )
}

/// Format a distance in meters, switching to kilometers above 1 km.
pub fn format_distance(meters: f64) -> String {
    if meters >= 1000.0 {
        format!("{:.2} km", meters / 1000.0)
    } else {
        format!("{meters:.1} m")
    }
}

/// Format seconds as `m:ss`.
pub fn format_duration(seconds: u32) -> String {
    format!("{}:{:02}", seconds / 60, seconds % 60)
}

/// Split a command template into program and arguments, substituting `{key}`
/// placeholders per argument so substituted values are never re-split.
pub fn expand_command(template: &str, replacements: &[(&str, &str)]) -> Result<(String, Vec<String>)> {
    let mut parts = template.split_whitespace().map(|part| {
        replacements
            .iter()
            .fold(part.to_string(), |acc, (key, value)| {
                acc.replace(&format!("{{{key}}}"), value)
            })
    });

    let program = parts
        .next()
        .with_context(|| format!("Command template '{template}' is empty"))?;
    Ok((program, parts.collect()))
}

/// Spawn a detached external command built from a template. Fire-and-forget: the
/// child is not waited on and its output is discarded.
pub fn spawn_detached(template: &str, replacements: &[(&str, &str)]) -> Result<()> {
    let (program, args) = expand_command(template, replacements)?;
    Command::new(&program)
        .args(&args)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .with_context(|| format!("Failed to start '{program}'"))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_coordinates_hemispheres() {
        assert_eq!(format_coordinates(35.6762, 139.6503), "35.676°N, 139.650°E");
        assert_eq!(format_coordinates(-33.8688, -70.6693), "33.869°S, 70.669°W");
    }

    #[test]
    fn test_format_distance_units() {
        assert_eq!(format_distance(8.94), "8.9 m");
        assert_eq!(format_distance(1112.0), "1.11 km");
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(210), "3:30");
        assert_eq!(format_duration(5), "0:05");
    }

    #[test]
    fn test_expand_command_keeps_values_whole() {
        let (program, args) =
            expand_command("espeak-ng -v en-us {text}", &[("text", "good morning")]).unwrap();
        assert_eq!(program, "espeak-ng");
        assert_eq!(args, vec!["-v", "en-us", "good morning"]);
    }

    #[test]
    fn test_expand_command_empty_template() {
        assert!(expand_command("   ", &[]).is_err());
    }
}
