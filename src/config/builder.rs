//! Default configuration file creation.
//!
//! The default file is assembled with a small builder that keeps the trailing
//! comments aligned in one column, so the file stays readable when a default
//! value in `constants.rs` changes length.

use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

use crate::common::constants::*;

/// Write a commented default `mimicoach.toml` to `path`.
pub fn create_default_config(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).context("Failed to create config directory")?;
    }

    fs::write(path, default_config_content()).context("Failed to write default config file")?;
    Ok(())
}

/// Text of the default configuration file.
pub fn default_config_content() -> String {
    ConfigBuilder::new()
        .add_section("Location")
        .add_setting(
            "provider",
            &format!("\"{DEFAULT_PROVIDER}\""),
            "Location source: \"geoclue\", \"static\" or \"replay\"",
        )
        .add_setting(
            "poll_interval",
            &DEFAULT_POLL_INTERVAL.to_string(),
            &format!(
                "Seconds between location samples ({MINIMUM_POLL_INTERVAL}-{MAXIMUM_POLL_INTERVAL})"
            ),
        )
        .add_setting(
            "sample_timeout",
            &DEFAULT_SAMPLE_TIMEOUT.to_string(),
            &format!(
                "Seconds to wait for a single fix ({MINIMUM_SAMPLE_TIMEOUT}-{MAXIMUM_SAMPLE_TIMEOUT})"
            ),
        )
        .add_setting(
            "max_fix_accuracy",
            &format!("{DEFAULT_MAX_FIX_ACCURACY:.0}"),
            "Ignore fixes less accurate than this in meters (0 = accept all)",
        )
        .add_section("Static and replay providers")
        .add_disabled_setting(
            "static_latitude",
            "35.676200",
            "Fixed latitude for provider = \"static\"",
        )
        .add_disabled_setting(
            "static_longitude",
            "139.650300",
            "Fixed longitude for provider = \"static\"",
        )
        .add_disabled_setting(
            "replay_track",
            "\"~/tracks/walk-home.jsonl\"",
            "JSON-lines track for provider = \"replay\"",
        )
        .add_section("Playback")
        .add_setting(
            "player_command",
            &format!("\"{DEFAULT_PLAYER_COMMAND}\""),
            "Audio player ({url}, {title}, {volume} | \"\" = log only)",
        )
        .add_setting(
            "speech_command",
            &format!("\"{DEFAULT_SPEECH_COMMAND}\""),
            "Text-to-speech command ({text})",
        )
        .build()
}

/// Builds a TOML file of sections and settings with aligned comments.
struct ConfigBuilder {
    entries: Vec<ConfigEntry>,
}

enum ConfigEntry {
    Section(String),
    Setting { line: String, comment: String },
}

impl ConfigBuilder {
    fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    fn add_section(mut self, title: &str) -> Self {
        self.entries.push(ConfigEntry::Section(format!("#[{title}]")));
        self
    }

    fn add_setting(mut self, key: &str, value: &str, comment: &str) -> Self {
        self.entries.push(ConfigEntry::Setting {
            line: format!("{key} = {value}"),
            comment: format!("# {comment}"),
        });
        self
    }

    /// A setting written commented out, as an example value.
    fn add_disabled_setting(mut self, key: &str, value: &str, comment: &str) -> Self {
        self.entries.push(ConfigEntry::Setting {
            line: format!("#{key} = {value}"),
            comment: format!("# {comment}"),
        });
        self
    }

    fn build(self) -> String {
        let max_width = self
            .entries
            .iter()
            .filter_map(|entry| match entry {
                ConfigEntry::Setting { line, .. } => Some(line.len()),
                ConfigEntry::Section(_) => None,
            })
            .max()
            .unwrap_or(0)
            + 1;

        let mut result = Vec::new();
        for entry in self.entries {
            match entry {
                ConfigEntry::Section(title) => {
                    if !result.is_empty() {
                        result.push(String::new());
                    }
                    result.push(title);
                }
                ConfigEntry::Setting { line, comment } => {
                    let padding = " ".repeat(max_width - line.len());
                    result.push(format!("{line}{padding}{comment}"));
                }
            }
        }

        let mut content = result.join("\n");
        content.push('\n');
        content
    }
}
