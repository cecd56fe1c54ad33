//! Setting value types and their command-line parsing.

use anyhow::{Result, bail};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::AppSettings;
use crate::common::constants::{MAXIMUM_DAILY_WORD_GOAL, MINIMUM_DAILY_WORD_GOAL};
use crate::common::validation::ValidationError;
use crate::library::Genre;

/// Language of user-facing messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    Ja,
    En,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReviewInterval {
    #[default]
    Daily,
    Weekly,
    Monthly,
}

/// Which songs the user wants to hear.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum GenrePreference {
    #[default]
    All,
    Only(Genre),
}

impl GenrePreference {
    pub fn accepts(&self, genre: Genre) -> bool {
        match self {
            GenrePreference::All => true,
            GenrePreference::Only(only) => *only == genre,
        }
    }
}

impl fmt::Display for GenrePreference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GenrePreference::All => f.write_str("all"),
            GenrePreference::Only(genre) => write!(f, "{genre}"),
        }
    }
}

impl FromStr for GenrePreference {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().eq_ignore_ascii_case("all") {
            Ok(GenrePreference::All)
        } else {
            s.parse().map(GenrePreference::Only)
        }
    }
}

impl TryFrom<String> for GenrePreference {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<GenrePreference> for String {
    fn from(value: GenrePreference) -> Self {
        value.to_string()
    }
}

macro_rules! keyword_enum {
    ($type:ty, $field:literal, { $($text:literal => $variant:expr),+ $(,)? }) => {
        impl FromStr for $type {
            type Err = ValidationError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s.trim().to_ascii_lowercase().as_str() {
                    $($text => Ok($variant),)+
                    other => Err(ValidationError::invalid(
                        $field,
                        format!("'{}' is not one of {}", other, [$($text),+].join(", ")),
                    )),
                }
            }
        }

        impl fmt::Display for $type {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                $(if *self == $variant { return f.write_str($text); })+
                Ok(())
            }
        }
    };
}

keyword_enum!(Language, "language", { "ja" => Language::Ja, "en" => Language::En });
keyword_enum!(Theme, "theme", { "light" => Theme::Light, "dark" => Theme::Dark });
keyword_enum!(ReviewInterval, "review_interval", {
    "daily" => ReviewInterval::Daily,
    "weekly" => ReviewInterval::Weekly,
    "monthly" => ReviewInterval::Monthly,
});

pub(super) fn parse_bool(key: &str, value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "on" | "yes" | "1" => Ok(true),
        "false" | "off" | "no" | "0" => Ok(false),
        other => bail!(ValidationError::invalid(key, format!("'{other}' is not on/off"))),
    }
}

pub(super) fn parse_number<T: FromStr>(key: &str, value: &str) -> Result<T> {
    value
        .trim()
        .parse()
        .map_err(|_| ValidationError::invalid(key, format!("'{value}' is not a number")).into())
}

/// Apply one `key = value` change to the app settings.
pub(super) fn apply(app: &mut AppSettings, key: &str, value: &str) -> Result<()> {
    match key {
        "auto_play" => app.auto_play = parse_bool(key, value)?,
        "volume" => {
            let volume: u8 = parse_number(key, value)?;
            if volume > 100 {
                bail!(ValidationError::invalid(key, "must be between 0 and 100"));
            }
            app.volume = volume;
        }
        "music_genre" => app.music_genre = value.parse()?,
        "geofence_notifications" => app.geofence_notifications = parse_bool(key, value)?,
        "learning_reminders" => app.learning_reminders = parse_bool(key, value)?,
        "daily_goal_reminders" => app.daily_goal_reminders = parse_bool(key, value)?,
        "theme" => app.theme = value.parse()?,
        "language" => app.language = value.parse()?,
        "offline_mode" => app.offline_mode = parse_bool(key, value)?,
        "daily_word_goal" => {
            let goal: u32 = parse_number(key, value)?;
            if !(MINIMUM_DAILY_WORD_GOAL..=MAXIMUM_DAILY_WORD_GOAL).contains(&goal) {
                bail!(ValidationError::invalid(
                    key,
                    format!(
                        "must be between {MINIMUM_DAILY_WORD_GOAL} and {MAXIMUM_DAILY_WORD_GOAL}"
                    ),
                ));
            }
            app.daily_word_goal = goal;
        }
        "difficulty_level" => app.difficulty_level = value.parse()?,
        "review_interval" => app.review_interval = value.parse()?,
        _ => bail!("Unknown setting '{key}'"),
    }
    Ok(())
}

pub(super) fn describe(app: &AppSettings) -> Vec<(&'static str, String)> {
    vec![
        ("auto_play", app.auto_play.to_string()),
        ("volume", app.volume.to_string()),
        ("music_genre", app.music_genre.to_string()),
        ("geofence_notifications", app.geofence_notifications.to_string()),
        ("learning_reminders", app.learning_reminders.to_string()),
        ("daily_goal_reminders", app.daily_goal_reminders.to_string()),
        ("theme", app.theme.to_string()),
        ("language", app.language.to_string()),
        ("offline_mode", app.offline_mode.to_string()),
        ("daily_word_goal", app.daily_word_goal.to_string()),
        ("difficulty_level", app.difficulty_level.to_string()),
        ("review_interval", app.review_interval.to_string()),
    ]
}
