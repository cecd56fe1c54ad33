//! The vocabulary song library.
//!
//! Songs are stored in `songs.json` in the state directory. A fresh install has
//! no songs; `songs seed` installs the built-in demo catalog.

mod catalog;

use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::common::constants::SONGS_FILE_NAME;
use crate::common::utils::format_duration;
use crate::common::validation::ValidationError;
use crate::state::{read_json, write_json_atomic};

pub use catalog::{builtin_songs, builtin_words};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Genre {
    Jpop,
    Chill,
    Acoustic,
}

impl Genre {
    pub fn as_str(&self) -> &'static str {
        match self {
            Genre::Jpop => "jpop",
            Genre::Chill => "chill",
            Genre::Acoustic => "acoustic",
        }
    }
}

impl fmt::Display for Genre {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Genre {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "jpop" | "j-pop" => Ok(Genre::Jpop),
            "chill" => Ok(Genre::Chill),
            "acoustic" => Ok(Genre::Acoustic),
            other => Err(ValidationError::invalid(
                "genre",
                format!("'{other}' is not one of jpop, chill, acoustic"),
            )),
        }
    }
}

/// A song built around a handful of vocabulary words.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Song {
    pub id: String,
    pub title: String,
    pub artist: String,
    pub genre: Genre,
    pub audio_url: String,
    pub lyrics: String,
    /// Ids of the words this song teaches.
    #[serde(default)]
    pub word_ids: Vec<String>,
    pub duration_secs: u32,
    pub created_at: DateTime<Utc>,
}

impl Song {
    /// `Title - Artist (3:30)`
    pub fn summary(&self) -> String {
        format!(
            "{} - {} ({})",
            self.title,
            self.artist,
            format_duration(self.duration_secs)
        )
    }
}

#[derive(Debug)]
pub struct SongLibrary {
    path: PathBuf,
    songs: Vec<Song>,
}

impl SongLibrary {
    /// Open the library in `state_dir`. A missing file is an empty library.
    pub fn open(state_dir: &Path) -> Result<Self> {
        let path = state_dir.join(SONGS_FILE_NAME);
        let songs = read_json(&path)?.unwrap_or_default();
        Ok(Self { path, songs })
    }

    /// Re-read the file, picking up changes made by another process.
    pub fn reload(&mut self) -> Result<()> {
        self.songs = read_json(&self.path)?.unwrap_or_default();
        Ok(())
    }

    pub fn songs(&self) -> &[Song] {
        &self.songs
    }

    pub fn is_empty(&self) -> bool {
        self.songs.is_empty()
    }

    pub fn find(&self, id: &str) -> Option<&Song> {
        self.songs.iter().find(|song| song.id == id)
    }

    /// Install the built-in catalog if the library is empty.
    ///
    /// Returns the number of songs added.
    pub fn seed_builtin(&mut self) -> Result<usize> {
        if !self.songs.is_empty() {
            return Ok(0);
        }
        self.songs = builtin_songs();
        self.save()?;
        Ok(self.songs.len())
    }

    fn save(&self) -> Result<()> {
        write_json_atomic(&self.path, &self.songs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_seed_only_fills_empty_library() {
        let dir = tempdir().unwrap();
        let mut library = SongLibrary::open(dir.path()).unwrap();
        assert!(library.is_empty());

        assert_eq!(library.seed_builtin().unwrap(), 3);
        assert_eq!(library.seed_builtin().unwrap(), 0);

        let reopened = SongLibrary::open(dir.path()).unwrap();
        assert_eq!(reopened.songs().len(), 3);
        assert_eq!(reopened.find("2").unwrap().title, "Serendipity Moments");
        assert!(reopened.find("9").is_none());
    }

    #[test]
    fn test_genre_parsing() {
        assert_eq!("J-Pop".parse::<Genre>(), Ok(Genre::Jpop));
        assert_eq!(" chill ".parse::<Genre>(), Ok(Genre::Chill));
        assert!("metal".parse::<Genre>().is_err());
    }

    #[test]
    fn test_song_summary() {
        let song = &builtin_songs()[0];
        assert_eq!(song.summary(), "Dreams of Ambition - Mimi Coach (3:30)");
    }
}
