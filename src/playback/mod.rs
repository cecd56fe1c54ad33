//! Song selection and hand-off to external players.
//!
//! mimicoach does not decode audio or synthesize speech itself. A
//! [`PlaybackSink`] starts a song in an external player and a [`Speaker`]
//! pronounces a word through an external TTS command; both return as soon as
//! the command has been started.

use anyhow::Result;
use chrono::{Datelike, NaiveDate};

use crate::common::utils::spawn_detached;
use crate::library::Song;
use crate::settings::{AppSettings, GenrePreference};

/// Picks the song to play for a day.
pub trait SongSelector {
    fn select<'a>(&self, songs: &'a [Song], genre: GenrePreference, day: NaiveDate) -> Option<&'a Song>;
}

/// "Today's song": rotates through the songs of the preferred genre, one per
/// day of the year. Falls back to the whole library when no song matches the
/// genre.
#[derive(Debug, Default, Clone, Copy)]
pub struct TodaysSongSelector;

impl SongSelector for TodaysSongSelector {
    fn select<'a>(&self, songs: &'a [Song], genre: GenrePreference, day: NaiveDate) -> Option<&'a Song> {
        let matching: Vec<&Song> = songs.iter().filter(|s| genre.accepts(s.genre)).collect();
        let candidates: Vec<&Song> = if matching.is_empty() {
            songs.iter().collect()
        } else {
            matching
        };
        if candidates.is_empty() {
            return None;
        }
        let index = day.ordinal0() as usize % candidates.len();
        Some(candidates[index])
    }
}

#[cfg_attr(test, mockall::automock)]
pub trait PlaybackSink {
    fn name(&self) -> &'static str;

    /// Start playing `song`. Does not wait for it to finish.
    fn play(&mut self, song: &Song, volume: u8) -> Result<()>;
}

/// Plays through an external command such as `mpv --no-video {url}`.
///
/// Placeholders: `{url}`, `{title}`, `{volume}`.
pub struct CommandPlayer {
    template: String,
}

impl CommandPlayer {
    pub fn new(template: impl Into<String>) -> Self {
        Self {
            template: template.into(),
        }
    }
}

impl PlaybackSink for CommandPlayer {
    fn name(&self) -> &'static str {
        "command"
    }

    fn play(&mut self, song: &Song, volume: u8) -> Result<()> {
        let volume = volume.to_string();
        spawn_detached(
            &self.template,
            &[
                ("url", song.audio_url.as_str()),
                ("title", song.title.as_str()),
                ("volume", volume.as_str()),
            ],
        )
    }
}

/// Only logs what would be played. Used when no player command is configured.
pub struct LogPlayer;

impl PlaybackSink for LogPlayer {
    fn name(&self) -> &'static str {
        "log"
    }

    fn play(&mut self, song: &Song, volume: u8) -> Result<()> {
        log_decorated!("Now playing: {} (volume {volume}%)", song.summary());
        Ok(())
    }
}

pub trait Speaker {
    fn speak(&self, text: &str) -> Result<()>;
}

/// Speaks through an external command such as `espeak-ng -v en-us {text}`.
pub struct CommandSpeaker {
    template: String,
}

impl CommandSpeaker {
    pub fn new(template: impl Into<String>) -> Self {
        Self {
            template: template.into(),
        }
    }
}

impl Speaker for CommandSpeaker {
    fn speak(&self, text: &str) -> Result<()> {
        spawn_detached(&self.template, &[("text", text)])
    }
}

/// Build the sink for a configured player command. An empty command logs only.
pub fn create_sink(player_command: &str) -> Box<dyn PlaybackSink> {
    if player_command.trim().is_empty() {
        Box::new(LogPlayer)
    } else {
        Box::new(CommandPlayer::new(player_command))
    }
}

/// Selects and starts songs according to the user's settings.
pub struct Playback {
    selector: Box<dyn SongSelector>,
    sink: Box<dyn PlaybackSink>,
}

impl Playback {
    pub fn new(selector: Box<dyn SongSelector>, sink: Box<dyn PlaybackSink>) -> Self {
        Self { selector, sink }
    }

    pub fn sink_name(&self) -> &'static str {
        self.sink.name()
    }

    pub fn set_sink(&mut self, sink: Box<dyn PlaybackSink>) {
        self.sink = sink;
    }

    pub fn todays_song<'a>(&self, songs: &'a [Song], app: &AppSettings, day: NaiveDate) -> Option<&'a Song> {
        self.selector.select(songs, app.music_genre, day)
    }

    /// Play today's song. `Ok(None)` when the library is empty.
    pub fn play_todays_song(
        &mut self,
        songs: &[Song],
        app: &AppSettings,
        day: NaiveDate,
    ) -> Result<Option<Song>> {
        let Some(song) = self.selector.select(songs, app.music_genre, day) else {
            return Ok(None);
        };
        self.sink.play(song, app.volume)?;
        Ok(Some(song.clone()))
    }

    pub fn play(&mut self, song: &Song, app: &AppSettings) -> Result<()> {
        self.sink.play(song, app.volume)
    }
}
