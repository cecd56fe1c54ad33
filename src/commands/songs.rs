//! Browse and play the song library.

use anyhow::Result;
use chrono::Local;

use crate::args::SongsCommand;
use crate::config::Config;
use crate::library::SongLibrary;
use crate::playback::{Playback, TodaysSongSelector, create_sink};

pub fn handle_songs_command(command: SongsCommand) -> Result<()> {
    let (state_dir, settings) = super::open_settings()?;
    let mut library = SongLibrary::open(&state_dir)?;

    match command {
        SongsCommand::List => {
            if library.is_empty() {
                log_block_start!("The song library is empty");
                log_indented!("Run 'mimicoach songs seed' to install the built-in songs");
            } else {
                log_block_start!("Songs ({})", library.songs().len());
                for song in library.songs() {
                    log_indented!("{}  {} [{}]", song.id, song.summary(), song.genre);
                }
            }
        }
        SongsCommand::Today => {
            let playback = Playback::new(Box::new(TodaysSongSelector), create_sink(""));
            let today = Local::now().date_naive();
            match playback.todays_song(library.songs(), settings.app(), today) {
                Some(song) => {
                    log_block_start!("Today's song: {}", song.summary());
                    if !song.lyrics.is_empty() {
                        log_pipe!();
                        for line in song.lyrics.lines() {
                            log_indented!("{line}");
                        }
                    }
                }
                None => {
                    log_block_start!("The song library is empty");
                    log_indented!("Run 'mimicoach songs seed' to install the built-in songs");
                }
            }
        }
        SongsCommand::Play { id } => {
            let Some(song) = library.find(&id).cloned() else {
                anyhow::bail!("No song with id '{id}'. Run 'mimicoach songs list' to see the library");
            };
            let config = Config::load()?;
            let mut playback =
                Playback::new(Box::new(TodaysSongSelector), create_sink(config.player_command()));
            playback.play(&song, settings.app())?;
            log_block_start!("Playing {}", song.summary());
        }
        SongsCommand::Seed => {
            let added = library.seed_builtin()?;
            if added == 0 {
                log_block_start!("The song library already has songs, nothing added");
            } else {
                log_block_start!("Added {added} built-in songs");
            }
        }
    }

    log_end!();
    Ok(())
}
