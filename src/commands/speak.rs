//! Pronounce a word or phrase through the configured speech command.

use anyhow::Result;

use crate::config::Config;
use crate::playback::{CommandSpeaker, Speaker};

pub fn handle_speak_command(text: &str) -> Result<()> {
    let config = Config::load()?;
    let command = config.speech_command();
    if command.trim().is_empty() {
        anyhow::bail!("speech_command is empty in the configuration");
    }

    CommandSpeaker::new(command).speak(text)?;
    log_block_start!("Speaking: {text}");
    log_end!();
    Ok(())
}
