//! Manage the signed-in user's vocabulary.

use anyhow::Result;

use super::{require_user, storage_error};
use crate::args::WordsCommand;
use crate::session::LocalIdentityProvider;
use crate::settings::Language;
use crate::words::{
    Difficulty, LocalWordStore, MasteryStats, Word, WordDraft, WordFilter, WordStore,
    clamp_mastery, todays_words,
};

pub fn handle_words_command(command: WordsCommand) -> Result<()> {
    let (state_dir, settings) = super::open_settings()?;
    let language = settings.language();

    let identity =
        LocalIdentityProvider::open(&state_dir).map_err(|e| super::auth_error(e, language))?;
    let user = require_user(&identity, language)?;
    let mut store = LocalWordStore::open(&state_dir).map_err(|e| storage_error(e, language))?;

    if matches!(command, WordsCommand::Today) {
        log_block_start!(
            "Daily goal: {} words",
            settings.app().daily_word_goal
        );
    }
    run_words_command(&mut store, &user.id, command, language)?;

    log_end!();
    Ok(())
}

/// Execute a words command against `store` for `user_id`.
pub fn run_words_command(
    store: &mut LocalWordStore,
    user_id: &str,
    command: WordsCommand,
    language: Language,
) -> Result<()> {
    match command {
        WordsCommand::List { search, category } => {
            let words = store
                .list_for_user(user_id)
                .map_err(|e| storage_error(e, language))?;
            let filter = WordFilter { search, category };
            let shown: Vec<&Word> = words.iter().filter(|w| filter.matches(w)).collect();

            log_block_start!("Words ({} of {})", shown.len(), words.len());
            for word in &shown {
                log_word(word);
            }
            if let Some(stats) = MasteryStats::from_words(&words) {
                log_block_start!(
                    "Average mastery {:.0}%, {} mastered, {} need work",
                    stats.average,
                    stats.mastered,
                    stats.struggling
                );
            }
        }
        WordsCommand::Add {
            english,
            japanese,
            category,
            pronunciation,
            difficulty,
        } => {
            let difficulty = match difficulty {
                Some(value) => value.parse::<Difficulty>()?,
                None => Difficulty::Beginner,
            };
            let draft = WordDraft::new(
                &english,
                &japanese,
                pronunciation.as_deref(),
                difficulty,
                &category,
            )?;
            let word = store
                .add(user_id, draft)
                .map_err(|e| storage_error(e, language))?;
            log_block_start!("Added {} ({})", word.english, word.id);
        }
        WordsCommand::Remove { id } => {
            store
                .delete(user_id, &id)
                .map_err(|e| storage_error(e, language))?;
            log_block_start!("Removed word {id}");
        }
        WordsCommand::Review { id, mastery } => {
            store
                .update_mastery(user_id, &id, mastery)
                .map_err(|e| storage_error(e, language))?;
            log_block_start!("Mastery of {id} set to {}%", clamp_mastery(mastery));
        }
        WordsCommand::Today => {
            let words = store
                .list_for_user(user_id)
                .map_err(|e| storage_error(e, language))?;
            let today = todays_words(&words);
            if today.is_empty() {
                log_block_start!("Nothing to review today");
            } else {
                log_block_start!("Today's words");
                for word in today {
                    log_word(word);
                }
            }
        }
        WordsCommand::Seed => {
            let added = store
                .seed(user_id)
                .map_err(|e| storage_error(e, language))?;
            if added == 0 {
                log_block_start!("Word list already has entries, nothing added");
            } else {
                log_block_start!("Added {added} starter words");
            }
        }
    }
    Ok(())
}

fn log_word(word: &Word) {
    let pronunciation = word
        .pronunciation
        .as_ref()
        .map(|p| format!(" [{p}]"))
        .unwrap_or_default();
    log_indented!(
        "{}  {} - {}{}  ({}, {}, {}%)",
        word.id,
        word.english,
        word.japanese,
        pronunciation,
        word.category,
        word.difficulty,
        word.mastery_level
    );
}
