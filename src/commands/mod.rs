//! Command-line command handlers.
//!
//! Each command lives in its own submodule. One-shot commands work directly on
//! the files in the state directory; a running daemon notices the changes
//! through its file watcher.

pub mod account;
pub mod check;
pub mod geofence;
pub mod home;
pub mod run;
pub mod settings;
pub mod simulate;
pub mod songs;
pub mod speak;
pub mod words;

use anyhow::{Context, Result};
use std::io::{BufRead, IsTerminal, Write};
use std::path::PathBuf;

use crate::session::{AuthError, IdentityProvider, LocalIdentityProvider, UserProfile};
use crate::settings::{Language, SettingsStore};
use crate::state::current_state_dir;
use crate::words::{StorageError, StorageErrorCode};

/// State directory and settings for the selected configuration.
pub(crate) fn open_settings() -> Result<(PathBuf, SettingsStore)> {
    let state_dir = current_state_dir()?;
    let settings = SettingsStore::open(&state_dir)?;
    Ok((state_dir, settings))
}

/// Auth failures are reported in the user's language.
pub(crate) fn auth_error(error: AuthError, language: Language) -> anyhow::Error {
    anyhow::anyhow!("{}", error.localized(language))
}

/// Storage failures are reported in the user's language.
pub(crate) fn storage_error(error: StorageError, language: Language) -> anyhow::Error {
    anyhow::anyhow!("{}", error.localized(language))
}

/// The signed-in user, or a localized "please log in" error.
pub(crate) fn require_user(
    identity: &LocalIdentityProvider,
    language: Language,
) -> Result<UserProfile> {
    identity.current_user().ok_or_else(|| {
        storage_error(
            StorageError::new(StorageErrorCode::Unauthenticated),
            language,
        )
    })
}

/// Read a password line from stdin, prompting when attached to a terminal.
pub(crate) fn read_password(prompt: &str) -> Result<String> {
    let stdin = std::io::stdin();
    if stdin.is_terminal() {
        print!("┃   {prompt}: ");
        std::io::stdout().flush()?;
    }

    let mut line = String::new();
    stdin
        .lock()
        .read_line(&mut line)
        .context("Failed to read password from stdin")?;
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}
