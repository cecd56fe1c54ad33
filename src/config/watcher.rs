//! Hot reload for the configuration and the settings file.
//!
//! Watches the directory holding `mimicoach.toml` and the state directory holding
//! `settings.json`. A change to the first sends [`CoreMessage::Reload`], a change
//! to the second [`CoreMessage::SettingsChanged`], so that edits made by the CLI
//! (or by hand) reach a running daemon without a restart.
//!
//! Parent directories are watched instead of the files themselves because both
//! editors and our own atomic writes replace the file rather than modify it.

use anyhow::{Context, Result};
use notify::{
    Config as NotifyConfig, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher,
};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{RecvTimeoutError, Sender};
use std::thread;
use std::time::Duration;

use crate::common::constants::SETTINGS_FILE_NAME;
use crate::common::utils::private_path;
use crate::core::CoreMessage;

/// Editors write files in several steps; a file is reported once it has been
/// quiet this long.
const DEBOUNCE_MS: u64 = 500;

/// Which watched file an event concerns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WatchedFile {
    Config,
    Settings,
}

impl WatchedFile {
    fn message(self) -> CoreMessage {
        match self {
            WatchedFile::Config => CoreMessage::Reload,
            WatchedFile::Settings => CoreMessage::SettingsChanged,
        }
    }
}

/// Map a changed path to the file it belongs to, if any.
///
/// Only file names are compared: the watched directories are non-recursive and
/// the `--config` directory may have been given as a relative path.
pub fn classify_path(path: &Path, config_path: &Path, settings_path: &Path) -> Option<WatchedFile> {
    let name = path.file_name()?;
    if Some(name) == config_path.file_name() {
        Some(WatchedFile::Config)
    } else if Some(name) == settings_path.file_name() {
        Some(WatchedFile::Settings)
    } else {
        None
    }
}

/// Watches the configuration and settings files for changes.
pub struct ConfigWatcher {
    sender: Sender<CoreMessage>,
    config_path: PathBuf,
    settings_path: PathBuf,
    debug_enabled: bool,
}

impl ConfigWatcher {
    pub fn new(
        sender: Sender<CoreMessage>,
        config_path: PathBuf,
        state_dir: &Path,
        debug_enabled: bool,
    ) -> Self {
        Self {
            sender,
            config_path,
            settings_path: state_dir.join(SETTINGS_FILE_NAME),
            debug_enabled,
        }
    }

    /// Send one message per pending file. Returns false once the core loop is gone.
    fn flush(&self, pending: &mut HashSet<WatchedFile>) -> bool {
        for file in pending.drain() {
            if self.debug_enabled {
                log_pipe!();
                log_debug!(
                    "{} changed on disk",
                    match file {
                        WatchedFile::Config => "Configuration",
                        WatchedFile::Settings => "Settings",
                    }
                );
            }
            if self.sender.send(file.message()).is_err() {
                return false;
            }
        }
        true
    }

    /// Spawn the watcher thread. It runs until the core loop drops its receiver.
    pub fn start(self) -> Result<()> {
        let (tx, rx) = std::sync::mpsc::channel();

        let mut watcher = RecommendedWatcher::new(
            move |res: Result<Event, notify::Error>| {
                if let Ok(event) = res
                    && matches!(
                        event.kind,
                        EventKind::Create(_) | EventKind::Modify(_) | EventKind::Remove(_)
                    )
                {
                    let _ = tx.send(event);
                }
            },
            NotifyConfig::default(),
        )
        .context("Failed to create file watcher")?;

        let mut watched_dirs = HashSet::new();
        for path in [&self.config_path, &self.settings_path] {
            let Some(parent) = path.parent() else {
                continue;
            };
            if !parent.is_dir() || !watched_dirs.insert(parent.to_path_buf()) {
                continue;
            }
            watcher
                .watch(parent, RecursiveMode::NonRecursive)
                .with_context(|| format!("Failed to watch directory: {}", private_path(parent)))?;
        }

        if self.debug_enabled {
            log_pipe!();
            log_debug!("Watching for configuration changes:");
            log_indented!("{}", private_path(&self.config_path));
            log_indented!("{}", private_path(&self.settings_path));
        }

        thread::spawn(move || {
            // Dropping the watcher stops event delivery
            let _watcher = watcher;
            let quiet = Duration::from_millis(DEBOUNCE_MS);
            let mut pending: HashSet<WatchedFile> = HashSet::new();

            loop {
                // Wait for the burst to settle, then report every touched file once
                let event = if pending.is_empty() {
                    match rx.recv() {
                        Ok(event) => event,
                        Err(_) => return,
                    }
                } else {
                    match rx.recv_timeout(quiet) {
                        Ok(event) => event,
                        Err(RecvTimeoutError::Timeout) => {
                            if !self.flush(&mut pending) {
                                return;
                            }
                            continue;
                        }
                        Err(RecvTimeoutError::Disconnected) => {
                            self.flush(&mut pending);
                            return;
                        }
                    }
                };

                pending.extend(
                    event
                        .paths
                        .iter()
                        .filter_map(|path| classify_path(path, &self.config_path, &self.settings_path)),
                );
            }
        });

        Ok(())
    }
}

/// Start watching the active configuration file and the settings in `state_dir`.
pub fn start_config_watcher(
    sender: Sender<CoreMessage>,
    state_dir: &Path,
    debug_enabled: bool,
) -> Result<()> {
    let config_path = super::get_config_path()?;
    ConfigWatcher::new(sender, config_path, state_dir, debug_enabled).start()
}
