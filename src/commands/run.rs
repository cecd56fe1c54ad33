//! Start the geofence daemon.

use anyhow::Result;
use std::sync::mpsc;

use crate::common::utils::private_path;
use crate::config::{self, Config};
use crate::core::{Core, CoreParams};
use crate::io::lock::acquire_lock;
use crate::io::signals::setup_signal_handler;
use crate::library::SongLibrary;
use crate::location::create_provider;
use crate::playback::{Playback, TodaysSongSelector, create_sink};
use crate::settings::SettingsStore;
use crate::state::current_state_dir;

pub fn handle_run_command(debug_enabled: bool) -> Result<()> {
    log_version!();
    if debug_enabled {
        log_pipe!();
        log_debug!("Debug mode enabled - showing location samples and rejections");
    }

    let config = Config::load()?;
    let lock = acquire_lock()?;
    if debug_enabled {
        log_pipe!();
        log_debug!("Lock acquired: {}", private_path(lock.path()));
    }
    config.log_config();

    let state_dir = current_state_dir()?;
    let settings = SettingsStore::open(&state_dir)?;
    let library = SongLibrary::open(&state_dir)?;
    let provider = create_provider(&config)?;
    let playback = Playback::new(
        Box::new(TodaysSongSelector),
        create_sink(config.player_command()),
    );

    let (sender, receiver) = mpsc::channel();
    setup_signal_handler(sender.clone(), debug_enabled)?;
    if let Err(e) = config::start_config_watcher(sender.clone(), &state_dir, debug_enabled) {
        log_pipe!();
        log_warning!("Hot reload unavailable: {e:#}");
        log_indented!("Send SIGHUP to reload the configuration manually");
    }

    let core = Core::new(CoreParams {
        config,
        settings,
        library,
        provider,
        playback,
        sender,
        receiver,
        debug_enabled,
    });
    core.execute()?;

    drop(lock);
    log_end!();
    Ok(())
}
