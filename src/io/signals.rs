//! Unix signal handling for the daemon.
//!
//! SIGINT and SIGTERM stop the daemon; SIGHUP and SIGUSR2 reload the
//! configuration and settings. Signals are turned into [`CoreMessage`]s on the
//! core loop's channel by a background thread, so the loop never runs code from
//! a signal context.

use anyhow::{Context, Result};
use signal_hook::{
    consts::signal::{SIGHUP, SIGINT, SIGTERM, SIGUSR2},
    iterator::Signals,
};
use std::sync::mpsc::Sender;
use std::thread;

use crate::core::CoreMessage;

/// Message the core loop receives for a signal number.
pub fn message_for_signal(signal: i32) -> Option<CoreMessage> {
    match signal {
        SIGINT | SIGTERM => Some(CoreMessage::Shutdown),
        SIGHUP | SIGUSR2 => Some(CoreMessage::Reload),
        _ => None,
    }
}

/// Register the handlers and forward signals to `sender`.
pub fn setup_signal_handler(sender: Sender<CoreMessage>, debug_enabled: bool) -> Result<()> {
    let mut signals = Signals::new([SIGINT, SIGTERM, SIGHUP, SIGUSR2])
        .context("failed to register signal handlers")?;

    thread::spawn(move || {
        for sig in signals.forever() {
            let Some(message) = message_for_signal(sig) else {
                continue;
            };

            if debug_enabled {
                log_pipe!();
                log_debug!("Received signal {sig}");
            }

            if sender.send(message).is_err() {
                // Core loop is gone
                break;
            }
        }
    });

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signal_mapping() {
        assert!(matches!(message_for_signal(SIGINT), Some(CoreMessage::Shutdown)));
        assert!(matches!(message_for_signal(SIGTERM), Some(CoreMessage::Shutdown)));
        assert!(matches!(message_for_signal(SIGHUP), Some(CoreMessage::Reload)));
        assert!(matches!(message_for_signal(SIGUSR2), Some(CoreMessage::Reload)));
        assert!(message_for_signal(signal_hook::consts::signal::SIGUSR1).is_none());
    }
}
