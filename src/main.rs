//! Main application entry point.
//!
//! Parses the command line, applies the global options (`--config`, `--log`,
//! `--debug`) and dispatches to the command handlers in `mimicoach::commands`.
//! Errors are reported through the logger and turn into a non-zero exit code.

use anyhow::Result;

use mimicoach::args::{self, CliAction, ParsedArgs};
use mimicoach::commands;
use mimicoach::common::constants::{EXIT_FAILURE, EXIT_SUCCESS};
use mimicoach::config;
use mimicoach::logger::Log;
use mimicoach::log_error_exit;

fn main() {
    let parsed_args = ParsedArgs::from_env();
    let options = parsed_args.options.clone();

    // Keep the guard alive until exit so buffered lines reach the file
    let log_guard = match options.log_file.clone() {
        Some(path) => match Log::start_file_logging(path) {
            Ok(guard) => Some(guard),
            Err(e) => {
                log_error_exit!("Failed to start file logging: {e:#}");
                std::process::exit(EXIT_FAILURE);
            }
        },
        None => None,
    };

    if let Err(e) = config::set_config_dir(options.config_dir.clone()) {
        log_error_exit!("{e:#}");
        std::process::exit(EXIT_FAILURE);
    }

    let is_error = parsed_args.action == CliAction::ShowHelpDueToError;
    let code = match dispatch(parsed_args.action, options.debug_enabled) {
        Ok(()) if is_error => EXIT_FAILURE,
        Ok(()) => EXIT_SUCCESS,
        Err(e) => {
            log_error_exit!("{e:#}");
            EXIT_FAILURE
        }
    };

    // process::exit skips destructors
    drop(log_guard);
    std::process::exit(code);
}

fn dispatch(action: CliAction, debug_enabled: bool) -> Result<()> {
    match action {
        CliAction::ShowVersion => {
            args::display_version_info();
            Ok(())
        }
        CliAction::ShowHelp | CliAction::ShowHelpDueToError => {
            args::display_help();
            Ok(())
        }
        CliAction::Run => commands::run::handle_run_command(debug_enabled),
        CliAction::Home(command) => commands::home::handle_home_command(command, debug_enabled),
        CliAction::Geofence(command) => commands::geofence::handle_geofence_command(command),
        CliAction::Check {
            latitude,
            longitude,
        } => commands::check::handle_check_command(latitude, longitude),
        CliAction::Account(command) => commands::account::handle_account_command(command),
        CliAction::Words(command) => commands::words::handle_words_command(command),
        CliAction::Songs(command) => commands::songs::handle_songs_command(command),
        CliAction::Speak { text } => commands::speak::handle_speak_command(&text),
        CliAction::Simulate { track } => {
            commands::simulate::handle_simulate_command(&track, debug_enabled)
        }
        CliAction::Settings(command) => commands::settings::handle_settings_command(command),
    }
}
