//! Register, sign in and sign out.
//!
//! Passwords are read from stdin so they never appear in the process list or
//! shell history.

use anyhow::Result;

use super::{auth_error, read_password};
use crate::args::AccountCommand;
use crate::session::{IdentityProvider, LocalIdentityProvider};

pub fn handle_account_command(command: AccountCommand) -> Result<()> {
    let (state_dir, settings) = super::open_settings()?;
    let language = settings.language();
    let mut identity =
        LocalIdentityProvider::open(&state_dir).map_err(|e| auth_error(e, language))?;

    match command {
        AccountCommand::Register { email, name } => {
            let password = read_password("Password")?;
            let profile = identity
                .register(&email, &password, &name)
                .map_err(|e| auth_error(e, language))?;
            log_block_start!("Account created for {}", profile.email);
            log_indented!("Signed in as {}", profile.name);
        }
        AccountCommand::Login { email } => {
            let password = read_password("Password")?;
            let profile = identity
                .login(&email, &password)
                .map_err(|e| auth_error(e, language))?;
            log_block_start!("Signed in as {} <{}>", profile.name, profile.email);
        }
        AccountCommand::Logout => match identity.current_user() {
            Some(profile) => {
                identity.logout().map_err(|e| auth_error(e, language))?;
                log_block_start!("Signed out {}", profile.email);
            }
            None => log_block_start!("Not signed in"),
        },
        AccountCommand::Whoami => match identity.current_user() {
            Some(profile) => {
                log_block_start!("Signed in as {} <{}>", profile.name, profile.email);
                log_indented!(
                    "Member since {}",
                    profile.created_at.format("%Y-%m-%d")
                );
            }
            None => {
                log_block_start!("Not signed in");
                log_indented!("Run 'mimicoach account login <email>'");
            }
        },
    }

    log_end!();
    Ok(())
}
