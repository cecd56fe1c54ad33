//! Show and change user settings.

use anyhow::Result;

use crate::args::SettingsCommand;
use crate::common::utils::private_path;

pub fn handle_settings_command(command: SettingsCommand) -> Result<()> {
    let (_, mut settings) = super::open_settings()?;

    match command {
        SettingsCommand::Show => {
            log_block_start!("Settings ({})", private_path(settings.path()));
            let rows = settings.describe();
            let width = rows.iter().map(|(key, _)| key.len()).max().unwrap_or(0);
            for (key, value) in rows {
                log_indented!("{key:<width$}  {value}");
            }
        }
        SettingsCommand::Set { key, value } => {
            settings.set_value(&key, &value)?;
            let current = settings
                .describe()
                .into_iter()
                .find(|(name, _)| *name == key)
                .map(|(_, value)| value)
                .unwrap_or(value);
            log_block_start!("{key} set to {current}");
        }
    }

    log_end!();
    Ok(())
}
