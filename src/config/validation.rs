//! Configuration validation.
//!
//! Range checks for every numeric field plus the fields each provider needs.

use anyhow::Result;

use super::{Config, ProviderKind};
use crate::common::constants::*;

/// Reject configurations the sampler cannot run with.
pub fn validate_config(config: &Config) -> Result<()> {
    let provider = config.provider_kind()?;

    if let Some(interval) = config.poll_interval
        && !(MINIMUM_POLL_INTERVAL..=MAXIMUM_POLL_INTERVAL).contains(&interval)
    {
        anyhow::bail!(
            "poll_interval ({} s) must be between {} and {} seconds",
            interval,
            MINIMUM_POLL_INTERVAL,
            MAXIMUM_POLL_INTERVAL
        );
    }

    if let Some(timeout) = config.sample_timeout
        && !(MINIMUM_SAMPLE_TIMEOUT..=MAXIMUM_SAMPLE_TIMEOUT).contains(&timeout)
    {
        anyhow::bail!(
            "sample_timeout ({} s) must be between {} and {} seconds",
            timeout,
            MINIMUM_SAMPLE_TIMEOUT,
            MAXIMUM_SAMPLE_TIMEOUT
        );
    }

    // A fix has to arrive before the next one is due
    if config.sample_timeout() > config.poll_interval() {
        anyhow::bail!(
            "sample_timeout ({} s) must not exceed poll_interval ({} s)",
            config.sample_timeout().as_secs(),
            config.poll_interval().as_secs()
        );
    }

    if let Some(accuracy) = config.max_fix_accuracy
        && !(0.0..=MAXIMUM_MAX_FIX_ACCURACY).contains(&accuracy)
    {
        anyhow::bail!(
            "max_fix_accuracy ({} m) must be between 0 and {} meters",
            accuracy,
            MAXIMUM_MAX_FIX_ACCURACY
        );
    }

    if let Some(lat) = config.static_latitude
        && !(-90.0..=90.0).contains(&lat)
    {
        anyhow::bail!(
            "static_latitude must be between -90 and 90 degrees (got {})",
            lat
        );
    }

    if let Some(lon) = config.static_longitude
        && !(-180.0..=180.0).contains(&lon)
    {
        anyhow::bail!(
            "static_longitude must be between -180 and 180 degrees (got {})",
            lon
        );
    }

    match provider {
        ProviderKind::Static => {
            if config.static_latitude.is_none() || config.static_longitude.is_none() {
                anyhow::bail!(
                    "provider = \"static\" requires static_latitude and static_longitude"
                );
            }
        }
        ProviderKind::Replay => {
            if config
                .replay_track
                .as_deref()
                .is_none_or(|track| track.trim().is_empty())
            {
                anyhow::bail!("provider = \"replay\" requires replay_track");
            }
        }
        ProviderKind::GeoClue => {}
    }

    for (field, command) in [
        ("player_command", config.player_command.as_deref()),
        ("speech_command", config.speech_command.as_deref()),
    ] {
        if let Some(command) = command
            && command.contains('{')
            && !command.contains('}')
        {
            anyhow::bail!("{} has an unterminated placeholder: {}", field, command);
        }
    }

    Ok(())
}
