//! Replay a recorded track through the geofence without a daemon.
//!
//! Every entry of the track is fed to a fresh [`PlaybackTrigger`] armed with
//! the saved home and radius. Arrivals print the song that would start; no
//! audio is played and no state is written.

use anyhow::Result;
use chrono::Local;
use std::path::Path;
use std::time::Duration;

use crate::config::Config;
use crate::library::SongLibrary;
use crate::location::{LocationProvider, SampleMessage};
use crate::location::replay::ReplayProvider;
use crate::playback::{Playback, TodaysSongSelector, create_sink};
use crate::trigger::{GeofenceState, PlaybackTrigger, log_trigger_event};

/// Outcome of a replay.
#[derive(Debug, Clone, PartialEq)]
pub struct SimulationReport {
    pub samples: u64,
    /// Sequence numbers of the samples that started playback.
    pub arrivals: Vec<u64>,
    pub final_state: GeofenceState,
}

/// Feed every remaining entry of `provider` to `trigger`.
pub fn replay_track<F>(
    trigger: &mut PlaybackTrigger,
    provider: &mut ReplayProvider,
    debug_enabled: bool,
    mut on_arrival: F,
) -> SimulationReport
where
    F: FnMut(u64),
{
    let mut samples = 0;
    let mut arrivals = Vec::new();

    while provider.remaining() > 0 {
        samples += 1;
        let message = SampleMessage {
            generation: 1,
            sequence: samples,
            result: provider.current_location(Duration::ZERO),
        };

        let event = trigger.on_sample(&message);
        log_trigger_event(&event, debug_enabled);
        if event.fires_play() {
            arrivals.push(samples);
            on_arrival(samples);
        }
    }

    SimulationReport {
        samples,
        arrivals,
        final_state: trigger.state(),
    }
}

pub fn handle_simulate_command(track: &str, debug_enabled: bool) -> Result<()> {
    let mut provider = ReplayProvider::from_path(Path::new(track))?;
    let config = Config::load()?;
    let (state_dir, settings) = super::open_settings()?;

    let Some(home) = settings.get_home_location() else {
        anyhow::bail!("No home location set. Run 'mimicoach home set <lat> <lon>' first");
    };
    let proximity = settings.get_proximity_config();

    log_block_start!("Replaying {} samples from {track}", provider.remaining());
    log_indented!("Home: {}", home.label());
    log_indented!("Radius: {:.0} m", proximity.radius_m);

    let mut trigger = PlaybackTrigger::new(Some(home), proximity, config.max_fix_accuracy());
    let armed = trigger.arm();
    log_trigger_event(&armed, debug_enabled);
    if !trigger.is_listening() {
        log_pipe!();
        log_warning!("Geofencing is disabled, every sample will be ignored");
    }

    let library = SongLibrary::open(&state_dir)?;
    let mut playback = Playback::new(Box::new(TodaysSongSelector), create_sink(""));
    let today = Local::now().date_naive();

    let report = replay_track(&mut trigger, &mut provider, debug_enabled, |_| {
        if !settings.app().auto_play {
            log_indented!("Auto-play is off");
            return;
        }
        match playback.play_todays_song(library.songs(), settings.app(), today) {
            Ok(Some(_)) => {}
            Ok(None) => log_indented!("The song library is empty"),
            Err(e) => log_error!("Playback failed: {e:#}"),
        }
    });

    log_block_start!(
        "Replayed {} samples: {} arrival{}, final state {}",
        report.samples,
        report.arrivals.len(),
        if report.arrivals.len() == 1 { "" } else { "s" },
        report.final_state
    );
    log_end!();
    Ok(())
}
