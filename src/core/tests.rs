use super::*;
use crate::common::constants::test_constants::*;
use crate::geo::Coordinate;
use crate::location::fixed::FixedProvider;
use crate::location::{LocationError, LocationFix};
use crate::playback::{MockPlaybackSink, TodaysSongSelector};
use crate::state::status::{read_status, status_path};
use crate::trigger::GeofenceState;
use chrono::{DateTime, Duration as ChronoDuration, TimeZone, Utc};
use std::path::Path;
use std::sync::mpsc;
use tempfile::{TempDir, tempdir};

const NEAR: (f64, f64) = (35.6762, 139.6504);
const FAR: (f64, f64) = (35.6862, 139.6503);

fn test_config() -> Config {
    Config {
        provider: Some("static".to_string()),
        poll_interval: Some(3600),
        sample_timeout: Some(TEST_SAMPLE_TIMEOUT),
        static_latitude: Some(FAR.0),
        static_longitude: Some(FAR.1),
        ..Config::default()
    }
}

fn sink_expecting(plays: usize) -> MockPlaybackSink {
    let mut sink = MockPlaybackSink::new();
    sink.expect_name().return_const("mock");
    sink.expect_play().times(plays).returning(|_, _| Ok(()));
    sink
}

fn set_home(state_dir: &Path) {
    let mut settings = SettingsStore::open(state_dir).unwrap();
    settings
        .set_home_location(
            Coordinate::new(TEST_HOME_LATITUDE, TEST_HOME_LONGITUDE).unwrap(),
            Some("Tokyo".to_string()),
        )
        .unwrap();
}

fn build_core(state_dir: &Path, sink: MockPlaybackSink) -> Core {
    let mut library = SongLibrary::open(state_dir).unwrap();
    library.seed_builtin().unwrap();
    let (sender, receiver) = mpsc::channel();

    Core::new(CoreParams {
        config: test_config(),
        settings: SettingsStore::open(state_dir).unwrap(),
        library,
        provider: Box::new(FixedProvider::new(Coordinate::new(FAR.0, FAR.1).unwrap())),
        playback: Playback::new(Box::new(TodaysSongSelector), Box::new(sink)),
        sender,
        receiver,
        debug_enabled: false,
    })
}

/// A core with a home location, started and listening.
fn started_core(sink: MockPlaybackSink) -> (TempDir, Core) {
    let dir = tempdir().unwrap();
    set_home(dir.path());
    let mut core = build_core(dir.path(), sink);
    core.start().unwrap();
    (dir, core)
}

fn at(minute: i64) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 10, 18, 18, 0, 0).unwrap() + ChronoDuration::minutes(minute)
}

fn sample(core: &Core, sequence: u64, position: (f64, f64)) -> CoreMessage {
    CoreMessage::Sample(SampleMessage {
        generation: core.sampler().generation(),
        sequence,
        result: Ok(LocationFix::new(
            Coordinate::new(position.0, position.1).unwrap(),
            Some(10.0),
            at(sequence as i64),
        )),
    })
}

#[test]
fn test_start_arms_and_samples_with_home() {
    let (_dir, core) = started_core(sink_expecting(0));

    assert_eq!(core.trigger().state(), GeofenceState::Armed);
    assert!(core.sampler().is_running());
    assert_eq!(core.sampler().provider_name(), Some("static"));
}

#[test]
fn test_start_without_home_stays_idle() {
    let dir = tempdir().unwrap();
    let mut core = build_core(dir.path(), sink_expecting(0));
    core.start().unwrap();

    assert_eq!(core.trigger().state(), GeofenceState::Idle);
    assert!(!core.sampler().is_running());
}

#[test]
fn test_arrival_plays_once_per_entry() {
    let (_dir, mut core) = started_core(sink_expecting(2));

    for (sequence, position) in [FAR, NEAR, NEAR, FAR, NEAR].into_iter().enumerate() {
        let message = sample(&core, sequence as u64 + 1, position);
        assert_eq!(core.handle_message(message).unwrap(), LoopControl::Continue);
    }

    assert_eq!(core.trigger().state(), GeofenceState::Inside);
    assert_eq!(core.trigger().status().plays, 2);
}

#[test]
fn test_auto_play_off_still_tracks_arrival() {
    let dir = tempdir().unwrap();
    set_home(dir.path());
    SettingsStore::open(dir.path())
        .unwrap()
        .set_value("auto_play", "false")
        .unwrap();
    let mut core = build_core(dir.path(), sink_expecting(0));
    core.start().unwrap();

    let message = sample(&core, 1, NEAR);
    core.handle_message(message).unwrap();

    assert_eq!(core.trigger().state(), GeofenceState::Inside);
    assert_eq!(core.trigger().status().plays, 1);
}

#[test]
fn test_permission_denied_keeps_armed() {
    let (_dir, mut core) = started_core(sink_expecting(0));

    let message = CoreMessage::Sample(SampleMessage {
        generation: core.sampler().generation(),
        sequence: 1,
        result: Err(LocationError::PermissionDenied),
    });
    core.handle_message(message).unwrap();

    let status = core.trigger().status();
    assert_eq!(status.state, GeofenceState::Armed);
    assert_eq!(status.unavailable, Some(LocationError::PermissionDenied));
}

#[test]
fn test_sample_from_previous_run_is_dropped() {
    let (dir, mut core) = started_core(sink_expecting(0));

    let stale = sample(&core, 1, NEAR);
    // Changing the radius restarts the sampler under a new generation
    SettingsStore::open(dir.path())
        .unwrap()
        .set_home_radius(200.0)
        .unwrap();
    core.handle_message(CoreMessage::SettingsChanged).unwrap();

    core.handle_message(stale).unwrap();
    assert_eq!(core.trigger().state(), GeofenceState::Armed);
    assert_eq!(core.trigger().proximity().radius_m, 200.0);
}

#[test]
fn test_disabling_geofence_stops_sampling() {
    let (dir, mut core) = started_core(sink_expecting(0));
    let in_flight = sample(&core, 1, NEAR);

    SettingsStore::open(dir.path())
        .unwrap()
        .set_geofence_enabled(false)
        .unwrap();
    core.handle_message(CoreMessage::SettingsChanged).unwrap();

    assert!(!core.sampler().is_running());
    assert!(!core.trigger().is_listening());

    core.handle_message(in_flight).unwrap();
    assert_eq!(core.trigger().state(), GeofenceState::Armed);
}

#[test]
fn test_home_set_by_another_process_arms() {
    let dir = tempdir().unwrap();
    let mut core = build_core(dir.path(), sink_expecting(1));
    core.start().unwrap();
    assert!(!core.sampler().is_running());

    set_home(dir.path());
    core.handle_message(CoreMessage::SettingsChanged).unwrap();

    assert_eq!(core.trigger().state(), GeofenceState::Armed);
    assert!(core.sampler().is_running());

    let message = sample(&core, 1, NEAR);
    core.handle_message(message).unwrap();
    assert_eq!(core.trigger().state(), GeofenceState::Inside);
}

#[test]
fn test_apply_config_restarts_sampler() {
    let (_dir, mut core) = started_core(sink_expecting(0));
    let before = core.sampler().generation();

    let config = Config {
        poll_interval: Some(600),
        ..test_config()
    };
    core.apply_config(config).unwrap();

    assert!(core.sampler().generation() > before);
    assert!(core.sampler().is_running());
}

#[test]
fn test_shutdown_exits_loop() {
    let (_dir, mut core) = started_core(sink_expecting(0));
    assert_eq!(
        core.handle_message(CoreMessage::Shutdown).unwrap(),
        LoopControl::Exit
    );
}

#[test]
fn test_unavailable_location_is_published() {
    let (dir, mut core) = started_core(sink_expecting(0));

    let message = CoreMessage::Sample(SampleMessage {
        generation: core.sampler().generation(),
        sequence: 1,
        result: Err(LocationError::PermissionDenied),
    });
    core.handle_message(message).unwrap();

    let status = read_status(&status_path(dir.path())).unwrap().unwrap();
    assert_eq!(status.pid, std::process::id());
    assert_eq!(status.state, GeofenceState::Armed);
    assert_eq!(status.unavailable, Some(LocationError::PermissionDenied));
    assert!(status.describe()[1].1.starts_with("unavailable"));

    // A good fix clears it
    let message = sample(&core, 2, FAR);
    core.handle_message(message).unwrap();
    let status = read_status(&status_path(dir.path())).unwrap().unwrap();
    assert_eq!(status.state, GeofenceState::Outside);
    assert_eq!(status.unavailable, None);
    assert!(status.last_distance_m.is_some());
}

#[test]
fn test_shutdown_removes_published_status() {
    let (dir, mut core) = started_core(sink_expecting(0));
    let path = status_path(dir.path());
    assert!(read_status(&path).unwrap().is_some());

    core.shutdown();
    assert!(read_status(&path).unwrap().is_none());
}
