use super::builder::default_config_content;
use super::validation::validate_config;
use super::watcher::{WatchedFile, classify_path};
use super::*;
use crate::common::constants::test_constants::*;
use serial_test::serial;
use std::fs;
use std::path::Path;
use tempfile::tempdir;

fn geoclue_config() -> Config {
    Config {
        provider: Some("geoclue".to_string()),
        poll_interval: Some(TEST_POLL_INTERVAL),
        sample_timeout: Some(TEST_SAMPLE_TIMEOUT),
        ..Config::default()
    }
}

#[test]
#[serial]
fn test_config_load_default_creation() {
    let temp_dir = tempdir().unwrap();
    let config_path = temp_dir.path().join("mimicoach").join("mimicoach.toml");

    let original = std::env::var("XDG_CONFIG_HOME").ok();
    unsafe {
        std::env::set_var("XDG_CONFIG_HOME", temp_dir.path());
    }

    let result = Config::load();

    unsafe {
        match original {
            Some(val) => std::env::set_var("XDG_CONFIG_HOME", val),
            None => std::env::remove_var("XDG_CONFIG_HOME"),
        }
    }

    let config = result.unwrap();
    assert!(config_path.exists());
    assert_eq!(config.provider_kind().unwrap(), ProviderKind::GeoClue);
}

#[test]
fn test_default_config_parses_and_validates() {
    let config: Config = toml::from_str(&default_config_content()).unwrap();
    validate_config(&config).unwrap();

    assert_eq!(config.provider.as_deref(), Some(DEFAULT_PROVIDER));
    assert_eq!(config.poll_interval, Some(DEFAULT_POLL_INTERVAL));
    assert_eq!(config.sample_timeout, Some(DEFAULT_SAMPLE_TIMEOUT));
    assert_eq!(config.max_fix_accuracy, Some(DEFAULT_MAX_FIX_ACCURACY));
    assert_eq!(config.player_command(), DEFAULT_PLAYER_COMMAND);
    // Example values for the other providers stay commented out
    assert!(config.static_latitude.is_none());
    assert!(config.replay_track.is_none());
}

#[test]
fn test_default_config_comments_aligned() {
    let content = default_config_content();
    let columns: Vec<usize> = content
        .lines()
        .filter(|line| line.contains(" = "))
        .map(|line| line.find(" # ").unwrap())
        .collect();

    assert!(!columns.is_empty());
    assert!(columns.windows(2).all(|pair| pair[0] == pair[1]));
}

#[test]
fn test_default_config_file_creation() {
    let temp_dir = tempdir().unwrap();
    let config_path = temp_dir.path().join("nested").join("mimicoach.toml");

    create_default_config(&config_path).unwrap();

    let loaded = load_from_path(&config_path).unwrap();
    assert_eq!(loaded.poll_interval(), std::time::Duration::from_secs(30));
}

#[test]
fn test_load_from_missing_path_fails() {
    let temp_dir = tempdir().unwrap();
    let result = load_from_path(&temp_dir.path().join("absent.toml"));
    assert!(result.is_err());
}

#[test]
fn test_config_toml_parsing() {
    let content = r#"
provider = "static"
poll_interval = 60
sample_timeout = 10
max_fix_accuracy = 0
static_latitude = 35.6762
static_longitude = 139.6503
player_command = ""
"#;
    let temp_dir = tempdir().unwrap();
    let path = temp_dir.path().join("mimicoach.toml");
    fs::write(&path, content).unwrap();

    let config = load_from_path(&path).unwrap();
    assert_eq!(config.provider_kind().unwrap(), ProviderKind::Static);
    assert_eq!(config.static_latitude, Some(TEST_HOME_LATITUDE));
    assert_eq!(config.max_fix_accuracy(), 0.0);
    assert_eq!(config.player_command(), "");
    assert_eq!(config.speech_command(), DEFAULT_SPEECH_COMMAND);

    let settings = config.sampler_settings();
    assert_eq!(settings.poll_interval.as_secs(), 60);
    assert_eq!(settings.timeout.as_secs(), 10);
}

#[test]
fn test_config_malformed_toml() {
    let temp_dir = tempdir().unwrap();
    let path = temp_dir.path().join("mimicoach.toml");
    fs::write(&path, "poll_interval = \"often\"\n").unwrap();

    assert!(load_from_path(&path).is_err());
}

#[test]
fn test_empty_config_uses_defaults() {
    let config: Config = toml::from_str("").unwrap();
    validate_config(&config).unwrap();

    assert_eq!(config.provider_kind().unwrap(), ProviderKind::GeoClue);
    assert_eq!(config.poll_interval().as_secs(), DEFAULT_POLL_INTERVAL);
    assert_eq!(config.sample_timeout().as_secs(), DEFAULT_SAMPLE_TIMEOUT);
    assert_eq!(config.max_fix_accuracy(), DEFAULT_MAX_FIX_ACCURACY);
}

#[test]
fn test_provider_kind_parsing() {
    assert_eq!("GeoClue".parse::<ProviderKind>().unwrap(), ProviderKind::GeoClue);
    assert_eq!(" replay ".parse::<ProviderKind>().unwrap(), ProviderKind::Replay);
    assert!("gps".parse::<ProviderKind>().is_err());

    let config = Config {
        provider: Some("gps".to_string()),
        ..Config::default()
    };
    assert!(validate_config(&config).is_err());
}

#[test]
fn test_config_validation_basic() {
    assert!(validate_config(&geoclue_config()).is_ok());
}

#[test]
fn test_config_validation_poll_interval_range() {
    for (interval, valid) in [(4, false), (5, true), (3600, true), (3601, false)] {
        let config = Config {
            poll_interval: Some(interval),
            sample_timeout: Some(1),
            ..geoclue_config()
        };
        assert_eq!(
            validate_config(&config).is_ok(),
            valid,
            "poll_interval = {interval}"
        );
    }
}

#[test]
fn test_config_validation_sample_timeout_range() {
    for (timeout, valid) in [(0, false), (1, true), (120, true), (121, false)] {
        let config = Config {
            poll_interval: Some(600),
            sample_timeout: Some(timeout),
            ..geoclue_config()
        };
        assert_eq!(
            validate_config(&config).is_ok(),
            valid,
            "sample_timeout = {timeout}"
        );
    }
}

#[test]
fn test_config_validation_timeout_within_interval() {
    let config = Config {
        poll_interval: Some(10),
        sample_timeout: Some(20),
        ..geoclue_config()
    };
    let err = validate_config(&config).unwrap_err();
    assert!(err.to_string().contains("must not exceed poll_interval"));

    // The default interval applies when only the timeout is set
    let config = Config {
        poll_interval: None,
        sample_timeout: Some(60),
        ..geoclue_config()
    };
    assert!(validate_config(&config).is_err());
}

#[test]
fn test_config_validation_accuracy_range() {
    for (accuracy, valid) in [(-1.0, false), (0.0, true), (5000.0, true), (5000.5, false)] {
        let config = Config {
            max_fix_accuracy: Some(accuracy),
            ..geoclue_config()
        };
        assert_eq!(
            validate_config(&config).is_ok(),
            valid,
            "max_fix_accuracy = {accuracy}"
        );
    }
}

#[test]
fn test_config_validation_static_provider() {
    let mut config = Config {
        provider: Some("static".to_string()),
        static_latitude: Some(TEST_HOME_LATITUDE),
        ..Config::default()
    };
    assert!(validate_config(&config).is_err());

    config.static_longitude = Some(TEST_HOME_LONGITUDE);
    assert!(validate_config(&config).is_ok());

    config.static_latitude = Some(91.0);
    assert!(validate_config(&config).is_err());

    config.static_latitude = Some(TEST_HOME_LATITUDE);
    config.static_longitude = Some(-180.5);
    assert!(validate_config(&config).is_err());
}

#[test]
fn test_config_validation_replay_provider() {
    let mut config = Config {
        provider: Some("replay".to_string()),
        ..Config::default()
    };
    assert!(validate_config(&config).is_err());

    config.replay_track = Some("   ".to_string());
    assert!(validate_config(&config).is_err());

    config.replay_track = Some("walk.jsonl".to_string());
    assert!(validate_config(&config).is_ok());
}

#[test]
fn test_config_validation_unterminated_placeholder() {
    let config = Config {
        player_command: Some("mpv {url".to_string()),
        ..geoclue_config()
    };
    assert!(validate_config(&config).is_err());
}

#[test]
fn test_watcher_classifies_paths() {
    let config_path = Path::new("/home/user/.config/mimicoach/mimicoach.toml");
    let settings_path = Path::new("/home/user/.local/state/mimicoach/default/settings.json");

    assert_eq!(
        classify_path(config_path, config_path, settings_path),
        Some(WatchedFile::Config)
    );
    assert_eq!(
        classify_path(
            Path::new("/home/user/.local/state/mimicoach/default/settings.json"),
            config_path,
            settings_path
        ),
        Some(WatchedFile::Settings)
    );
    assert_eq!(
        classify_path(
            Path::new("/home/user/.local/state/mimicoach/default/.tmpX1y2"),
            config_path,
            settings_path
        ),
        None
    );
    assert_eq!(
        classify_path(
            Path::new("/home/user/.local/state/mimicoach/default/words.json"),
            config_path,
            settings_path
        ),
        None
    );
}

#[test]
fn test_watcher_reports_last_of_quick_writes() {
    use crate::core::CoreMessage;
    use std::sync::mpsc;
    use std::thread;
    use std::time::Duration;
    use super::watcher::ConfigWatcher;

    let dir = tempdir().unwrap();
    let settings_path = dir.path().join("settings.json");
    let (tx, rx) = mpsc::channel();
    ConfigWatcher::new(tx, dir.path().join("mimicoach.toml"), dir.path(), false)
        .start()
        .unwrap();

    // Home first, then the radius a moment later
    fs::write(&settings_path, r#"{"proximity": {"radius_m": 100.0, "enabled": true}}"#).unwrap();
    thread::sleep(Duration::from_millis(150));
    fs::write(&settings_path, r#"{"proximity": {"radius_m": 300.0, "enabled": true}}"#).unwrap();

    let message = rx.recv_timeout(Duration::from_secs(5)).unwrap();
    assert!(matches!(message, CoreMessage::SettingsChanged));
    // Reported after the burst, so the reload sees the final contents
    assert!(fs::read_to_string(&settings_path).unwrap().contains("300.0"));
    assert!(rx.recv_timeout(Duration::from_millis(800)).is_err());

    // A later write is reported again
    fs::write(&settings_path, r#"{"proximity": {"radius_m": 200.0, "enabled": false}}"#).unwrap();
    let message = rx.recv_timeout(Duration::from_secs(5)).unwrap();
    assert!(matches!(message, CoreMessage::SettingsChanged));
}

mod property_tests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn test_valid_ranges_always_accepted(
            interval in MINIMUM_POLL_INTERVAL..=MAXIMUM_POLL_INTERVAL,
            timeout in MINIMUM_SAMPLE_TIMEOUT..=5u64,
            accuracy in 0.0f64..=MAXIMUM_MAX_FIX_ACCURACY,
        ) {
            let config = Config {
                poll_interval: Some(interval),
                sample_timeout: Some(timeout),
                max_fix_accuracy: Some(accuracy),
                ..Config::default()
            };
            prop_assert!(validate_config(&config).is_ok());
        }

        #[test]
        fn test_out_of_range_latitude_rejected(
            latitude in prop_oneof![-1000.0f64..-90.001, 90.001f64..1000.0],
        ) {
            let config = Config {
                provider: Some("static".to_string()),
                static_latitude: Some(latitude),
                static_longitude: Some(0.0),
                ..Config::default()
            };
            prop_assert!(validate_config(&config).is_err());
        }
    }
}
