use super::*;
use crate::common::constants::test_constants::*;
use std::fs;
use tempfile::tempdir;

fn tokyo() -> Coordinate {
    Coordinate::new(TEST_HOME_LATITUDE, TEST_HOME_LONGITUDE).unwrap()
}

#[test]
fn test_defaults() {
    let dir = tempdir().unwrap();
    let store = SettingsStore::open(dir.path()).unwrap();

    assert_eq!(store.get_home_location(), None);
    assert_eq!(
        store.get_proximity_config(),
        ProximityConfig {
            radius_m: 100.0,
            enabled: true
        }
    );
    assert!(store.app().auto_play);
    assert_eq!(store.app().volume, 80);
    assert_eq!(store.language(), Language::Ja);
}

#[test]
fn test_home_location_persists() {
    let dir = tempdir().unwrap();
    {
        let mut store = SettingsStore::open(dir.path()).unwrap();
        store
            .set_home_location(tokyo(), Some("Shibuya".to_string()))
            .unwrap();
    }

    let store = SettingsStore::open(dir.path()).unwrap();
    let home = store.get_home_location().unwrap();
    assert_eq!(home.coordinate, tokyo());
    assert_eq!(home.address.as_deref(), Some("Shibuya"));
}

#[test]
fn test_radius_validation() {
    let dir = tempdir().unwrap();
    let mut store = SettingsStore::open(dir.path()).unwrap();

    assert!(store.set_proximity_config(49.0, true).is_err());
    assert!(store.set_proximity_config(501.0, true).is_err());
    assert_eq!(store.get_proximity_config().radius_m, 100.0);

    let err = store.set_home_radius(10.0).unwrap_err();
    assert!(err.downcast_ref::<crate::common::validation::ValidationError>().is_some());

    assert_eq!(store.set_home_radius(250.0).unwrap().radius_m, 250.0);
}

#[test]
fn test_subscribers_see_changes() {
    let dir = tempdir().unwrap();
    let mut store = SettingsStore::open(dir.path()).unwrap();
    let events = store.subscribe();

    store.set_home_location(tokyo(), None).unwrap();
    store.set_geofence_enabled(false).unwrap();
    // Unchanged value: no event
    store.set_geofence_enabled(false).unwrap();
    store.clear_home_location().unwrap();

    let received: Vec<_> = events.try_iter().collect();
    assert_eq!(received.len(), 3);
    assert!(matches!(received[0], SettingsEvent::HomeChanged(Some(_))));
    assert_eq!(
        received[1],
        SettingsEvent::ProximityChanged(ProximityConfig {
            radius_m: 100.0,
            enabled: false
        })
    );
    assert_eq!(received[2], SettingsEvent::HomeChanged(None));
}

#[test]
fn test_reload_reports_external_changes() {
    let dir = tempdir().unwrap();
    let mut daemon = SettingsStore::open(dir.path()).unwrap();
    let events = daemon.subscribe();

    let mut cli = SettingsStore::open(dir.path()).unwrap();
    cli.set_home_location(tokyo(), None).unwrap();
    cli.set_home_radius(300.0).unwrap();

    let changes = daemon.reload();
    assert_eq!(changes.len(), 2);
    assert_eq!(daemon.get_proximity_config().radius_m, 300.0);
    assert_eq!(events.try_iter().count(), 2);

    assert!(daemon.reload().is_empty());
}

#[test]
fn test_partial_file_uses_defaults() {
    let dir = tempdir().unwrap();
    fs::write(
        dir.path().join("settings.json"),
        r#"{"app": {"volume": 30, "language": "en"}}"#,
    )
    .unwrap();

    let store = SettingsStore::open(dir.path()).unwrap();
    assert_eq!(store.app().volume, 30);
    assert_eq!(store.language(), Language::En);
    assert!(store.app().auto_play);
    assert_eq!(store.get_proximity_config().radius_m, 100.0);
}

#[test]
fn test_corrupt_or_out_of_range_file() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("settings.json");

    fs::write(&path, "{broken").unwrap();
    let store = SettingsStore::open(dir.path()).unwrap();
    assert_eq!(store.get_proximity_config(), ProximityConfig::default());

    fs::write(&path, r#"{"proximity": {"radius_m": 5000.0, "enabled": true}}"#).unwrap();
    let store = SettingsStore::open(dir.path()).unwrap();
    assert_eq!(store.get_proximity_config().radius_m, 500.0);
}

#[test]
fn test_set_value() {
    let dir = tempdir().unwrap();
    let mut store = SettingsStore::open(dir.path()).unwrap();

    store.set_value("music_genre", "chill").unwrap();
    store.set_value("theme", "dark").unwrap();
    store.set_value("auto_play", "off").unwrap();
    store.set_value("home_radius", "150").unwrap();
    store.set_value("daily_word_goal", "10").unwrap();

    assert_eq!(
        store.app().music_genre,
        GenrePreference::Only(crate::library::Genre::Chill)
    );
    assert_eq!(store.app().theme, Theme::Dark);
    assert!(!store.app().auto_play);
    assert_eq!(store.get_proximity_config().radius_m, 150.0);

    assert!(store.set_value("volume", "101").is_err());
    assert!(store.set_value("daily_word_goal", "0").is_err());
    assert!(store.set_value("language", "fr").is_err());
    assert!(store.set_value("nonsense", "1").is_err());

    let rows = store.describe();
    assert!(rows.contains(&("music_genre", "chill".to_string())));
    assert!(rows.contains(&("home_radius", "150".to_string())));
}

#[test]
fn test_genre_preference_serde() {
    let json = serde_json::to_string(&GenrePreference::Only(crate::library::Genre::Jpop)).unwrap();
    assert_eq!(json, "\"jpop\"");
    let all: GenrePreference = serde_json::from_str("\"all\"").unwrap();
    assert_eq!(all, GenrePreference::All);
    assert!(serde_json::from_str::<GenrePreference>("\"polka\"").is_err());
}
