//! Application-wide constants: defaults, validation limits and file names.

// # Geofence

/// Mean earth radius in meters (IUGG), used by the haversine distance.
pub const EARTH_RADIUS_METERS: f64 = 6_371_008.8;

pub const DEFAULT_HOME_RADIUS: f64 = 100.0;
pub const MINIMUM_HOME_RADIUS: f64 = 50.0;
pub const MAXIMUM_HOME_RADIUS: f64 = 500.0;
pub const DEFAULT_GEOFENCE_ENABLED: bool = true;

// # Location sampling

pub const DEFAULT_PROVIDER: &str = "geoclue";
pub const DEFAULT_POLL_INTERVAL: u64 = 30; // seconds
pub const MINIMUM_POLL_INTERVAL: u64 = 5;
pub const MAXIMUM_POLL_INTERVAL: u64 = 3600;

pub const DEFAULT_SAMPLE_TIMEOUT: u64 = 15; // seconds
pub const MINIMUM_SAMPLE_TIMEOUT: u64 = 1;
pub const MAXIMUM_SAMPLE_TIMEOUT: u64 = 120;

/// Fixes reporting a worse accuracy than this (meters) are ignored. 0 accepts all.
pub const DEFAULT_MAX_FIX_ACCURACY: f64 = 150.0;
pub const MAXIMUM_MAX_FIX_ACCURACY: f64 = 5000.0;

/// Desktop id reported to GeoClue when requesting a client.
pub const GEOCLUE_DESKTOP_ID: &str = "mimicoach";
/// GeoClue accuracy level "exact".
pub const GEOCLUE_ACCURACY_EXACT: u32 = 8;

// # Playback

pub const DEFAULT_PLAYER_COMMAND: &str = "mpv --no-video {url}";
pub const DEFAULT_SPEECH_COMMAND: &str = "espeak-ng -v en-us {text}";
pub const DEFAULT_AUTO_PLAY: bool = true;

// # Words and accounts

pub const MINIMUM_MASTERY: u8 = 0;
pub const MAXIMUM_MASTERY: u8 = 100;
/// Words below this mastery level are due for review.
pub const REVIEW_MASTERY_THRESHOLD: u8 = 70;
pub const TODAYS_WORDS_LIMIT: usize = 5;

pub const MINIMUM_PASSWORD_LENGTH: usize = 6;
/// Consecutive failed logins before an address is temporarily refused.
pub const MAXIMUM_FAILED_LOGINS: u32 = 5;
/// How long a locked address is refused before logins are accepted again.
pub const LOGIN_LOCKOUT_MINUTES: i64 = 15;

pub const DEFAULT_DAILY_WORD_GOAL: u32 = 5;
pub const MINIMUM_DAILY_WORD_GOAL: u32 = 1;
pub const MAXIMUM_DAILY_WORD_GOAL: u32 = 50;
pub const DEFAULT_VOLUME: u8 = 80;

// # Files

pub const APP_NAME: &str = "mimicoach";
pub const CONFIG_FILE_NAME: &str = "mimicoach.toml";
pub const SETTINGS_FILE_NAME: &str = "settings.json";
pub const WORDS_FILE_NAME: &str = "words.json";
pub const SONGS_FILE_NAME: &str = "songs.json";
pub const ACCOUNTS_FILE_NAME: &str = "accounts.json";
pub const SESSION_FILE_NAME: &str = "session.json";
pub const STATUS_FILE_NAME: &str = "status.json";
pub const LOCK_FILE_NAME: &str = "mimicoach.lock";

// # Exit codes

pub const EXIT_SUCCESS: i32 = 0;
pub const EXIT_FAILURE: i32 = 1;
