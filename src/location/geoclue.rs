//! GeoClue2 location provider.
//!
//! Uses zbus's blocking API against the system bus. A GeoClue client is created
//! lazily on the first request and reused; each request starts the client,
//! waits for a `Location` object to appear, reads it and stops the client again
//! so the location service can power down between samples.

use chrono::{DateTime, Utc};
use std::thread;
use std::time::{Duration, Instant};
use zbus::blocking::Connection;
use zbus::proxy::CacheProperties;
use zbus::zvariant::OwnedObjectPath;

use super::{LocationError, LocationFix, LocationProvider};
use crate::common::constants::{GEOCLUE_ACCURACY_EXACT, GEOCLUE_DESKTOP_ID};
use crate::geo::Coordinate;

const LOCATION_POLL_STEP: Duration = Duration::from_millis(250);

#[zbus::proxy(
    interface = "org.freedesktop.GeoClue2.Manager",
    default_service = "org.freedesktop.GeoClue2",
    default_path = "/org/freedesktop/GeoClue2/Manager"
)]
trait GeoClueManager {
    fn get_client(&self) -> zbus::Result<OwnedObjectPath>;
}

#[zbus::proxy(
    interface = "org.freedesktop.GeoClue2.Client",
    default_service = "org.freedesktop.GeoClue2"
)]
trait GeoClueClient {
    fn start(&self) -> zbus::Result<()>;

    fn stop(&self) -> zbus::Result<()>;

    #[zbus(property)]
    fn location(&self) -> zbus::Result<OwnedObjectPath>;

    #[zbus(property)]
    fn set_desktop_id(&self, id: &str) -> zbus::Result<()>;

    #[zbus(property)]
    fn set_requested_accuracy_level(&self, level: u32) -> zbus::Result<()>;
}

#[zbus::proxy(
    interface = "org.freedesktop.GeoClue2.Location",
    default_service = "org.freedesktop.GeoClue2"
)]
trait GeoClueLocation {
    #[zbus(property)]
    fn latitude(&self) -> zbus::Result<f64>;

    #[zbus(property)]
    fn longitude(&self) -> zbus::Result<f64>;

    #[zbus(property)]
    fn accuracy(&self) -> zbus::Result<f64>;

    /// Seconds and microseconds since the epoch.
    #[zbus(property)]
    fn timestamp(&self) -> zbus::Result<(u64, u64)>;
}

#[derive(Default)]
pub struct GeoClueProvider {
    connection: Option<Connection>,
    client_path: Option<OwnedObjectPath>,
}

impl GeoClueProvider {
    pub fn new() -> Self {
        Self::default()
    }

    fn ensure_client(&mut self) -> Result<(Connection, OwnedObjectPath), LocationError> {
        if let (Some(connection), Some(path)) = (&self.connection, &self.client_path) {
            return Ok((connection.clone(), path.clone()));
        }

        let connection = Connection::system().map_err(|_| LocationError::Unsupported)?;
        let manager = GeoClueManagerProxyBlocking::new(&connection).map_err(|e| classify(&e))?;
        let path = manager.get_client().map_err(|e| classify(&e))?;

        let client = client_proxy(&connection, &path)?;
        client
            .set_desktop_id(GEOCLUE_DESKTOP_ID)
            .map_err(|e| classify(&e))?;
        client
            .set_requested_accuracy_level(GEOCLUE_ACCURACY_EXACT)
            .map_err(|e| classify(&e))?;
        // The proxy borrows `path`
        drop(client);

        self.connection = Some(connection.clone());
        self.client_path = Some(path.clone());
        Ok((connection, path))
    }

    fn read_fix(&mut self, timeout: Duration) -> Result<LocationFix, LocationError> {
        let (connection, path) = self.ensure_client()?;
        let client = client_proxy(&connection, &path)?;
        client.start().map_err(|e| classify(&e))?;

        let result = wait_for_location(&client, timeout)
            .and_then(|location_path| read_location(&connection, &location_path));

        let _ = client.stop();
        result
    }
}

impl LocationProvider for GeoClueProvider {
    fn name(&self) -> &'static str {
        "geoclue"
    }

    fn current_location(&mut self, timeout: Duration) -> Result<LocationFix, LocationError> {
        let result = self.read_fix(timeout);
        if matches!(result, Err(LocationError::Unsupported)) {
            // Service may have restarted; start from a fresh client next time
            self.connection = None;
            self.client_path = None;
        }
        result
    }
}

fn client_proxy<'a>(
    connection: &Connection,
    path: &'a OwnedObjectPath,
) -> Result<GeoClueClientProxyBlocking<'a>, LocationError> {
    GeoClueClientProxyBlocking::builder(connection)
        .path(path.as_ref())
        .and_then(|builder| builder.cache_properties(CacheProperties::No).build())
        .map_err(|e| classify(&e))
}

/// Poll the client's `Location` property until GeoClue publishes a fix.
fn wait_for_location(
    client: &GeoClueClientProxyBlocking<'_>,
    timeout: Duration,
) -> Result<OwnedObjectPath, LocationError> {
    let deadline = Instant::now() + timeout;
    loop {
        let path = client.location().map_err(|e| classify(&e))?;
        if path.as_str() != "/" {
            return Ok(path);
        }
        if Instant::now() >= deadline {
            return Err(LocationError::Timeout);
        }
        thread::sleep(LOCATION_POLL_STEP);
    }
}

fn read_location(
    connection: &Connection,
    path: &OwnedObjectPath,
) -> Result<LocationFix, LocationError> {
    let location = GeoClueLocationProxyBlocking::builder(connection)
        .path(path.as_ref())
        .and_then(|builder| builder.cache_properties(CacheProperties::No).build())
        .map_err(|e| classify(&e))?;

    let latitude = location.latitude().map_err(|e| classify(&e))?;
    let longitude = location.longitude().map_err(|e| classify(&e))?;
    let coordinate =
        Coordinate::new(latitude, longitude).map_err(|_| LocationError::PositionUnavailable)?;

    let accuracy = location.accuracy().ok().filter(|a| a.is_finite() && *a >= 0.0);
    let taken_at = location
        .timestamp()
        .ok()
        .and_then(|(secs, usecs)| timestamp_to_datetime(secs, usecs))
        .unwrap_or_else(Utc::now);

    Ok(LocationFix::new(coordinate, accuracy, taken_at))
}

fn timestamp_to_datetime(secs: u64, usecs: u64) -> Option<DateTime<Utc>> {
    let secs = i64::try_from(secs).ok()?;
    let nanos = u32::try_from(usecs.checked_mul(1000)?).ok()?;
    DateTime::from_timestamp(secs, nanos)
}

fn classify(error: &zbus::Error) -> LocationError {
    match error {
        zbus::Error::MethodError(name, _, _) => classify_error_name(name.as_str()),
        zbus::Error::FDO(fdo) => match fdo.as_ref() {
            zbus::fdo::Error::AccessDenied(_) | zbus::fdo::Error::AuthFailed(_) => {
                LocationError::PermissionDenied
            }
            zbus::fdo::Error::ServiceUnknown(_)
            | zbus::fdo::Error::NameHasNoOwner(_)
            | zbus::fdo::Error::NotSupported(_) => LocationError::Unsupported,
            zbus::fdo::Error::Timeout(_) | zbus::fdo::Error::NoReply(_) => LocationError::Timeout,
            _ => LocationError::PositionUnavailable,
        },
        zbus::Error::InputOutput(_) | zbus::Error::Address(_) => LocationError::Unsupported,
        _ => LocationError::PositionUnavailable,
    }
}

/// Map a D-Bus error name to a location error.
fn classify_error_name(name: &str) -> LocationError {
    match name.rsplit('.').next().unwrap_or(name) {
        "AccessDenied" | "AuthFailed" => LocationError::PermissionDenied,
        "ServiceUnknown" | "NameHasNoOwner" | "NotSupported" | "UnknownMethod" => {
            LocationError::Unsupported
        }
        "Timeout" | "NoReply" | "TimedOut" => LocationError::Timeout,
        _ => LocationError::PositionUnavailable,
    }
}
