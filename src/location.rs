//! Device location acquisition for the Mayday TUI.
//!
//! A report is only useful to responders if it carries coordinates, so this
//! module owns the whole acquisition step: picking a position source from
//! config, enforcing the acquisition deadline, reverse geocoding the fix,
//! and narrating progress on the status line via [`Event`]s.
//!
//! The default source geolocates the machine's public IP (IpApi). That is
//! city-level at best, which is why the config also offers a `manual`
//! source for fixed installations.

use crate::config::{LocationConfig, SourceKind};
use crate::events::{Event, StatusKind, StatusLine};
use crate::geocode::{AddressResolver, ResolvedAddress};
use crate::models::{Coordinates, LocationFix};
use ipgeolocate::{Locator, Service};
use std::fmt;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tokio::time::timeout;
use tracing::{debug, info, warn};

/// Where the public IP is fetched from before geolocating it.
const PUBLIC_IP_ENDPOINT: &str = "https://api.ipify.org";

/// Why a location acquisition failed.
///
/// Each variant displays as a full user-facing sentence;
/// [`user_message`](LocationError::user_message) prefixes it with the common
/// lead-in shown on the status line and in alerts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocationError {
    /// No position source is available (config has `source = "off"`).
    Unsupported,
    /// The source refused to answer (denied request, exhausted quota).
    PermissionDenied,
    /// The source answered but produced no usable position.
    Unavailable,
    /// The acquisition deadline elapsed.
    Timeout,
    /// Anything the other variants don't cover.
    Unknown,
}

impl fmt::Display for LocationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            LocationError::Unsupported => {
                "Location lookup is not supported in this environment."
            }
            LocationError::PermissionDenied => {
                "Access to your location was denied. Please allow location access and try again."
            }
            LocationError::Unavailable => "Location information is unavailable.",
            LocationError::Timeout => "The location request timed out.",
            LocationError::Unknown => "An unknown error occurred.",
        };
        f.write_str(text)
    }
}

impl std::error::Error for LocationError {}

impl LocationError {
    /// The full sentence shown to the user when acquisition fails. Always
    /// mentions the word "location"; the submit flow keys on that to decide
    /// whether an error belongs on the location status line.
    pub fn user_message(&self) -> String {
        format!("Could not get your location. {self}")
    }
}

/// Knobs for one acquisition, mirroring the location section of the config.
#[derive(Debug, Clone, Copy)]
pub struct FixOptions {
    /// Ask the source for the most precise fix it can give.
    pub high_accuracy: bool,
    /// Deadline for the whole position lookup.
    pub timeout: Duration,
    /// Oldest cached fix a source may serve. Zero forces a fresh lookup.
    pub max_age: Duration,
}

impl Default for FixOptions {
    fn default() -> Self {
        Self {
            high_accuracy: true,
            timeout: Duration::from_secs(15),
            max_age: Duration::ZERO,
        }
    }
}

impl From<&LocationConfig> for FixOptions {
    fn from(config: &LocationConfig) -> Self {
        Self {
            high_accuracy: config.high_accuracy,
            timeout: config.timeout(),
            max_age: config.max_age(),
        }
    }
}

/// Anything that can produce the device's coordinates.
///
/// Production uses [`ConfiguredSource`]; tests substitute canned sources.
/// Implementations should not enforce the timeout themselves, the caller
/// wraps the lookup in one.
#[allow(async_fn_in_trait)]
pub trait PositionSource {
    /// Whether this source can be asked at all. Checked before the loading
    /// state is ever shown; an unavailable source fails as `Unsupported`
    /// without a lookup.
    fn available(&self) -> bool {
        true
    }

    async fn position(&self, options: &FixOptions) -> Result<Coordinates, LocationError>;
}

#[derive(Debug, Clone, Copy)]
struct CachedFix {
    at: Instant,
    coords: Coordinates,
}

/// Position source backed by IP geolocation.
///
/// Fetches the machine's public IP from ipify, then geolocates it through
/// the IpApi service. Keeps the last fix so a nonzero `max_age` can skip
/// the network round trips entirely.
#[derive(Clone)]
pub struct IpSource {
    client: reqwest::Client,
    cache: Arc<Mutex<Option<CachedFix>>>,
}

impl IpSource {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
            cache: Arc::new(Mutex::new(None)),
        }
    }

    async fn public_ip(&self) -> Result<String, LocationError> {
        let response = self
            .client
            .get(PUBLIC_IP_ENDPOINT)
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(|e| {
                warn!("Public IP lookup failed: {}", e);
                LocationError::Unavailable
            })?;

        let body = response.text().await.map_err(|e| {
            warn!("Public IP response unreadable: {}", e);
            LocationError::Unavailable
        })?;

        let ip = body.trim().to_owned();
        if ip.is_empty() {
            warn!("Public IP lookup returned an empty body");
            return Err(LocationError::Unavailable);
        }
        Ok(ip)
    }

    fn cached_within(&self, max_age: Duration) -> Option<Coordinates> {
        let cache = self.cache.lock().ok()?;
        cache
            .as_ref()
            .and_then(|c| (c.at.elapsed() <= max_age).then_some(c.coords))
    }

    fn store(&self, coords: Coordinates) {
        if let Ok(mut cache) = self.cache.lock() {
            *cache = Some(CachedFix {
                at: Instant::now(),
                coords,
            });
        }
    }
}

impl Default for IpSource {
    fn default() -> Self {
        Self::new()
    }
}

impl PositionSource for IpSource {
    async fn position(&self, options: &FixOptions) -> Result<Coordinates, LocationError> {
        if !options.max_age.is_zero() {
            if let Some(coords) = self.cached_within(options.max_age) {
                debug!(
                    "Serving cached fix ({}, {})",
                    coords.latitude, coords.longitude
                );
                return Ok(coords);
            }
        }
        if options.high_accuracy {
            debug!("High accuracy requested; IP positioning is city-level at best");
        }

        let ip = self.public_ip().await?;

        match Locator::get(&ip, Service::IpApi).await {
            Ok(loc) => {
                let latitude = loc
                    .latitude
                    .parse::<f64>()
                    .map_err(|_| LocationError::Unavailable)?;
                let longitude = loc
                    .longitude
                    .parse::<f64>()
                    .map_err(|_| LocationError::Unavailable)?;
                let coords = Coordinates {
                    latitude,
                    longitude,
                };
                info!("Geolocation successful - ({}, {})", latitude, longitude);
                self.store(coords);
                Ok(coords)
            }
            Err(e) => {
                warn!("Error using geolocation service: {}", e);
                Err(classify_geo_error(&e.to_string()))
            }
        }
    }
}

/// Maps a geolocation-service error onto the failure taxonomy by message
/// content; the service reports refusals and quota exhaustion as plain text.
fn classify_geo_error(message: &str) -> LocationError {
    let lower = message.to_lowercase();
    if lower.contains("denied") || lower.contains("quota") || lower.contains("limit") {
        LocationError::PermissionDenied
    } else {
        LocationError::Unavailable
    }
}

/// The position source selected by the `[location]` config section.
#[derive(Clone)]
pub enum ConfiguredSource {
    Ip(IpSource),
    Manual(Coordinates),
    Off,
}

impl ConfiguredSource {
    pub fn from_config(config: &LocationConfig) -> Self {
        match config.source {
            SourceKind::Ip => ConfiguredSource::Ip(IpSource::new()),
            SourceKind::Manual => ConfiguredSource::Manual(Coordinates {
                latitude: config.manual_lat,
                longitude: config.manual_lon,
            }),
            SourceKind::Off => ConfiguredSource::Off,
        }
    }
}

impl PositionSource for ConfiguredSource {
    fn available(&self) -> bool {
        !matches!(self, ConfiguredSource::Off)
    }

    async fn position(&self, options: &FixOptions) -> Result<Coordinates, LocationError> {
        match self {
            ConfiguredSource::Ip(source) => source.position(options).await,
            ConfiguredSource::Manual(coords) => {
                debug!(
                    "Using manual coordinates ({}, {})",
                    coords.latitude, coords.longitude
                );
                Ok(*coords)
            }
            ConfiguredSource::Off => Err(LocationError::Unsupported),
        }
    }
}

/// Runs one complete acquisition: status line to loading, position lookup
/// under the configured deadline, reverse geocoding, then the success or
/// failure wrap-up.
///
/// Every visible effect goes through `tx` so the caller's terminal state
/// stays untouched. On failure the coordinate fields are cleared and the
/// status line carries the error; the alert is the caller's job.
pub async fn acquire_fix<S, R>(
    source: &S,
    resolver: &R,
    options: &FixOptions,
    tx: &mpsc::UnboundedSender<Event>,
) -> Result<LocationFix, LocationError>
where
    S: PositionSource,
    R: AddressResolver,
{
    // Capability check comes first; an unavailable source must never flash
    // the loading state.
    if !source.available() {
        return Err(report_failure(tx, LocationError::Unsupported));
    }

    let _ = tx.send(Event::Status(Some(StatusLine::new(
        StatusKind::Loading,
        "📍 Getting your location...",
    ))));

    let coords = match timeout(options.timeout, source.position(options)).await {
        Ok(Ok(coords)) => coords,
        Ok(Err(e)) => return Err(report_failure(tx, e)),
        Err(_) => return Err(report_failure(tx, LocationError::Timeout)),
    };

    let _ = tx.send(Event::Coordinates(Some((
        coords.latitude,
        coords.longitude,
    ))));

    let resolved = resolver.resolve(coords.latitude, coords.longitude).await;
    let status_text = match resolved {
        ResolvedAddress::Geocoded(_) => "✓ Location acquired",
        ResolvedAddress::Fallback(_) => "✓ Coordinates acquired",
    };
    let address = resolved.into_string();

    let _ = tx.send(Event::Address(address.clone()));
    let _ = tx.send(Event::Status(Some(StatusLine::new(
        StatusKind::Success,
        status_text,
    ))));

    info!(
        "Location fix acquired at ({}, {}): {}",
        coords.latitude, coords.longitude, address
    );
    Ok(LocationFix {
        latitude: coords.latitude,
        longitude: coords.longitude,
        address,
    })
}

fn report_failure(tx: &mpsc::UnboundedSender<Event>, err: LocationError) -> LocationError {
    warn!("Location acquisition failed: {}", err);
    let _ = tx.send(Event::Coordinates(None));
    let _ = tx.send(Event::Status(Some(StatusLine::new(
        StatusKind::Error,
        err.user_message(),
    ))));
    err
}
