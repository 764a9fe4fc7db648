//! Runtime configuration.
//!
//! Settings come from environment variables; everything except the origin
//! reference and OSM username has a default.

use std::net::SocketAddr;
use std::time::Duration;

use crate::cache::GeocodeCacheConfig;

/// Default time between scheduled refreshes (5 minutes).
pub const DEFAULT_SCAN_INTERVAL: Duration = Duration::from_secs(5 * 60);

/// Default quiet period for debounced refreshes (30 minutes).
pub const DEFAULT_DEBOUNCE_COOLDOWN: Duration = Duration::from_secs(1800);

/// Default timeout for each upstream request, in seconds.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;

const DEFAULT_LISTEN: &str = "127.0.0.1:3000";

const DEFAULT_NAME: &str = "Journey";

/// Errors from reading the configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("missing required setting {0}")]
    Missing(&'static str),

    #[error("invalid value for {key}: {value:?}")]
    Invalid { key: &'static str, value: String },
}

/// Timing parameters for the update coordinator.
#[derive(Debug, Clone, PartialEq)]
pub struct CoordinatorConfig {
    /// Time between scheduled refreshes, measured from the end of the
    /// previous refresh.
    pub scan_interval: Duration,

    /// Quiet period that collapses repeated debounced requests.
    pub debounce_cooldown: Duration,

    /// Whether the first debounced request in an idle window runs at once.
    pub debounce_immediate: bool,
}

impl CoordinatorConfig {
    pub fn new(scan_interval: Duration, debounce_cooldown: Duration) -> Self {
        Self {
            scan_interval,
            debounce_cooldown,
            debounce_immediate: true,
        }
    }

    /// Set whether the first debounced request runs at once.
    pub fn with_immediate(mut self, immediate: bool) -> Self {
        self.debounce_immediate = immediate;
        self
    }
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self::new(DEFAULT_SCAN_INTERVAL, DEFAULT_DEBOUNCE_COOLDOWN)
    }
}

/// Everything the binary needs to start.
#[derive(Debug, Clone)]
pub struct JourneyConfig {
    /// Display name prefixed to sensor names.
    pub name: String,

    /// Reference for the moving origin, e.g. `person.alex`.
    pub origin: String,

    /// Destination references, in display order. May be empty for an
    /// address-only setup.
    pub destinations: Vec<String>,

    pub osm_username: String,

    /// Google Maps API key; required when there are destinations.
    pub gmaps_token: Option<String>,

    pub listen: SocketAddr,

    pub request_timeout_secs: u64,

    /// Validate the Maps key at startup and exit on failure.
    pub check_credentials: bool,

    pub coordinator: CoordinatorConfig,

    pub cache: GeocodeCacheConfig,
}

impl JourneyConfig {
    /// Read the configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read the configuration through `lookup`, which maps a variable name
    /// to its value.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let origin = get("JOURNEY_ORIGIN").ok_or(ConfigError::Missing("JOURNEY_ORIGIN"))?;
        let osm_username = get("OSM_USERNAME").ok_or(ConfigError::Missing("OSM_USERNAME"))?;

        let destinations: Vec<String> = get("JOURNEY_DESTINATIONS")
            .map(|v| {
                v.split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();

        let gmaps_token = get("GMAPS_TOKEN");
        if !destinations.is_empty() && gmaps_token.is_none() {
            return Err(ConfigError::Missing("GMAPS_TOKEN"));
        }

        let listen_raw = get("JOURNEY_LISTEN").unwrap_or_else(|| DEFAULT_LISTEN.to_string());
        let listen = listen_raw.parse().map_err(|_| ConfigError::Invalid {
            key: "JOURNEY_LISTEN",
            value: listen_raw.clone(),
        })?;

        let mut coordinator = CoordinatorConfig::default();
        if let Some(secs) = parse_secs(&get, "JOURNEY_SCAN_INTERVAL_SECS")? {
            coordinator.scan_interval = secs;
        }
        if let Some(secs) = parse_secs(&get, "JOURNEY_COOLDOWN_SECS")? {
            coordinator.debounce_cooldown = secs;
        }

        let mut cache = GeocodeCacheConfig::default();
        if let Some(raw) = get("JOURNEY_CACHE_CAPACITY") {
            cache.max_capacity = parse_positive(&raw, "JOURNEY_CACHE_CAPACITY")?;
        }

        let request_timeout_secs = match get("JOURNEY_REQUEST_TIMEOUT_SECS") {
            Some(raw) => parse_positive(&raw, "JOURNEY_REQUEST_TIMEOUT_SECS")?,
            None => DEFAULT_REQUEST_TIMEOUT_SECS,
        };

        let check_credentials = match get("JOURNEY_CHECK_CREDENTIALS") {
            Some(raw) => parse_bool(&raw, "JOURNEY_CHECK_CREDENTIALS")?,
            None => false,
        };

        Ok(Self {
            name: get("JOURNEY_NAME").unwrap_or_else(|| DEFAULT_NAME.to_string()),
            origin,
            destinations,
            osm_username,
            gmaps_token,
            listen,
            request_timeout_secs,
            check_credentials,
            coordinator,
            cache,
        })
    }
}

fn parse_secs(
    get: &impl Fn(&str) -> Option<String>,
    key: &'static str,
) -> Result<Option<Duration>, ConfigError> {
    get(key)
        .map(|raw| parse_positive(&raw, key).map(Duration::from_secs))
        .transpose()
}

fn parse_positive(raw: &str, key: &'static str) -> Result<u64, ConfigError> {
    match raw.trim().parse::<u64>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(ConfigError::Invalid {
            key,
            value: raw.to_string(),
        }),
    }
}

fn parse_bool(raw: &str, key: &'static str) -> Result<bool, ConfigError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::Invalid {
            key,
            value: raw.to_string(),
        }),
    }
}
