//! Nominatim HTTP client.
//!
//! Reverse-geocodes a position into an address. Nominatim's usage policy
//! asks for an identifying user agent and at most one request per second,
//! so requests go through a single-permit semaphore by default.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Semaphore;
use tracing::debug;

use crate::domain::{Address, Coordinates};

use super::error::NominatimError;
use super::types::ReverseResponse;

/// Default base URL for the public Nominatim instance.
const DEFAULT_BASE_URL: &str = "https://nominatim.openstreetmap.org";

/// Zoom level for reverse lookups: major streets and suburbs.
pub const REVERSE_ZOOM: u8 = 16;

/// Default request timeout.
const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Default maximum concurrent requests.
const DEFAULT_MAX_CONCURRENT: usize = 1;

/// Configuration for the Nominatim client.
#[derive(Debug, Clone)]
pub struct NominatimConfig {
    /// OpenStreetMap username, included in the user agent
    pub osm_username: String,
    /// Base URL for the API (defaults to the public instance)
    pub base_url: String,
    /// Maximum concurrent requests
    pub max_concurrent: usize,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl NominatimConfig {
    /// Create a new config for the given OSM username.
    pub fn new(osm_username: impl Into<String>) -> Self {
        Self {
            osm_username: osm_username.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            max_concurrent: DEFAULT_MAX_CONCURRENT,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }

    /// Set a custom base URL (for testing or a self-hosted instance).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Set maximum concurrent requests.
    pub fn with_max_concurrent(mut self, n: usize) -> Self {
        self.max_concurrent = n;
        self
    }

    /// Set request timeout.
    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    /// The user agent sent with every request.
    pub fn user_agent(&self) -> String {
        format!("Journey ({})", self.osm_username)
    }
}

/// Nominatim reverse-geocoding client.
#[derive(Debug, Clone)]
pub struct NominatimClient {
    http: reqwest::Client,
    base_url: String,
    semaphore: Arc<Semaphore>,
}

impl NominatimClient {
    /// Create a new client with the given configuration.
    pub fn new(config: NominatimConfig) -> Result<Self, NominatimError> {
        if config.max_concurrent == 0 {
            return Err(NominatimError::Config(
                "max_concurrent must be at least 1".to_string(),
            ));
        }

        let http = reqwest::Client::builder()
            .user_agent(config.user_agent())
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            semaphore: Arc::new(Semaphore::new(config.max_concurrent)),
        })
    }

    /// Look up the address at a position.
    ///
    /// Returns `Ok(None)` when Nominatim has no object at the position.
    pub async fn reverse(&self, coords: Coordinates) -> Result<Option<Address>, NominatimError> {
        let _permit = self
            .semaphore
            .acquire()
            .await
            .map_err(|_| NominatimError::Config("semaphore closed".to_string()))?;

        let url = format!("{}/reverse", self.base_url);
        debug!(%coords, "Reverse geocoding");

        let response = self
            .http
            .get(&url)
            .query(&[
                ("lat", coords.latitude().to_string()),
                ("lon", coords.longitude().to_string()),
                ("zoom", REVERSE_ZOOM.to_string()),
                ("format", "jsonv2".to_string()),
                ("addressdetails", "1".to_string()),
            ])
            .send()
            .await?;

        let status = response.status();

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(NominatimError::RateLimited);
        }

        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN
        {
            return Err(NominatimError::Unauthorized);
        }

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(NominatimError::Api {
                status: status.as_u16(),
                message: body,
            });
        }

        let body = response.text().await?;

        let parsed: ReverseResponse =
            serde_json::from_str(&body).map_err(|e| NominatimError::Json {
                message: e.to_string(),
            })?;

        Ok(parsed.into_address())
    }
}
