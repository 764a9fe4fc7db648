//! Google Distance Matrix HTTP client.
//!
//! Queries driving duration between two positions with a departure time of
//! "now", so the response includes current traffic conditions.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Semaphore;
use tracing::{debug, error};

use crate::domain::Coordinates;

use super::error::DistanceMatrixError;
use super::types::{DistanceMatrixResponse, MatrixElement, STATUS_OK};

/// Default base URL for the Maps web services.
const DEFAULT_BASE_URL: &str = "https://maps.googleapis.com/maps/api";

/// Default request timeout.
const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Default maximum concurrent requests.
const DEFAULT_MAX_CONCURRENT: usize = 4;

/// Travel mode for every query.
const TRAVEL_MODE: &str = "driving";

/// Fixed route used to validate credentials (Greenwich to Harlow).
const CREDENTIAL_CHECK_ROUTE: ((f64, f64), (f64, f64)) = ((51.478, 0.0), (51.748, 0.02));

/// Configuration for the Distance Matrix client.
#[derive(Debug, Clone)]
pub struct DistanceMatrixConfig {
    /// Google Maps API key
    pub api_key: String,
    /// Base URL for the API (defaults to production Google Maps)
    pub base_url: String,
    /// Maximum concurrent requests
    pub max_concurrent: usize,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl DistanceMatrixConfig {
    /// Create a new config with the given API key.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            max_concurrent: DEFAULT_MAX_CONCURRENT,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }

    /// Set a custom base URL (for testing).
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
}

/// Distance Matrix API client.
///
/// Uses a semaphore to limit concurrent requests when several destinations
/// are refreshed at once.
#[derive(Debug, Clone)]
pub struct DistanceMatrixClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    semaphore: Arc<Semaphore>,
}

impl DistanceMatrixClient {
    /// Create a new client with the given configuration.
    pub fn new(config: DistanceMatrixConfig) -> Result<Self, DistanceMatrixError> {
        if config.max_concurrent == 0 {
            return Err(DistanceMatrixError::Config(
                "max_concurrent must be at least 1".to_string(),
            ));
        }

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key,
            semaphore: Arc::new(Semaphore::new(config.max_concurrent)),
        })
    }

    /// Get the driving time from `origin` to `destination`, leaving now.
    pub async fn travel_time(
        &self,
        origin: Coordinates,
        destination: Coordinates,
    ) -> Result<MatrixElement, DistanceMatrixError> {
        let response = self.query(origin, destination, true).await?;
        response
            .into_first_element()
            .ok_or(DistanceMatrixError::EmptyResult)
    }

    /// Check the API key with one query over a fixed route.
    ///
    /// Any upstream error is returned to the caller unchanged.
    pub async fn test_credentials(&self) -> Result<bool, DistanceMatrixError> {
        let ((o_lat, o_lon), (d_lat, d_lon)) = CREDENTIAL_CHECK_ROUTE;
        let origin = Coordinates::new(o_lat, o_lon)
            .map_err(|e| DistanceMatrixError::Config(e.to_string()))?;
        let destination = Coordinates::new(d_lat, d_lon)
            .map_err(|e| DistanceMatrixError::Config(e.to_string()))?;

        match self.query(origin, destination, false).await {
            Ok(_) => Ok(true),
            Err(e) => {
                error!(error = %e, "Failed to validate credentials");
                Err(e)
            }
        }
    }

    async fn query(
        &self,
        origin: Coordinates,
        destination: Coordinates,
        depart_now: bool,
    ) -> Result<DistanceMatrixResponse, DistanceMatrixError> {
        let _permit = self
            .semaphore
            .acquire()
            .await
            .map_err(|_| DistanceMatrixError::Config("semaphore closed".to_string()))?;

        let url = format!("{}/distancematrix/json", self.base_url);
        debug!(%origin, %destination, "Querying distance matrix");

        let mut params = vec![
            ("origins", origin.to_string()),
            ("destinations", destination.to_string()),
            ("mode", TRAVEL_MODE.to_string()),
            ("key", self.api_key.clone()),
        ];
        if depart_now {
            params.push(("departure_time", "now".to_string()));
        }

        let response = self.http.get(&url).query(&params).send().await?;

        let status = response.status();

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(DistanceMatrixError::RateLimited);
        }

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(DistanceMatrixError::Api {
                status: status.as_u16().to_string(),
                message: body,
            });
        }

        let body = response.text().await?;

        let parsed: DistanceMatrixResponse =
            serde_json::from_str(&body).map_err(|e| DistanceMatrixError::Json {
                message: e.to_string(),
            })?;

        check_status(parsed)
    }
}

/// Map a request-level status onto an error.
fn check_status(
    response: DistanceMatrixResponse,
) -> Result<DistanceMatrixResponse, DistanceMatrixError> {
    let message = response.error_message.clone().unwrap_or_default();
    match response.status.as_str() {
        STATUS_OK => Ok(response),
        "REQUEST_DENIED" => Err(DistanceMatrixError::Denied(message)),
        "OVER_QUERY_LIMIT" | "OVER_DAILY_LIMIT" => Err(DistanceMatrixError::RateLimited),
        other => Err(DistanceMatrixError::Api {
            status: other.to_string(),
            message,
        }),
    }
}
