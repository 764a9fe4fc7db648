//! Nominatim client error types.

/// Errors from the reverse-geocoding client.
#[derive(Debug, thiserror::Error)]
pub enum NominatimError {
    /// HTTP request failed (network error, timeout, etc.)
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Response body was not the expected JSON
    #[error("JSON parse error: {message}")]
    Json { message: String },

    /// API returned an error status code
    #[error("API error {status}: {message}")]
    Api { status: u16, message: String },

    /// Usage policy limit hit (at most one request per second)
    #[error("rate limited by Nominatim")]
    RateLimited,

    /// Request blocked, usually a missing or banned user agent
    #[error("blocked by Nominatim (check the OSM username)")]
    Unauthorized,

    /// Client could not be built from the configuration
    #[error("invalid configuration: {0}")]
    Config(String),
}
