//! Distance Matrix client error types.

/// Errors from the travel-time client.
#[derive(Debug, thiserror::Error)]
pub enum DistanceMatrixError {
    /// HTTP request failed (network error, timeout, etc.)
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Response body was not the expected JSON
    #[error("JSON parse error: {message}")]
    Json { message: String },

    /// HTTP or request-level failure reported by the API
    #[error("API error {status}: {message}")]
    Api { status: String, message: String },

    /// Key rejected (`REQUEST_DENIED`)
    #[error("request denied: {0}")]
    Denied(String),

    /// Quota exhausted (`OVER_QUERY_LIMIT` / `OVER_DAILY_LIMIT`)
    #[error("rate limited by Distance Matrix API")]
    RateLimited,

    /// Request succeeded but contained no element for the pair
    #[error("no result for the requested route")]
    EmptyResult,

    /// Client could not be built from the configuration
    #[error("invalid configuration: {0}")]
    Config(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = DistanceMatrixError::Denied("The provided API key is invalid.".into());
        assert_eq!(
            err.to_string(),
            "request denied: The provided API key is invalid."
        );

        let err = DistanceMatrixError::Api {
            status: "INVALID_REQUEST".into(),
            message: "missing destinations".into(),
        };
        assert_eq!(err.to_string(), "API error INVALID_REQUEST: missing destinations");

        let err = DistanceMatrixError::EmptyResult;
        assert_eq!(err.to_string(), "no result for the requested route");
    }
}
