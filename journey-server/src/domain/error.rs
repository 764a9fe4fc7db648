//! Domain error types.
//!
//! These errors represent validation failures in the domain layer.
//! They are distinct from upstream API and registry errors.

/// Domain-level errors for coordinate validation.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DomainError {
    /// Latitude outside [-90, 90] or not finite
    #[error("latitude out of range: {0}")]
    LatitudeOutOfRange(f64),

    /// Longitude outside [-180, 180] or not finite
    #[error("longitude out of range: {0}")]
    LongitudeOutOfRange(f64),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = DomainError::LatitudeOutOfRange(91.5);
        assert_eq!(err.to_string(), "latitude out of range: 91.5");

        let err = DomainError::LongitudeOutOfRange(-181.0);
        assert_eq!(err.to_string(), "longitude out of range: -181");
    }
}
