//! Seams for the two upstream lookups.
//!
//! The coordinator is generic over these traits so it can be tested with
//! in-memory providers that count calls and inject failures.

use std::future::Future;

use tracing::{debug, info, warn};

use crate::domain::{Address, Coordinates};
use crate::gmaps::{DistanceMatrixClient, DistanceMatrixError, MatrixElement};
use crate::nominatim::{NominatimClient, NominatimError};

/// Turns a position into an address.
pub trait ReverseGeocoder: Send + Sync + 'static {
    /// `Ok(None)` means the lookup worked but found nothing.
    fn reverse_geocode(
        &self,
        coords: Coordinates,
    ) -> impl Future<Output = Result<Option<Address>, NominatimError>> + Send;
}

/// Driving time between two positions under current traffic.
pub trait TravelTimeProvider: Send + Sync + 'static {
    fn travel_time(
        &self,
        origin: Coordinates,
        destination: Coordinates,
    ) -> impl Future<Output = Result<MatrixElement, DistanceMatrixError>> + Send;

    /// Validate credentials without side effects.
    fn test_credentials(&self) -> impl Future<Output = Result<bool, DistanceMatrixError>> + Send;
}

/// Whether `provider` accepts its credentials.
///
/// Run once at startup; a rejected key or an unreachable provider both count
/// as failure.
pub async fn check_credentials(provider: &impl TravelTimeProvider) -> bool {
    match provider.test_credentials().await {
        Ok(true) => {
            info!("Travel-time credentials accepted");
            true
        }
        Ok(false) => {
            warn!("Travel-time credentials rejected");
            false
        }
        Err(e) => {
            debug!(error = %e, "Credential check failed");
            false
        }
    }
}

impl ReverseGeocoder for NominatimClient {
    fn reverse_geocode(
        &self,
        coords: Coordinates,
    ) -> impl Future<Output = Result<Option<Address>, NominatimError>> + Send {
        self.reverse(coords)
    }
}

impl TravelTimeProvider for DistanceMatrixClient {
    fn travel_time(
        &self,
        origin: Coordinates,
        destination: Coordinates,
    ) -> impl Future<Output = Result<MatrixElement, DistanceMatrixError>> + Send {
        DistanceMatrixClient::travel_time(self, origin, destination)
    }

    fn test_credentials(&self) -> impl Future<Output = Result<bool, DistanceMatrixError>> + Send {
        DistanceMatrixClient::test_credentials(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    enum Credentials {
        Valid,
        Invalid,
        Unreachable,
    }

    impl TravelTimeProvider for Credentials {
        async fn travel_time(
            &self,
            _: Coordinates,
            _: Coordinates,
        ) -> Result<MatrixElement, DistanceMatrixError> {
            Err(DistanceMatrixError::RateLimited)
        }

        async fn test_credentials(&self) -> Result<bool, DistanceMatrixError> {
            match self {
                Credentials::Valid => Ok(true),
                Credentials::Invalid => Ok(false),
                Credentials::Unreachable => Err(DistanceMatrixError::Api {
                    status: "UNKNOWN_ERROR".to_string(),
                    message: "server error".to_string(),
                }),
            }
        }
    }

    #[tokio::test]
    async fn credentials_accepted() {
        assert!(check_credentials(&Credentials::Valid).await);
    }

    #[tokio::test]
    async fn credentials_rejected_or_unreachable() {
        assert!(!check_credentials(&Credentials::Invalid).await);
        assert!(!check_credentials(&Credentials::Unreachable).await);
    }
}
