//! One refresh cycle: resolve, geocode, fetch travel times, build a snapshot.

use std::sync::Arc;

use chrono::Utc;
use futures::future::join_all;
use tracing::{debug, info, warn};

use crate::cache::CachedGeocoder;
use crate::domain::{Address, Coordinates, JourneyData, TravelTime};
use crate::location::{DirectoryError, LocationDirectory, LocationResolver};
use crate::remote::{ReverseGeocoder, TravelTimeProvider};

use super::route::Route;

/// A refresh cycle that failed as a whole.
///
/// Upstream lookup failures are not in here; they degrade a single field
/// of the snapshot instead.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RefreshError {
    #[error(transparent)]
    Directory(#[from] DirectoryError),

    #[error("refresh task failed: {0}")]
    Task(String),
}

/// Produces journey snapshots for one [`Route`].
///
/// Holds the collaborators a cycle needs and nothing mutable, so it can be
/// shared with the task running the cycle.
pub struct JourneyCoordinator<G, T, D> {
    route: Route,
    geocoder: Arc<CachedGeocoder<G>>,
    travel: Arc<T>,
    resolver: LocationResolver<D>,
}

impl<G, T, D> JourneyCoordinator<G, T, D>
where
    G: ReverseGeocoder,
    T: TravelTimeProvider,
    D: LocationDirectory,
{
    pub fn new(
        route: Route,
        geocoder: Arc<CachedGeocoder<G>>,
        travel: Arc<T>,
        resolver: LocationResolver<D>,
    ) -> Self {
        Self {
            route,
            geocoder,
            travel,
            resolver,
        }
    }

    pub fn route(&self) -> &Route {
        &self.route
    }

    pub fn resolver(&self) -> &LocationResolver<D> {
        &self.resolver
    }

    /// Run one cycle.
    ///
    /// References that cannot be resolved and upstream failures leave gaps
    /// in the snapshot. Only an unreadable directory fails the cycle.
    pub async fn refresh(&self) -> Result<JourneyData, RefreshError> {
        let fetched_at = Utc::now();

        let origin = self.resolver.resolve(&self.route.origin)?;
        let origin = match origin {
            Some(resolved) => Some(resolved.coordinates),
            None => {
                info!(origin = %self.route.origin, "Origin not located, skipping address");
                None
            }
        };

        let mut destinations = Vec::with_capacity(self.route.destinations.len());
        for reference in &self.route.destinations {
            let destination = match self.resolver.resolve(reference)? {
                Some(resolved) => (resolved.name, Some(resolved.coordinates)),
                None => (self.resolver.display_name(reference)?, None),
            };
            destinations.push(destination);
        }

        let address = self.origin_address(origin);
        let legs = join_all(
            destinations
                .into_iter()
                .map(|(label, destination)| self.leg(origin, label, destination)),
        );
        let (origin_address, travel_times) = tokio::join!(address, legs);

        debug!(
            legs = travel_times.len(),
            available = travel_times.iter().filter(|t| t.is_available()).count(),
            "Refresh complete"
        );

        Ok(JourneyData {
            origin,
            origin_address,
            travel_times,
            fetched_at,
        })
    }

    async fn origin_address(&self, origin: Option<Coordinates>) -> Option<Arc<Address>> {
        self.geocoder.address(origin?).await
    }

    async fn leg(
        &self,
        origin: Option<Coordinates>,
        label: String,
        destination: Option<Coordinates>,
    ) -> TravelTime {
        let (Some(origin), Some(destination)) = (origin, destination) else {
            debug!(destination = %label, "Leg has no endpoints, skipping lookup");
            return TravelTime::unavailable(label);
        };

        if origin == destination {
            debug!(destination = %label, "Already at destination");
            return TravelTime::zero(label);
        }

        match self.travel.travel_time(origin, destination).await {
            Ok(element) => TravelTime::new(label, element.values()),
            Err(e) => {
                warn!(destination = %label, error = %e, "Failed to fetch travel time");
                TravelTime::unavailable(label)
            }
        }
    }
}
