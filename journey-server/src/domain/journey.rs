//! The snapshot published by one refresh cycle.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use super::address::{Address, UNKNOWN_LOCALITY};
use super::coords::Coordinates;
use super::travel::TravelTime;

/// Everything one refresh cycle learned.
///
/// Immutable once built; a later cycle replaces it wholesale rather than
/// merging into it.
#[derive(Debug, Clone, PartialEq)]
pub struct JourneyData {
    /// Where the origin was resolved to, if anywhere.
    pub origin: Option<Coordinates>,

    /// Reverse-geocoded origin address.
    pub origin_address: Option<Arc<Address>>,

    /// One entry per configured destination, in configuration order.
    pub travel_times: Vec<TravelTime>,

    /// When the cycle that produced this snapshot started.
    pub fetched_at: DateTime<Utc>,
}

impl JourneyData {
    /// Short place name for the origin, `"Unknown"` when there is none.
    pub fn origin_locality(&self) -> &str {
        self.origin_address
            .as_deref()
            .and_then(Address::locality)
            .unwrap_or(UNKNOWN_LOCALITY)
    }

    /// Travel time for the destination at `index`.
    pub fn travel_time(&self, index: usize) -> Option<&TravelTime> {
        self.travel_times.get(index)
    }
}
