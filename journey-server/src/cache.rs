//! Caching layer for reverse-geocoding results.
//!
//! Addresses for a fixed position are effectively static, so entries never
//! expire; they leave only under capacity pressure. Positions are rounded
//! to four decimal places (about 11 m) before lookup, which maps GPS jitter
//! around a parked device onto one entry.
//!
//! Eviction is strict least-recently-used: both lookups and inserts count as
//! a use, and inserting past capacity evicts exactly the entry that was used
//! longest ago.

use std::sync::Arc;

use moka::policy::EvictionPolicy;
use moka::sync::Cache as MokaCache;
use tracing::{debug, warn};

use crate::domain::{Address, CoordKey, Coordinates};
use crate::remote::ReverseGeocoder;

/// Default number of cached positions.
pub const DEFAULT_CAPACITY: u64 = 256;

/// Cached lookup result. `None` records that the position has no address.
pub type AddressEntry = Option<Arc<Address>>;

/// Configuration for the geocode cache.
#[derive(Debug, Clone)]
pub struct GeocodeCacheConfig {
    /// Maximum number of cached positions.
    pub max_capacity: u64,
}

impl Default for GeocodeCacheConfig {
    fn default() -> Self {
        Self {
            max_capacity: DEFAULT_CAPACITY,
        }
    }
}

/// Bounded LRU map from rounded position to address.
pub struct GeocodeCache {
    entries: MokaCache<CoordKey, AddressEntry>,
    max_capacity: u64,
}

impl GeocodeCache {
    /// Create a new cache with the given configuration.
    pub fn new(config: &GeocodeCacheConfig) -> Self {
        let entries = MokaCache::builder()
            .max_capacity(config.max_capacity)
            .eviction_policy(EvictionPolicy::lru())
            .build();

        Self {
            entries,
            max_capacity: config.max_capacity,
        }
    }

    /// Look up a position.
    ///
    /// The outer `Option` is hit or miss; the inner one is the cached result.
    pub fn get(&self, coords: Coordinates) -> Option<AddressEntry> {
        let hit = self.entries.get(&coords.key());
        // Apply the recorded read now so recency order is exact.
        self.entries.run_pending_tasks();
        hit
    }

    /// Store the result for a position, evicting the least recently used
    /// entry if the cache is full.
    pub fn put(&self, coords: Coordinates, entry: AddressEntry) {
        self.entries.insert(coords.key(), entry);
        self.entries.run_pending_tasks();
    }

    /// Whether a position is cached, without counting as a use.
    pub fn contains(&self, coords: Coordinates) -> bool {
        self.entries.contains_key(&coords.key())
    }

    /// Number of cached positions.
    pub fn entry_count(&self) -> u64 {
        self.entries.entry_count()
    }

    pub fn max_capacity(&self) -> u64 {
        self.max_capacity
    }

    /// Invalidate all cached entries.
    pub fn invalidate_all(&self) {
        self.entries.invalidate_all();
        self.entries.run_pending_tasks();
    }
}

/// Reverse geocoder with caching.
///
/// Wraps any [`ReverseGeocoder`]. Upstream failures are logged and reported
/// as "no address"; they are never cached, so the next refresh retries.
pub struct CachedGeocoder<G> {
    geocoder: G,
    cache: GeocodeCache,
}

impl<G: ReverseGeocoder> CachedGeocoder<G> {
    /// Create a new cached geocoder.
    pub fn new(geocoder: G, cache_config: &GeocodeCacheConfig) -> Self {
        Self {
            geocoder,
            cache: GeocodeCache::new(cache_config),
        }
    }

    /// Get the address at a position, using the cache if possible.
    pub async fn address(&self, coords: Coordinates) -> Option<Arc<Address>> {
        if let Some(cached) = self.cache.get(coords) {
            debug!(key = %coords.key(), "Geocode cache hit");
            return cached;
        }

        match self.geocoder.reverse_geocode(coords).await {
            Ok(address) => {
                let entry = address.map(Arc::new);
                if entry.is_none() {
                    debug!(key = %coords.key(), "No address at position");
                }
                self.cache.put(coords, entry.clone());
                entry
            }
            Err(e) => {
                warn!(key = %coords.key(), error = %e, "Failed to perform reverse geocoding");
                None
            }
        }
    }

    /// Access the underlying geocoder for operations that bypass the cache.
    pub fn geocoder(&self) -> &G {
        &self.geocoder
    }

    /// Get cache statistics.
    pub fn cache_entry_count(&self) -> u64 {
        self.cache.entry_count()
    }

    /// Invalidate all cached entries.
    pub fn invalidate_cache(&self) {
        self.cache.invalidate_all();
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;
    use std::sync::Mutex;

    use super::*;
    use crate::nominatim::NominatimError;

    fn coords(lat: f64, lon: f64) -> Coordinates {
        Coordinates::new(lat, lon).unwrap()
    }

    fn address(name: &str) -> AddressEntry {
        let components = BTreeMap::from([("suburb".to_string(), name.to_string())]);
        Some(Arc::new(Address::new(name, components)))
    }

    fn small_cache(capacity: u64) -> GeocodeCache {
        GeocodeCache::new(&GeocodeCacheConfig {
            max_capacity: capacity,
        })
    }

    /// Geocoder that answers from a fixed script and counts calls.
    struct ScriptedGeocoder {
        fail: bool,
        found: bool,
        calls: Mutex<usize>,
    }

    impl ScriptedGeocoder {
        fn new(found: bool, fail: bool) -> Self {
            Self {
                fail,
                found,
                calls: Mutex::new(0),
            }
        }

        fn call_count(&self) -> usize {
            *self.calls.lock().unwrap()
        }
    }

    impl ReverseGeocoder for ScriptedGeocoder {
        async fn reverse_geocode(
            &self,
            coords: Coordinates,
        ) -> Result<Option<Address>, NominatimError> {
            *self.calls.lock().unwrap() += 1;
            if self.fail {
                return Err(NominatimError::RateLimited);
            }
            if !self.found {
                return Ok(None);
            }
            Ok(Some(Address::new(coords.to_string(), BTreeMap::new())))
        }
    }

    #[test]
    fn default_config() {
        let config = GeocodeCacheConfig::default();
        assert_eq!(config.max_capacity, 256);

        let cache = GeocodeCache::new(&config);
        assert_eq!(cache.entry_count(), 0);
        assert_eq!(cache.max_capacity(), 256);
    }

    #[test]
    fn rounded_positions_share_an_entry() {
        let cache = small_cache(4);
        cache.put(coords(51.50741, -0.12779), address("Westminster"));

        let hit = cache.get(coords(51.50739, -0.12781));
        assert_eq!(hit, Some(address("Westminster")));
        assert_eq!(cache.entry_count(), 1);
    }

    #[test]
    fn miss_is_distinct_from_cached_nothing() {
        let cache = small_cache(4);
        assert_eq!(cache.get(coords(10.0, 10.0)), None);

        cache.put(coords(10.0, 10.0), None);
        assert_eq!(cache.get(coords(10.0, 10.0)), Some(None));
    }

    #[test]
    fn never_exceeds_capacity() {
        let cache = small_cache(3);
        for i in 0..10 {
            cache.put(coords(f64::from(i), 0.0), address("x"));
            assert!(cache.entry_count() <= 3);
        }
        assert_eq!(cache.entry_count(), 3);
    }

    #[test]
    fn evicts_least_recently_inserted() {
        let cache = small_cache(3);
        cache.put(coords(1.0, 0.0), address("a"));
        cache.put(coords(2.0, 0.0), address("b"));
        cache.put(coords(3.0, 0.0), address("c"));

        cache.put(coords(4.0, 0.0), address("d"));

        assert!(!cache.contains(coords(1.0, 0.0)));
        assert!(cache.contains(coords(2.0, 0.0)));
        assert!(cache.contains(coords(3.0, 0.0)));
        assert!(cache.contains(coords(4.0, 0.0)));
    }

    #[test]
    fn get_refreshes_recency() {
        let cache = small_cache(3);
        cache.put(coords(1.0, 0.0), address("a"));
        cache.put(coords(2.0, 0.0), address("b"));
        cache.put(coords(3.0, 0.0), address("c"));

        // Touch the oldest entry; "b" becomes least recently used.
        assert!(cache.get(coords(1.0, 0.0)).is_some());
        cache.put(coords(4.0, 0.0), address("d"));

        assert!(cache.contains(coords(1.0, 0.0)));
        assert!(!cache.contains(coords(2.0, 0.0)));
        assert_eq!(cache.entry_count(), 3);
    }

    #[test]
    fn put_refreshes_recency() {
        let cache = small_cache(2);
        cache.put(coords(1.0, 0.0), address("a"));
        cache.put(coords(2.0, 0.0), address("b"));
        cache.put(coords(1.0, 0.0), address("a2"));

        cache.put(coords(3.0, 0.0), address("c"));

        assert_eq!(cache.get(coords(1.0, 0.0)), Some(address("a2")));
        assert!(!cache.contains(coords(2.0, 0.0)));
    }

    #[test]
    fn invalidate_all_empties() {
        let cache = small_cache(4);
        cache.put(coords(1.0, 0.0), address("a"));
        cache.invalidate_all();
        assert_eq!(cache.entry_count(), 0);
        assert_eq!(cache.get(coords(1.0, 0.0)), None);
    }

    #[tokio::test]
    async fn second_lookup_served_from_cache() {
        let geocoder = CachedGeocoder::new(
            ScriptedGeocoder::new(true, false),
            &GeocodeCacheConfig::default(),
        );

        let first = geocoder.address(coords(51.5074, -0.1278)).await;
        let second = geocoder.address(coords(51.50741, -0.12781)).await;

        assert!(first.is_some());
        assert_eq!(first, second);
        assert_eq!(geocoder.geocoder().call_count(), 1);
        assert_eq!(geocoder.cache_entry_count(), 1);
    }

    #[tokio::test]
    async fn no_address_is_cached() {
        let geocoder = CachedGeocoder::new(
            ScriptedGeocoder::new(false, false),
            &GeocodeCacheConfig::default(),
        );

        assert!(geocoder.address(coords(0.0, -30.0)).await.is_none());
        assert!(geocoder.address(coords(0.0, -30.0)).await.is_none());
        assert_eq!(geocoder.geocoder().call_count(), 1);
    }

    #[tokio::test]
    async fn failures_are_not_cached() {
        let geocoder = CachedGeocoder::new(
            ScriptedGeocoder::new(true, true),
            &GeocodeCacheConfig::default(),
        );

        assert!(geocoder.address(coords(1.0, 1.0)).await.is_none());
        assert!(geocoder.address(coords(1.0, 1.0)).await.is_none());
        assert_eq!(geocoder.geocoder().call_count(), 2);
        assert_eq!(geocoder.cache_entry_count(), 0);
    }

    #[tokio::test]
    async fn invalidate_forces_new_lookup() {
        let geocoder = CachedGeocoder::new(
            ScriptedGeocoder::new(true, false),
            &GeocodeCacheConfig::default(),
        );

        geocoder.address(coords(1.0, 1.0)).await;
        geocoder.invalidate_cache();
        geocoder.address(coords(1.0, 1.0)).await;

        assert_eq!(geocoder.geocoder().call_count(), 2);
    }
}
