//! Reverse-geocoded address records.

use std::collections::BTreeMap;

use serde::Serialize;

/// Administrative levels checked, in order, when picking a short place name.
pub const LOCALITY_KEYS: [&str; 6] = ["village", "suburb", "town", "city", "state", "country"];

/// Place name shown when no address is known.
pub const UNKNOWN_LOCALITY: &str = "Unknown";

/// An address returned by reverse geocoding.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Address {
    /// Full free-text address.
    pub display_name: String,

    /// Administrative level name to value (`road`, `suburb`, `city`, ...).
    pub components: BTreeMap<String, String>,

    /// OpenStreetMap object the address was taken from, e.g. `("way", 4256)`.
    pub osm_object: Option<(String, u64)>,
}

impl Address {
    pub fn new(display_name: impl Into<String>, components: BTreeMap<String, String>) -> Self {
        Self {
            display_name: display_name.into(),
            components,
            osm_object: None,
        }
    }

    /// The most specific of [`LOCALITY_KEYS`] present in this address.
    pub fn locality(&self) -> Option<&str> {
        LOCALITY_KEYS
            .iter()
            .find_map(|key| self.components.get(*key))
            .map(String::as_str)
    }
}
