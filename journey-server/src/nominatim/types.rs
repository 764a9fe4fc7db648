//! Nominatim reverse-geocoding response DTOs.
//!
//! These map directly to the `format=jsonv2` reverse endpoint. Nominatim
//! answers "nothing here" with a 200 and an `error` member instead of an
//! address, so every field is optional.

use std::collections::BTreeMap;

use serde::Deserialize;

use crate::domain::Address;

/// Response from `/reverse?format=jsonv2`.
#[derive(Debug, Clone, Deserialize)]
pub struct ReverseResponse {
    /// Set when no object was found at the position.
    pub error: Option<String>,

    pub place_id: Option<u64>,

    /// `node`, `way` or `relation`.
    pub osm_type: Option<String>,

    pub osm_id: Option<u64>,

    /// Latitude of the matched object, as a decimal string.
    pub lat: Option<String>,

    /// Longitude of the matched object, as a decimal string.
    pub lon: Option<String>,

    pub display_name: Option<String>,

    /// Address broken down by administrative level.
    #[serde(default)]
    pub address: BTreeMap<String, String>,
}

impl ReverseResponse {
    /// Convert to a domain address, `None` when nothing was found.
    pub fn into_address(self) -> Option<Address> {
        if self.error.is_some() {
            return None;
        }
        if self.display_name.is_none() && self.address.is_empty() {
            return None;
        }

        let mut address = Address::new(self.display_name.unwrap_or_default(), self.address);
        address.osm_object = self.osm_type.zip(self.osm_id);
        Some(address)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WESTMINSTER: &str = r#"{
        "place_id": 258920431,
        "licence": "Data © OpenStreetMap contributors, ODbL 1.0. http://osm.org/copyright",
        "osm_type": "way",
        "osm_id": 4256,
        "lat": "51.50740",
        "lon": "-0.12780",
        "category": "highway",
        "type": "primary",
        "place_rank": 26,
        "importance": 0.1,
        "addresstype": "road",
        "name": "Whitehall",
        "display_name": "Whitehall, St. James's, Westminster, London, Greater London, England, SW1A 2DX, United Kingdom",
        "address": {
            "road": "Whitehall",
            "quarter": "St. James's",
            "suburb": "Westminster",
            "city": "London",
            "state": "England",
            "postcode": "SW1A 2DX",
            "country": "United Kingdom",
            "country_code": "gb"
        },
        "boundingbox": ["51.5", "51.6", "-0.13", "-0.12"]
    }"#;

    #[test]
    fn parses_address() {
        let resp: ReverseResponse = serde_json::from_str(WESTMINSTER).unwrap();
        let address = resp.into_address().unwrap();

        assert_eq!(address.locality(), Some("Westminster"));
        assert!(address.display_name.starts_with("Whitehall"));
        assert_eq!(address.components.get("postcode").unwrap(), "SW1A 2DX");
        assert_eq!(address.osm_object, Some(("way".to_string(), 4256)));
    }

    #[test]
    fn error_body_is_no_address() {
        let resp: ReverseResponse =
            serde_json::from_str(r#"{"error":"Unable to geocode"}"#).unwrap();
        assert!(resp.into_address().is_none());
    }
}
