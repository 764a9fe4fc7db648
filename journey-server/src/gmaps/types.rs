//! Google Distance Matrix response DTOs.

use std::collections::BTreeMap;

use serde::Deserialize;

use crate::domain::{DURATION, DURATION_IN_TRAFFIC};

/// Top-level `status` for a successful request.
pub const STATUS_OK: &str = "OK";

/// Response from `/distancematrix/json`.
#[derive(Debug, Clone, Deserialize)]
pub struct DistanceMatrixResponse {
    /// Request-level status (`OK`, `REQUEST_DENIED`, `OVER_QUERY_LIMIT`, ...).
    pub status: String,

    pub error_message: Option<String>,

    #[serde(default)]
    pub origin_addresses: Vec<String>,

    #[serde(default)]
    pub destination_addresses: Vec<String>,

    #[serde(default)]
    pub rows: Vec<MatrixRow>,
}

impl DistanceMatrixResponse {
    /// The single element of a one-origin, one-destination query.
    pub fn into_first_element(self) -> Option<MatrixElement> {
        self.rows.into_iter().next()?.elements.into_iter().next()
    }
}

/// One row per origin.
#[derive(Debug, Clone, Deserialize)]
pub struct MatrixRow {
    #[serde(default)]
    pub elements: Vec<MatrixElement>,
}

/// One origin-destination pair.
///
/// `duration_in_traffic` is only present when a departure time was given
/// and traffic data exists for the route.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct MatrixElement {
    /// Element-level status (`OK`, `NOT_FOUND`, `ZERO_RESULTS`, ...).
    pub status: String,

    pub duration: Option<TextValue>,

    pub duration_in_traffic: Option<TextValue>,

    pub distance: Option<TextValue>,
}

impl MatrixElement {
    /// Flatten to `field -> value`, dropping the status and any field the
    /// upstream did not return.
    pub fn values(&self) -> BTreeMap<String, f64> {
        [
            (DURATION, &self.duration),
            (DURATION_IN_TRAFFIC, &self.duration_in_traffic),
            ("distance", &self.distance),
        ]
        .into_iter()
        .filter_map(|(name, field)| field.as_ref().map(|f| (name.to_string(), f.value)))
        .collect()
    }
}

/// A value with its human-readable rendering, e.g. `{"text": "21 mins", "value": 1260}`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TextValue {
    pub text: String,
    pub value: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    const CITY_RUN: &str = r#"{
        "destination_addresses": ["Canary Wharf, London E14, UK"],
        "origin_addresses": ["Whitehall, London SW1A 2DX, UK"],
        "rows": [{
            "elements": [{
                "distance": {"text": "9.1 km", "value": 9123},
                "duration": {"text": "24 mins", "value": 1440},
                "duration_in_traffic": {"text": "31 mins", "value": 1860},
                "status": "OK"
            }]
        }],
        "status": "OK"
    }"#;

    #[test]
    fn parses_element() {
        let resp: DistanceMatrixResponse = serde_json::from_str(CITY_RUN).unwrap();
        assert_eq!(resp.status, STATUS_OK);

        let element = resp.into_first_element().unwrap();
        assert_eq!(element.status, "OK");

        let values = element.values();
        assert_eq!(values.get("duration"), Some(&1440.0));
        assert_eq!(values.get("duration_in_traffic"), Some(&1860.0));
        assert_eq!(values.get("distance"), Some(&9123.0));
        assert!(!values.contains_key("status"));
    }

    #[test]
    fn not_found_element_has_no_values() {
        let json = r#"{
            "destination_addresses": [""],
            "origin_addresses": [""],
            "rows": [{"elements": [{"status": "ZERO_RESULTS"}]}],
            "status": "OK"
        }"#;
        let resp: DistanceMatrixResponse = serde_json::from_str(json).unwrap();
        let element = resp.into_first_element().unwrap();
        assert!(element.values().is_empty());
    }

    #[test]
    fn denied_request_has_no_rows() {
        let json = r#"{
            "destination_addresses": [],
            "error_message": "The provided API key is invalid.",
            "origin_addresses": [],
            "rows": [],
            "status": "REQUEST_DENIED"
        }"#;
        let resp: DistanceMatrixResponse = serde_json::from_str(json).unwrap();
        assert_eq!(resp.status, "REQUEST_DENIED");
        assert!(resp.into_first_element().is_none());
    }
}
