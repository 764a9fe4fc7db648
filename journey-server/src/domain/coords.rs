//! Geographic coordinates and their rounded cache keys.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::error::DomainError;

/// Decimal places kept in a [`CoordKey`].
///
/// Four places is roughly 11 metres at the equator; two positions inside the
/// same cell are treated as the same address.
pub const KEY_DECIMALS: i32 = 4;

const KEY_SCALE: f64 = 10_000.0;

/// A WGS84 position in decimal degrees.
///
/// Latitude is in [-90, 90] and longitude in [-180, 180]. Both are finite.
///
/// # Examples
///
/// ```
/// use journey_server::domain::Coordinates;
///
/// let london = Coordinates::new(51.5074, -0.1278).unwrap();
/// assert_eq!(london.latitude(), 51.5074);
///
/// assert!(Coordinates::new(95.0, 0.0).is_err());
/// assert!(Coordinates::new(0.0, f64::NAN).is_err());
/// ```
#[derive(Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    latitude: f64,
    longitude: f64,
}

impl Coordinates {
    /// Create validated coordinates.
    pub fn new(latitude: f64, longitude: f64) -> Result<Self, DomainError> {
        if !latitude.is_finite() || !(-90.0..=90.0).contains(&latitude) {
            return Err(DomainError::LatitudeOutOfRange(latitude));
        }
        if !longitude.is_finite() || !(-180.0..=180.0).contains(&longitude) {
            return Err(DomainError::LongitudeOutOfRange(longitude));
        }
        Ok(Self {
            latitude,
            longitude,
        })
    }

    pub fn latitude(&self) -> f64 {
        self.latitude
    }

    pub fn longitude(&self) -> f64 {
        self.longitude
    }

    /// The rounded key used for geocode caching.
    pub fn key(&self) -> CoordKey {
        CoordKey::from(*self)
    }
}

impl fmt::Debug for Coordinates {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Coordinates({}, {})", self.latitude, self.longitude)
    }
}

/// `lat,lon`, the form both upstream APIs accept.
impl fmt::Display for Coordinates {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.latitude, self.longitude)
    }
}

/// Coordinates rounded to [`KEY_DECIMALS`] places, stored as scaled integers
/// so they can be hashed and compared exactly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CoordKey {
    lat_e4: i32,
    lon_e4: i32,
}

impl CoordKey {
    pub fn latitude(&self) -> f64 {
        f64::from(self.lat_e4) / KEY_SCALE
    }

    pub fn longitude(&self) -> f64 {
        f64::from(self.lon_e4) / KEY_SCALE
    }
}

impl From<Coordinates> for CoordKey {
    fn from(coords: Coordinates) -> Self {
        // Validated ranges keep the scaled values well inside i32.
        Self {
            lat_e4: (coords.latitude * KEY_SCALE).round() as i32,
            lon_e4: (coords.longitude * KEY_SCALE).round() as i32,
        }
    }
}

impl fmt::Display for CoordKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:.*},{:.*}",
            KEY_DECIMALS as usize,
            self.latitude(),
            KEY_DECIMALS as usize,
            self.longitude()
        )
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn key_matches_four_decimal_rounding(
            lat in -90.0f64..=90.0,
            lon in -180.0f64..=180.0,
        ) {
            let key = Coordinates::new(lat, lon).unwrap().key();
            prop_assert!((key.latitude() - lat).abs() <= 0.00005 + 1e-9);
            prop_assert!((key.longitude() - lon).abs() <= 0.00005 + 1e-9);
        }

        #[test]
        fn key_is_idempotent(
            lat in -90.0f64..=90.0,
            lon in -180.0f64..=180.0,
        ) {
            let key = Coordinates::new(lat, lon).unwrap().key();
            let again = Coordinates::new(key.latitude(), key.longitude()).unwrap().key();
            prop_assert_eq!(key, again);
        }
    }
}
