//! OpenStreetMap Nominatim reverse-geocoding client.
//!
//! Turns a position into an [`Address`](crate::domain::Address). Results
//! for a fixed position are effectively static, which is what makes the
//! geocode cache in [`crate::cache`] worthwhile.

mod client;
mod error;
mod types;

pub use client::{NominatimClient, NominatimConfig, REVERSE_ZOOM};
pub use error::NominatimError;
pub use types::ReverseResponse;
