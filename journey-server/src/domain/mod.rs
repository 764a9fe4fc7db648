//! Domain types for journey tracking.
//!
//! Coordinates are validated at construction time, so code that receives
//! them can trust their ranges. Result types are plain immutable values
//! built once per refresh cycle.

mod address;
mod coords;
mod error;
mod journey;
mod travel;

pub use address::{Address, LOCALITY_KEYS, UNKNOWN_LOCALITY};
pub use coords::{CoordKey, Coordinates, KEY_DECIMALS};
pub use error::DomainError;
pub use journey::JourneyData;
pub use travel::{DURATION, DURATION_IN_TRAFFIC, TravelTime};
