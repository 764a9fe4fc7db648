//! Location references and their resolution to positions.
//!
//! The host's state registry is reached only through the
//! [`LocationDirectory`] trait, so the resolver and coordinator never touch
//! global state.

mod directory;
mod resolver;

pub use directory::{
    ATTR_FRIENDLY_NAME, ATTR_LATITUDE, ATTR_LONGITUDE, DirectoryError, InMemoryDirectory,
    LocationDirectory, StateChanged, StateRecord,
};
pub use resolver::{LocationResolver, ResolvedLocation, ZONE_PREFIX, is_zone};
