//! Google Maps Distance Matrix client.
//!
//! Provides driving travel time between two positions under current
//! traffic, plus a side-effect-free credential check used at setup time.

mod client;
mod error;
mod types;

pub use client::{DistanceMatrixClient, DistanceMatrixConfig};
pub use error::DistanceMatrixError;
pub use types::{DistanceMatrixResponse, MatrixElement, MatrixRow, TextValue};
