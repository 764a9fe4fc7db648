//! Web layer for the journey server.
//!
//! Exposes sensor values, refresh triggers, and an endpoint through which
//! the host pushes location states.

mod dto;
mod routes;
mod state;

pub use dto::*;
pub use routes::{AppError, create_router};
pub use state::AppState;
