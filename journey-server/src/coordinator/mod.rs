//! Refresh coordination.
//!
//! Decides when to recompute the journey snapshot and makes sure only one
//! computation runs at a time. Triggers are the fixed scan interval, changes
//! to the tracked references, and explicit requests through
//! [`CoordinatorHandle`]. GPS drift on the origin is rate limited by a
//! [`Debouncer`]; everything else runs immediately.

mod actor;
mod debounce;
mod refresh;
mod route;


pub use actor::{CoordinatorHandle, CoordinatorStatus};
pub use debounce::Debouncer;
pub use refresh::{JourneyCoordinator, RefreshError};
pub use route::{Route, Trigger};
