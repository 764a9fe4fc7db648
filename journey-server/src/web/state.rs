//! Application state for the web layer.

use std::sync::Arc;

use crate::coordinator::CoordinatorHandle;
use crate::location::InMemoryDirectory;
use crate::sensors::SensorSet;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// Running coordinator
    pub coordinator: CoordinatorHandle,

    /// Registry the host pushes states into
    pub directory: Arc<InMemoryDirectory>,

    /// Sensors exposed for the journey
    pub sensors: Arc<SensorSet>,
}

impl AppState {
    /// Create a new app state.
    pub fn new(
        coordinator: CoordinatorHandle,
        directory: Arc<InMemoryDirectory>,
        sensors: SensorSet,
    ) -> Self {
        Self {
            coordinator,
            directory,
            sensors: Arc::new(sensors),
        }
    }
}
