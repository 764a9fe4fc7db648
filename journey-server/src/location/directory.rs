//! The host's registry of named states.
//!
//! Every tracked person, device and zone is a [`StateRecord`] keyed by its
//! entity id (`person.alex`, `zone.home`). The registry is owned by the
//! host; this crate only reads it and listens for changes.

use std::collections::HashMap;
use std::sync::RwLock;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tokio::sync::broadcast;

use crate::domain::Coordinates;

/// Attribute holding latitude in decimal degrees.
pub const ATTR_LATITUDE: &str = "latitude";

/// Attribute holding longitude in decimal degrees.
pub const ATTR_LONGITUDE: &str = "longitude";

/// Attribute holding the human-readable name.
pub const ATTR_FRIENDLY_NAME: &str = "friendly_name";

/// Buffered change notifications per subscriber.
const CHANGE_CHANNEL_CAPACITY: usize = 64;

/// The registry could not be read.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DirectoryError {
    #[error("location directory unavailable: {0}")]
    Unavailable(String),
}

/// One named state with its attributes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateRecord {
    pub entity_id: String,

    /// Current value, e.g. a zone name such as `home` or `not_home`.
    pub state: String,

    #[serde(default)]
    pub attributes: Map<String, Value>,
}

impl StateRecord {
    pub fn new(entity_id: impl Into<String>, state: impl Into<String>) -> Self {
        Self {
            entity_id: entity_id.into(),
            state: state.into(),
            attributes: Map::new(),
        }
    }

    /// Add or replace an attribute.
    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    /// Add latitude and longitude attributes.
    pub fn with_location(self, latitude: f64, longitude: f64) -> Self {
        self.with_attribute(ATTR_LATITUDE, latitude)
            .with_attribute(ATTR_LONGITUDE, longitude)
    }

    /// Friendly name if set, otherwise the entity id.
    pub fn name(&self) -> &str {
        self.attributes
            .get(ATTR_FRIENDLY_NAME)
            .and_then(Value::as_str)
            .unwrap_or(&self.entity_id)
    }

    /// Position from the latitude/longitude attributes.
    ///
    /// Accepts numbers and numeric strings. `None` if either is missing,
    /// unparseable or out of range.
    pub fn coordinates(&self) -> Option<Coordinates> {
        let latitude = numeric_attribute(self.attributes.get(ATTR_LATITUDE)?)?;
        let longitude = numeric_attribute(self.attributes.get(ATTR_LONGITUDE)?)?;
        Coordinates::new(latitude, longitude).ok()
    }
}

fn numeric_attribute(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// A state was created, updated or removed.
#[derive(Debug, Clone, PartialEq)]
pub struct StateChanged {
    pub entity_id: String,
    pub old: Option<StateRecord>,
    pub new: Option<StateRecord>,
}

impl StateChanged {
    /// Whether the state value itself changed, as opposed to only its
    /// attributes. Appearing or disappearing counts as a change.
    pub fn state_changed(&self) -> bool {
        match (&self.old, &self.new) {
            (Some(old), Some(new)) => old.state != new.state,
            _ => true,
        }
    }
}

/// Read access to the host's state registry.
pub trait LocationDirectory: Send + Sync + 'static {
    /// Look up a state by entity id. `Ok(None)` if it does not exist.
    fn get(&self, entity_id: &str) -> Result<Option<StateRecord>, DirectoryError>;

    /// Receive every subsequent change to any state.
    fn subscribe(&self) -> broadcast::Receiver<StateChanged>;
}

/// Registry held in process memory.
///
/// Used by the binary, where the host pushes states over HTTP, and by tests.
pub struct InMemoryDirectory {
    states: RwLock<HashMap<String, StateRecord>>,
    changes: broadcast::Sender<StateChanged>,
}

impl InMemoryDirectory {
    pub fn new() -> Self {
        let (changes, _) = broadcast::channel(CHANGE_CHANNEL_CAPACITY);
        Self {
            states: RwLock::new(HashMap::new()),
            changes,
        }
    }

    /// Insert or replace a state and notify subscribers.
    ///
    /// Returns the previous record. Events are sent under the write lock, so
    /// subscribers see changes in the order they were applied.
    pub fn set(&self, record: StateRecord) -> Result<Option<StateRecord>, DirectoryError> {
        let entity_id = record.entity_id.clone();
        let mut states = self.states.write().map_err(poisoned)?;
        let old = states.insert(entity_id.clone(), record.clone());

        // No receivers is not an error.
        let _ = self.changes.send(StateChanged {
            entity_id,
            old: old.clone(),
            new: Some(record),
        });
        Ok(old)
    }

    /// Remove a state and notify subscribers.
    pub fn remove(&self, entity_id: &str) -> Result<Option<StateRecord>, DirectoryError> {
        let mut states = self.states.write().map_err(poisoned)?;
        let old = states.remove(entity_id);

        if old.is_some() {
            let _ = self.changes.send(StateChanged {
                entity_id: entity_id.to_string(),
                old: old.clone(),
                new: None,
            });
        }
        Ok(old)
    }

    pub fn len(&self) -> Result<usize, DirectoryError> {
        let states = self.states.read().map_err(poisoned)?;
        Ok(states.len())
    }

    pub fn is_empty(&self) -> Result<bool, DirectoryError> {
        Ok(self.len()? == 0)
    }
}

impl Default for InMemoryDirectory {
    fn default() -> Self {
        Self::new()
    }
}

impl LocationDirectory for InMemoryDirectory {
    fn get(&self, entity_id: &str) -> Result<Option<StateRecord>, DirectoryError> {
        let states = self.states.read().map_err(poisoned)?;
        Ok(states.get(entity_id).cloned())
    }

    fn subscribe(&self) -> broadcast::Receiver<StateChanged> {
        self.changes.subscribe()
    }
}

fn poisoned<T>(_: std::sync::PoisonError<T>) -> DirectoryError {
    DirectoryError::Unavailable("state lock poisoned".to_string())
}
