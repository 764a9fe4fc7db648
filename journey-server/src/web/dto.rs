//! Data transfer objects for web requests and responses.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::coordinator::CoordinatorStatus;
use crate::location::StateRecord;
use crate::sensors::SensorReading;

/// Body of `PUT /states/{entity_id}`.
#[derive(Debug, Deserialize)]
pub struct StateUpdate {
    /// New state value, e.g. `home` or a zone name.
    pub state: String,

    /// Replaces all existing attributes.
    #[serde(default)]
    pub attributes: Map<String, Value>,
}

impl StateUpdate {
    pub fn into_record(self, entity_id: impl Into<String>) -> StateRecord {
        StateRecord {
            entity_id: entity_id.into(),
            state: self.state,
            attributes: self.attributes,
        }
    }
}

/// Response for `GET /sensors`.
#[derive(Debug, Serialize)]
pub struct SensorsResponse {
    pub sensors: Vec<SensorReading>,

    /// Whether the most recent refresh succeeded.
    pub last_update_success: bool,

    /// RFC 3339 time of the last successful refresh
    pub last_updated: Option<String>,

    /// Why the most recent refresh failed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
}

impl SensorsResponse {
    pub fn new(sensors: Vec<SensorReading>, status: &CoordinatorStatus) -> Self {
        Self {
            sensors,
            last_update_success: status.last_update_success,
            last_updated: status.last_updated.map(|t| t.to_rfc3339()),
            last_error: status.last_error.as_ref().map(ToString::to_string),
        }
    }
}

/// Response for `POST /refresh`.
#[derive(Debug, Serialize)]
pub struct RefreshResponse {
    pub success: bool,
}

/// Error response.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Error message
    pub error: String,
}
