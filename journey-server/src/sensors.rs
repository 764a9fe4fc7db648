//! Read-only views of the coordinator's status, shaped as host sensors.
//!
//! A view borrows one [`CoordinatorStatus`] and a timestamp, so every value
//! it reports comes from the same snapshot.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;
use serde_json::{Map, Value};

use crate::coordinator::CoordinatorStatus;
use crate::domain::TravelTime;

/// Credit required when showing OpenStreetMap data.
pub const ATTRIBUTION: &str = "Map data © OpenStreetMap contributors";

pub const LOCATION_ICON: &str = "mdi:map-marker-right";

pub const TRAVEL_TIME_ICON: &str = "mdi:timer";

pub const UNIT_MINUTES: &str = "min";

/// A value exposed to the host.
pub trait Sensor {
    /// Stable identifier, unique across all sensors.
    fn unique_id(&self) -> String;

    fn name(&self) -> String;

    fn icon(&self) -> &'static str;

    fn unit(&self) -> Option<&'static str> {
        None
    }

    /// Current value. `None` before anything has been published.
    fn state(&self) -> Option<Value>;

    /// Extra attributes. Empty before anything has been published.
    fn attributes(&self) -> Map<String, Value>;

    /// False while the most recent refresh has failed.
    fn available(&self) -> bool;
}

/// Identity shared by the sensors of one journey.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SensorSet {
    /// Prefix for unique ids.
    pub id: String,

    /// Prefix for display names.
    pub name: String,

    pub destination_count: usize,
}

impl SensorSet {
    pub fn new(id: impl Into<String>, name: impl Into<String>, destination_count: usize) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            destination_count,
        }
    }

    /// One location sensor followed by one travel-time sensor per
    /// destination, all reading `status` as of `now`.
    pub fn views<'a>(
        &'a self,
        status: &'a CoordinatorStatus,
        now: DateTime<Utc>,
    ) -> Vec<Box<dyn Sensor + 'a>> {
        let mut sensors: Vec<Box<dyn Sensor + 'a>> = Vec::with_capacity(1 + self.destination_count);
        sensors.push(Box::new(LocationSensor { set: self, status }));
        for index in 0..self.destination_count {
            sensors.push(Box::new(TravelTimeSensor {
                set: self,
                status,
                index,
                now,
            }));
        }
        sensors
    }
}

/// The origin's current place name.
pub struct LocationSensor<'a> {
    set: &'a SensorSet,
    status: &'a CoordinatorStatus,
}

impl<'a> LocationSensor<'a> {
    pub fn new(set: &'a SensorSet, status: &'a CoordinatorStatus) -> Self {
        Self { set, status }
    }
}

impl Sensor for LocationSensor<'_> {
    fn unique_id(&self) -> String {
        format!("{}-location", self.set.id)
    }

    fn name(&self) -> String {
        format!("{} Current Location", self.set.name)
    }

    fn icon(&self) -> &'static str {
        LOCATION_ICON
    }

    fn state(&self) -> Option<Value> {
        let data = self.status.data.as_deref()?;
        Some(Value::from(data.origin_locality()))
    }

    fn attributes(&self) -> Map<String, Value> {
        let Some(data) = self.status.data.as_deref() else {
            return Map::new();
        };

        let mut attributes = Map::new();
        if let Some(address) = data.origin_address.as_deref() {
            for (key, value) in &address.components {
                attributes.insert(key.clone(), Value::from(value.as_str()));
            }
            attributes.insert("full_address".into(), Value::from(address.display_name.as_str()));
        }
        attributes.insert("attribution".into(), Value::from(ATTRIBUTION));
        attributes
    }

    fn available(&self) -> bool {
        self.status.last_update_success
    }
}

/// Travel time to one destination, in minutes under current traffic.
pub struct TravelTimeSensor<'a> {
    set: &'a SensorSet,
    status: &'a CoordinatorStatus,
    index: usize,
    now: DateTime<Utc>,
}

impl<'a> TravelTimeSensor<'a> {
    pub fn new(
        set: &'a SensorSet,
        status: &'a CoordinatorStatus,
        index: usize,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            set,
            status,
            index,
            now,
        }
    }

    fn travel_time(&self) -> Option<&TravelTime> {
        self.status
            .data
            .as_deref()
            .and_then(|data| data.travel_time(self.index))
    }
}

impl Sensor for TravelTimeSensor<'_> {
    fn unique_id(&self) -> String {
        if self.index == 0 {
            format!("{}-time", self.set.id)
        } else {
            format!("{}-time-{}", self.set.id, self.index)
        }
    }

    fn name(&self) -> String {
        if self.set.destination_count > 1 {
            format!("{} Travel Time {}", self.set.name, self.index + 1)
        } else {
            format!("{} Travel Time", self.set.name)
        }
    }

    fn icon(&self) -> &'static str {
        TRAVEL_TIME_ICON
    }

    fn unit(&self) -> Option<&'static str> {
        Some(UNIT_MINUTES)
    }

    fn state(&self) -> Option<Value> {
        self.travel_time()?.duration_in_traffic_min().map(Value::from)
    }

    fn attributes(&self) -> Map<String, Value> {
        let Some(travel_time) = self.travel_time() else {
            return Map::new();
        };

        let mut attributes: Map<String, Value> = travel_time
            .values
            .iter()
            .map(|(key, value)| (key.clone(), Value::from(*value)))
            .collect();
        attributes.insert("delay_minutes".into(), Value::from(travel_time.delay_min()));
        attributes.insert("delay_factor".into(), Value::from(travel_time.delay_factor()));
        attributes.insert(
            "destination".into(),
            Value::from(travel_time.destination.as_str()),
        );
        attributes.insert(
            "eta".into(),
            Value::from(
                travel_time
                    .eta(self.now)
                    .map(|eta| eta.to_rfc3339_opts(SecondsFormat::Secs, true)),
            ),
        );
        attributes
    }

    fn available(&self) -> bool {
        self.status.last_update_success
    }
}

/// Everything a sensor reports, in one serializable record.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SensorReading {
    pub unique_id: String,
    pub name: String,
    pub icon: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit: Option<&'static str>,
    pub state: Option<Value>,
    pub attributes: Map<String, Value>,
    pub available: bool,
}

impl SensorReading {
    pub fn read(sensor: &dyn Sensor) -> Self {
        Self {
            unique_id: sensor.unique_id(),
            name: sensor.name(),
            icon: sensor.icon(),
            unit: sensor.unit(),
            state: sensor.state(),
            attributes: sensor.attributes(),
            available: sensor.available(),
        }
    }
}
