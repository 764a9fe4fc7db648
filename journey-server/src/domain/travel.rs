//! Travel-time results and the metrics derived from them.
//!
//! Everything here is a pure function of the raw values fetched during a
//! refresh. Missing inputs produce `NaN` seconds, which surface as `None`
//! in every minute-valued field rather than as an error.

use std::collections::BTreeMap;

use chrono::{DateTime, TimeDelta, Utc};

/// Raw field holding the nominal journey duration.
pub const DURATION: &str = "duration";

/// Raw field holding the duration under current traffic.
pub const DURATION_IN_TRAFFIC: &str = "duration_in_traffic";

/// The travel time to one destination, as fetched in one refresh.
#[derive(Debug, Clone, PartialEq)]
pub struct TravelTime {
    /// Display label of the destination.
    pub destination: String,

    /// Flattened numeric fields of the upstream result (seconds, metres).
    /// Empty when the lookup failed or was never made.
    pub values: BTreeMap<String, f64>,
}

impl TravelTime {
    pub fn new(destination: impl Into<String>, values: BTreeMap<String, f64>) -> Self {
        Self {
            destination: destination.into(),
            values,
        }
    }

    /// A leg whose lookup failed or could not be attempted.
    pub fn unavailable(destination: impl Into<String>) -> Self {
        Self::new(destination, BTreeMap::new())
    }

    /// A leg whose destination is where the origin already is.
    pub fn zero(destination: impl Into<String>) -> Self {
        let values = BTreeMap::from([
            (DURATION.to_string(), 0.0),
            (DURATION_IN_TRAFFIC.to_string(), 0.0),
        ]);
        Self::new(destination, values)
    }

    pub fn is_available(&self) -> bool {
        !self.duration().is_nan()
    }

    /// Nominal duration in seconds, `NaN` if unknown.
    pub fn duration(&self) -> f64 {
        self.values.get(DURATION).copied().unwrap_or(f64::NAN)
    }

    /// Duration under current traffic in seconds.
    ///
    /// Falls back to the nominal duration when the upstream did not report
    /// traffic conditions.
    pub fn duration_in_traffic(&self) -> f64 {
        self.values
            .get(DURATION_IN_TRAFFIC)
            .copied()
            .unwrap_or_else(|| self.duration())
    }

    /// Extra seconds caused by traffic.
    pub fn delay(&self) -> f64 {
        self.duration_in_traffic() - self.duration()
    }

    pub fn duration_min(&self) -> Option<i64> {
        seconds_to_minutes(self.duration())
    }

    pub fn duration_in_traffic_min(&self) -> Option<i64> {
        seconds_to_minutes(self.duration_in_traffic())
    }

    pub fn delay_min(&self) -> Option<i64> {
        seconds_to_minutes(self.delay())
    }

    /// Delay as a percentage of the nominal duration.
    ///
    /// Zero whenever the nominal duration is not positive.
    pub fn delay_factor(&self) -> i64 {
        let duration = self.duration();
        if duration.is_nan() || duration <= 0.0 {
            return 0;
        }
        let factor = (100.0 * self.delay() / duration).round_ties_even();
        if factor.is_finite() { factor as i64 } else { 0 }
    }

    /// Estimated arrival if leaving at `now`.
    pub fn eta(&self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        let seconds = self.duration_in_traffic();
        if !seconds.is_finite() {
            return None;
        }
        let delta = TimeDelta::try_milliseconds((seconds * 1000.0).round() as i64)?;
        now.checked_add_signed(delta)
    }
}

fn seconds_to_minutes(seconds: f64) -> Option<i64> {
    if seconds.is_finite() {
        Some((seconds / 60.0).round_ties_even() as i64)
    } else {
        None
    }
}
