//! Resolve named references to positions.
//!
//! A tracked person reporting "in zone X" is placed at the zone's fixed
//! position rather than at their own GPS fix, which is noisier and would
//! make the address flicker while they stay put.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::domain::Coordinates;

use super::directory::{DirectoryError, LocationDirectory, StateRecord};

/// Entity id prefix for zones.
pub const ZONE_PREFIX: &str = "zone.";

/// A reference resolved to a position.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedLocation {
    /// The record the position came from (the zone, when resolved via one).
    pub entity_id: String,

    /// Display name of that record.
    pub name: String,

    pub coordinates: Coordinates,
}

impl ResolvedLocation {
    fn from_record(record: &StateRecord, coordinates: Coordinates) -> Self {
        Self {
            entity_id: record.entity_id.clone(),
            name: record.name().to_string(),
            coordinates,
        }
    }

    pub fn is_zone(&self) -> bool {
        is_zone(&self.entity_id)
    }
}

/// Whether an entity id names a zone.
pub fn is_zone(entity_id: &str) -> bool {
    entity_id.starts_with(ZONE_PREFIX)
}

/// Zone entity ids a state value may refer to: the literal value, then its
/// slug (`"Work Office"` -> `zone.work_office`).
fn zone_candidates(state: &str) -> Vec<String> {
    let literal = format!("{ZONE_PREFIX}{state}");
    let slug: String = state
        .trim()
        .chars()
        .map(|c| {
            if c.is_alphanumeric() {
                c.to_ascii_lowercase()
            } else {
                '_'
            }
        })
        .collect();
    let slugged = format!("{ZONE_PREFIX}{slug}");

    if slugged == literal {
        vec![literal]
    } else {
        vec![literal, slugged]
    }
}

/// Resolves references against a [`LocationDirectory`].
pub struct LocationResolver<D> {
    directory: Arc<D>,
}

impl<D> Clone for LocationResolver<D> {
    fn clone(&self) -> Self {
        Self {
            directory: Arc::clone(&self.directory),
        }
    }
}

impl<D: LocationDirectory> LocationResolver<D> {
    pub fn new(directory: Arc<D>) -> Self {
        Self { directory }
    }

    pub fn directory(&self) -> &Arc<D> {
        &self.directory
    }

    /// Resolve a reference to a position. First match wins:
    ///
    /// 1. the zone named by the reference's state, if that zone has a
    ///    position (skipped when the reference is itself a zone);
    /// 2. the reference's own latitude/longitude attributes.
    ///
    /// `Ok(None)` when neither applies or the reference does not exist.
    /// `Err` only when the directory itself cannot be read.
    pub fn resolve(&self, reference: &str) -> Result<Option<ResolvedLocation>, DirectoryError> {
        let Some(record) = self.directory.get(reference)? else {
            warn!(reference, "Locating: unable to find");
            return Ok(None);
        };

        if !is_zone(reference) {
            match self.zone_of(&record)? {
                Some(zone) => {
                    if let Some(coordinates) = zone.coordinates() {
                        debug!(reference, zone = %zone.entity_id, "Locating: in zone, using zone location");
                        return Ok(Some(ResolvedLocation::from_record(&zone, coordinates)));
                    }
                    debug!(reference, zone = %zone.entity_id, "Locating: in zone, no zone location");
                }
                None => {
                    debug!(reference, state = %record.state, "Locating: state is not a known zone");
                }
            }
        }

        if let Some(coordinates) = record.coordinates() {
            debug!(reference, "Locating: from attributes");
            return Ok(Some(ResolvedLocation::from_record(&record, coordinates)));
        }

        warn!(reference, "Locating: no coordinates available");
        Ok(None)
    }

    /// Display name of a reference, falling back to the reference itself.
    pub fn display_name(&self, reference: &str) -> Result<String, DirectoryError> {
        Ok(self
            .directory
            .get(reference)?
            .map(|record| record.name().to_string())
            .unwrap_or_else(|| reference.to_string()))
    }

    fn zone_of(&self, record: &StateRecord) -> Result<Option<StateRecord>, DirectoryError> {
        for candidate in zone_candidates(&record.state) {
            if let Some(zone) = self.directory.get(&candidate)? {
                return Ok(Some(zone));
            }
        }
        Ok(None)
    }
}
