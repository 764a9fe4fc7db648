//! The references a coordinator tracks, and how their changes trigger
//! refreshes.

use crate::location::StateChanged;

/// How urgently a refresh should run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    /// Run now, cancelling any debounce window.
    Forced,

    /// Run through the debouncer.
    Debounced,
}

/// One origin and its destinations, by reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Route {
    pub origin: String,
    pub destinations: Vec<String>,
}

impl Route {
    pub fn new(origin: impl Into<String>, destinations: Vec<String>) -> Self {
        Self {
            origin: origin.into(),
            destinations,
        }
    }

    /// Decide whether a registry change should refresh this route.
    ///
    /// `None` when the change concerns something the route does not track.
    /// Origin updates that keep the same state value are GPS drift and are
    /// debounced, unless nothing has been published yet.
    pub fn trigger_for(&self, change: &StateChanged, has_data: bool) -> Option<Trigger> {
        if change.entity_id == self.origin {
            if change.state_changed() || !has_data {
                return Some(Trigger::Forced);
            }
            return Some(Trigger::Debounced);
        }

        if self.destinations.iter().any(|d| *d == change.entity_id) {
            return Some(Trigger::Forced);
        }

        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::location::StateRecord;

    fn route() -> Route {
        Route::new(
            "person.alex",
            vec!["zone.work".to_string(), "zone.gym".to_string()],
        )
    }

    fn change(entity_id: &str, old: Option<&str>, new: Option<&str>) -> StateChanged {
        StateChanged {
            entity_id: entity_id.to_string(),
            old: old.map(|s| StateRecord::new(entity_id, s)),
            new: new.map(|s| StateRecord::new(entity_id, s)),
        }
    }

    #[test]
    fn origin_jitter_is_debounced() {
        let event = change("person.alex", Some("not_home"), Some("not_home"));
        assert_eq!(route().trigger_for(&event, true), Some(Trigger::Debounced));
    }

    #[test]
    fn origin_jitter_before_first_publish_is_forced() {
        let event = change("person.alex", Some("not_home"), Some("not_home"));
        assert_eq!(route().trigger_for(&event, false), Some(Trigger::Forced));
    }

    #[test]
    fn origin_state_change_is_forced() {
        let event = change("person.alex", Some("home"), Some("not_home"));
        assert_eq!(route().trigger_for(&event, true), Some(Trigger::Forced));

        let event = change("person.alex", None, Some("home"));
        assert_eq!(route().trigger_for(&event, true), Some(Trigger::Forced));

        let event = change("person.alex", Some("home"), None);
        assert_eq!(route().trigger_for(&event, true), Some(Trigger::Forced));
    }

    #[test]
    fn destination_change_is_forced() {
        let event = change("zone.gym", Some("0"), Some("0"));
        assert_eq!(route().trigger_for(&event, true), Some(Trigger::Forced));
    }

    #[test]
    fn unrelated_change_is_ignored() {
        let event = change("light.kitchen", Some("off"), Some("on"));
        assert_eq!(route().trigger_for(&event, true), None);
    }
}
