//! Rate limiting for refresh requests.
//!
//! The debouncer is a plain state machine over explicit instants; the
//! coordinator supplies the clock and sleeps until [`Debouncer::deadline`].

use std::time::Duration;

use tokio::time::Instant;

/// Collapses bursts of requests into at most one execution per window.
///
/// With `immediate` set, the first request in an idle period runs at once
/// and opens a cooldown window. Requests inside the window are folded into a
/// single execution when it closes, which opens a fresh window.
#[derive(Debug, Clone)]
pub struct Debouncer {
    cooldown: Duration,
    immediate: bool,
    deadline: Option<Instant>,
    pending: bool,
}

impl Debouncer {
    pub fn new(cooldown: Duration, immediate: bool) -> Self {
        Self {
            cooldown,
            immediate,
            deadline: None,
            pending: false,
        }
    }

    /// Record a request at `now`. Returns true if it should run now.
    pub fn request(&mut self, now: Instant) -> bool {
        match self.deadline {
            Some(deadline) if now < deadline => {
                self.pending = true;
                false
            }
            // Window over; a pending execution not yet polled runs now.
            Some(_) if self.pending => {
                self.open_window(now);
                true
            }
            _ if self.immediate => {
                self.open_window(now);
                true
            }
            _ => {
                self.deadline = Some(now + self.cooldown);
                self.pending = true;
                false
            }
        }
    }

    /// Check the window at `now`. Returns true if a deferred request is due,
    /// in which case a new window opens.
    pub fn poll(&mut self, now: Instant) -> bool {
        match self.deadline {
            Some(deadline) if now >= deadline => {
                if self.pending {
                    self.open_window(now);
                    true
                } else {
                    self.deadline = None;
                    false
                }
            }
            _ => false,
        }
    }

    /// End of the current window, if one is open.
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Whether a deferred request is waiting for the window to close.
    pub fn is_pending(&self) -> bool {
        self.pending
    }

    /// Drop the window and any deferred request.
    pub fn cancel(&mut self) {
        self.deadline = None;
        self.pending = false;
    }

    fn open_window(&mut self, now: Instant) {
        self.deadline = Some(now + self.cooldown);
        self.pending = false;
    }
}
