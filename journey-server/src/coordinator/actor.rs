//! The coordinator task and its handle.
//!
//! All scheduling state lives in one task. Callers talk to it over a
//! command channel and observe results through a watch channel, so at most
//! one refresh cycle is ever in flight.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::{broadcast, mpsc, oneshot, watch};
use tokio::task::{JoinError, JoinHandle};
use tokio::time::{Instant, sleep_until};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::config::CoordinatorConfig;
use crate::domain::JourneyData;
use crate::location::{LocationDirectory, StateChanged};
use crate::remote::{ReverseGeocoder, TravelTimeProvider};

use super::debounce::Debouncer;
use super::refresh::{JourneyCoordinator, RefreshError};
use super::route::Trigger;

const COMMAND_CHANNEL_CAPACITY: usize = 32;

type CycleHandle = JoinHandle<Result<JourneyData, RefreshError>>;

/// What observers see of the coordinator.
#[derive(Debug, Clone)]
pub struct CoordinatorStatus {
    /// Latest successful snapshot. Kept across failed cycles.
    pub data: Option<Arc<JourneyData>>,

    /// Whether the most recent cycle succeeded. True before the first cycle.
    pub last_update_success: bool,

    /// Why the most recent cycle failed, if it did.
    pub last_error: Option<RefreshError>,

    /// When `data` was last replaced.
    pub last_updated: Option<DateTime<Utc>>,
}

impl Default for CoordinatorStatus {
    fn default() -> Self {
        Self {
            data: None,
            last_update_success: true,
            last_error: None,
            last_updated: None,
        }
    }
}

enum Command {
    RefreshNow(oneshot::Sender<bool>),
    RequestRefresh,
}

/// Cloneable access to a running coordinator.
#[derive(Clone)]
pub struct CoordinatorHandle {
    commands: mpsc::Sender<Command>,
    status: watch::Receiver<CoordinatorStatus>,
}

impl CoordinatorHandle {
    /// Refresh now, bypassing the debouncer.
    ///
    /// Resolves once the cycle serving this request has finished, with that
    /// cycle's success. If a cycle is already running, one more runs after
    /// it; concurrent callers share that follow-up.
    pub async fn refresh_now(&self) -> bool {
        let (tx, rx) = oneshot::channel();
        if self.commands.send(Command::RefreshNow(tx)).await.is_err() {
            warn!("Refresh requested after coordinator stopped");
            return false;
        }
        rx.await.unwrap_or(false)
    }

    /// Ask for a debounced refresh. Returns without waiting for it.
    pub async fn request_refresh(&self) {
        if self.commands.send(Command::RequestRefresh).await.is_err() {
            warn!("Refresh requested after coordinator stopped");
        }
    }

    pub fn last_update_success(&self) -> bool {
        self.status.borrow().last_update_success
    }

    /// The latest successful snapshot, if any.
    pub fn current_snapshot(&self) -> Option<Arc<JourneyData>> {
        self.status.borrow().data.clone()
    }

    pub fn status(&self) -> CoordinatorStatus {
        self.status.borrow().clone()
    }

    /// Receive a notification after every cycle, successful or not.
    pub fn subscribe(&self) -> watch::Receiver<CoordinatorStatus> {
        self.status.clone()
    }
}

impl<G, T, D> JourneyCoordinator<G, T, D>
where
    G: ReverseGeocoder,
    T: TravelTimeProvider,
    D: LocationDirectory,
{
    /// Start the coordinator task.
    ///
    /// The first cycle runs immediately. The task stops when `cancel` fires
    /// or every handle has been dropped.
    pub fn spawn(self, config: &CoordinatorConfig, cancel: CancellationToken) -> CoordinatorHandle {
        let (command_tx, command_rx) = mpsc::channel(COMMAND_CHANNEL_CAPACITY);
        let (status_tx, status_rx) = watch::channel(CoordinatorStatus::default());
        let changes = self.resolver().directory().subscribe();

        let actor = Actor {
            coordinator: Arc::new(self),
            scan_interval: config.scan_interval,
            debouncer: Debouncer::new(config.debounce_cooldown, config.debounce_immediate),
            commands: command_rx,
            changes: Some(changes),
            status: status_tx,
            cancel,
            next_scheduled: Instant::now() + config.scan_interval,
            in_flight: None,
            waiters: Vec::new(),
            follow_up: false,
            follow_up_waiters: Vec::new(),
        };
        tokio::spawn(actor.run());

        CoordinatorHandle {
            commands: command_tx,
            status: status_rx,
        }
    }
}

struct Actor<G, T, D> {
    coordinator: Arc<JourneyCoordinator<G, T, D>>,
    scan_interval: Duration,
    debouncer: Debouncer,
    commands: mpsc::Receiver<Command>,
    changes: Option<broadcast::Receiver<StateChanged>>,
    status: watch::Sender<CoordinatorStatus>,
    cancel: CancellationToken,
    next_scheduled: Instant,
    in_flight: Option<CycleHandle>,
    /// Answered when the in-flight cycle ends.
    waiters: Vec<oneshot::Sender<bool>>,
    /// Another cycle is owed once the in-flight one ends.
    follow_up: bool,
    follow_up_waiters: Vec<oneshot::Sender<bool>>,
}

impl<G, T, D> Actor<G, T, D>
where
    G: ReverseGeocoder,
    T: TravelTimeProvider,
    D: LocationDirectory,
{
    async fn run(mut self) {
        info!(
            origin = %self.coordinator.route().origin,
            destinations = self.coordinator.route().destinations.len(),
            "Coordinator started"
        );
        self.start_cycle();

        loop {
            let debounce_deadline = self.debouncer.deadline();

            tokio::select! {
                _ = self.cancel.cancelled() => {
                    debug!("Coordinator cancelled");
                    break;
                }

                command = self.commands.recv() => match command {
                    Some(Command::RefreshNow(reply)) => self.trigger(Trigger::Forced, Some(reply)),
                    Some(Command::RequestRefresh) => self.trigger(Trigger::Debounced, None),
                    None => {
                        debug!("All coordinator handles dropped");
                        break;
                    }
                },

                change = recv_change(&mut self.changes) => self.handle_change(change),

                result = join_cycle(&mut self.in_flight), if self.in_flight.is_some() => {
                    self.in_flight = None;
                    self.finish_cycle(result);
                }

                _ = sleep_until(self.next_scheduled), if self.in_flight.is_none() => {
                    debug!("Scheduled refresh");
                    self.trigger(Trigger::Forced, None);
                }

                _ = sleep_until(debounce_deadline.unwrap_or(self.next_scheduled)),
                    if debounce_deadline.is_some() =>
                {
                    if self.debouncer.poll(Instant::now()) {
                        if self.in_flight.is_some() {
                            debug!("Debounced refresh absorbed by the running cycle");
                        } else {
                            debug!("Debounced refresh due");
                            self.start_cycle();
                        }
                    }
                }
            }
        }

        if let Some(cycle) = self.in_flight.take() {
            cycle.abort();
        }
        info!("Coordinator stopped");
    }

    fn handle_change(&mut self, change: Result<StateChanged, RecvError>) {
        match change {
            Ok(change) => {
                let has_data = self.status.borrow().data.is_some();
                if let Some(trigger) = self.coordinator.route().trigger_for(&change, has_data) {
                    debug!(entity_id = %change.entity_id, ?trigger, "Tracked state changed");
                    self.trigger(trigger, None);
                }
            }
            Err(RecvError::Lagged(skipped)) => {
                warn!(skipped, "Missed state changes, refreshing");
                self.trigger(Trigger::Forced, None);
            }
            Err(RecvError::Closed) => {
                warn!("State change feed closed");
                self.changes = None;
            }
        }
    }

    fn trigger(&mut self, trigger: Trigger, reply: Option<oneshot::Sender<bool>>) {
        match trigger {
            Trigger::Forced => {
                self.debouncer.cancel();
                self.start_or_queue(reply);
            }
            Trigger::Debounced => {
                if self.in_flight.is_some() {
                    debug!("Refresh in progress, debounced request absorbed");
                } else if self.debouncer.request(Instant::now()) {
                    self.start_or_queue(reply);
                } else {
                    debug!("Refresh deferred by debouncer");
                }
            }
        }
    }

    /// Only forced refreshes queue a follow-up; debounced ones never reach
    /// here while a cycle runs.
    fn start_or_queue(&mut self, reply: Option<oneshot::Sender<bool>>) {
        if self.in_flight.is_some() {
            debug!("Refresh in progress, queueing one more");
            self.follow_up = true;
            self.follow_up_waiters.extend(reply);
        } else {
            self.waiters.extend(reply);
            self.start_cycle();
        }
    }

    fn start_cycle(&mut self) {
        let coordinator = Arc::clone(&self.coordinator);
        self.in_flight = Some(tokio::spawn(async move { coordinator.refresh().await }));
    }

    fn finish_cycle(&mut self, result: Result<Result<JourneyData, RefreshError>, JoinError>) {
        let outcome = result.unwrap_or_else(|e| Err(RefreshError::Task(e.to_string())));
        let success = outcome.is_ok();
        let was_success = self.status.borrow().last_update_success;

        match outcome {
            Ok(data) => {
                if !was_success {
                    info!("Fetching journey data recovered");
                }
                self.status.send_modify(|status| {
                    status.data = Some(Arc::new(data));
                    status.last_update_success = true;
                    status.last_error = None;
                    status.last_updated = Some(Utc::now());
                });
            }
            Err(e) => {
                if was_success {
                    error!(error = %e, "Error fetching journey data");
                } else {
                    debug!(error = %e, "Error fetching journey data");
                }
                self.status.send_modify(|status| {
                    status.last_update_success = false;
                    status.last_error = Some(e);
                });
            }
        }

        for waiter in self.waiters.drain(..) {
            let _ = waiter.send(success);
        }
        self.next_scheduled = Instant::now() + self.scan_interval;

        if self.follow_up {
            self.follow_up = false;
            self.waiters = std::mem::take(&mut self.follow_up_waiters);
            self.start_cycle();
        }
    }
}

async fn recv_change(
    changes: &mut Option<broadcast::Receiver<StateChanged>>,
) -> Result<StateChanged, RecvError> {
    match changes {
        Some(rx) => rx.recv().await,
        None => std::future::pending().await,
    }
}

async fn join_cycle(
    in_flight: &mut Option<CycleHandle>,
) -> Result<Result<JourneyData, RefreshError>, JoinError> {
    match in_flight {
        Some(cycle) => cycle.await,
        None => std::future::pending().await,
    }
}
