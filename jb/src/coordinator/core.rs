//! Main fetch coordinator task implementation

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::cache::CacheSlot;
use super::config::FetchConfig;
use super::handle::CoordinatorHandle;
use super::messages::{FetchMetrics, FetchRequest, RequestMode};
use super::operation::Operation;
use super::state::{AttemptId, Gate, KeyState};
use crate::domain::Record;
use crate::notify::{Notification, Notifier};
use crate::transport::{FetchError, Transport};

/// One operation's lifecycle state and cache entry
struct Slot {
    state: KeyState,
    cache: CacheSlot,
}

impl Slot {
    fn new() -> Self {
        Self {
            state: KeyState::new(),
            cache: CacheSlot::new(),
        }
    }
}

/// The fetch coordinator owns every operation's state and cache entry
///
/// Consumers talk to it through [`CoordinatorHandle`]; reads run in spawned
/// tasks that report back as [`FetchRequest::Completed`], so all state changes
/// happen on the coordinator task, one message at a time.
pub struct FetchCoordinator {
    config: FetchConfig,
    transport: Arc<dyn Transport>,
    notifier: Arc<dyn Notifier>,
    tx: mpsc::Sender<FetchRequest>,
    rx: mpsc::Receiver<FetchRequest>,
}

impl FetchCoordinator {
    /// Create a new coordinator with the given configuration
    pub fn new(config: FetchConfig, transport: Arc<dyn Transport>, notifier: Arc<dyn Notifier>) -> Self {
        debug!(?config, "FetchCoordinator::new: called");
        let (tx, rx) = mpsc::channel(config.channel_buffer.max(1));
        Self {
            config,
            transport,
            notifier,
            tx,
            rx,
        }
    }

    /// Create a handle for a consumer
    pub fn handle(&self) -> CoordinatorHandle {
        CoordinatorHandle::new(self.tx.clone())
    }

    /// Run the coordinator task
    ///
    /// This consumes the coordinator and runs until teardown is requested or
    /// every handle and outstanding read has been dropped.
    pub async fn run(self) {
        let Self {
            config,
            transport,
            notifier,
            tx,
            mut rx,
        } = self;
        // Only handles and in-flight reads keep the channel open
        let completions = tx.downgrade();
        drop(tx);

        let mut slots: HashMap<Operation, Slot> = HashMap::new();
        let mut next_attempt: AttemptId = 0;
        let mut metrics = FetchMetrics::default();
        let min_interval = config.min_interval();

        info!(min_interval_ms = config.min_interval_ms, "Fetch coordinator started");

        while let Some(req) = rx.recv().await {
            match req {
                FetchRequest::Request { operation, mode } => {
                    metrics.requests_received += 1;
                    let now = Instant::now();
                    let slot = slots.entry(operation.clone()).or_insert_with(Slot::new);

                    if mode == RequestMode::Gated {
                        match slot.state.gate(now, min_interval) {
                            Gate::RateLimited { remaining } => {
                                debug!(%operation, ?remaining, "Request too soon after last issue, skipping");
                                metrics.rate_limited += 1;
                                continue;
                            }
                            Gate::InFlight => {
                                debug!(%operation, "Request already in flight, skipping");
                                metrics.in_flight_skips += 1;
                                continue;
                            }
                            Gate::Open => {}
                        }
                    }

                    // Fails only once every handle is gone and nothing is in flight
                    let Some(reply_tx) = completions.upgrade() else {
                        debug!(%operation, "No handles left, stopping");
                        break;
                    };

                    next_attempt += 1;
                    let attempt = next_attempt;
                    let cancel = CancellationToken::new();

                    if let Some(previous) = slot.state.begin(attempt, cancel.clone(), now) {
                        info!(%operation, previous = previous.attempt, attempt, "Superseding in-flight attempt");
                        metrics.superseded += 1;
                        if previous.triggered {
                            metrics.cancellations += 1;
                        }
                    }
                    slot.cache.mark_loading();
                    metrics.attempts_issued += 1;
                    metrics.tracked_operations = slots.len();

                    debug!(%operation, attempt, "Issuing read");
                    spawn_read(
                        transport.clone(),
                        reply_tx,
                        operation,
                        attempt,
                        cancel,
                        config.read_timeout(),
                    );
                }

                FetchRequest::Cancel { operation } => {
                    if let Some(slot) = slots.get(&operation)
                        && slot.state.cancel()
                    {
                        debug!(%operation, "Cancelled in-flight attempt");
                        metrics.cancellations += 1;
                    }
                }

                FetchRequest::Completed {
                    operation,
                    attempt,
                    result,
                } => {
                    let Some(slot) = slots.get_mut(&operation) else {
                        metrics.late_discarded += 1;
                        continue;
                    };

                    let Some(handle) = slot.state.settle(attempt) else {
                        debug!(%operation, attempt, "Discarding completion of superseded attempt");
                        metrics.late_discarded += 1;
                        continue;
                    };

                    // A response that raced past its cancellation is discarded too
                    if handle.is_cancelled() || matches!(result, Err(FetchError::Cancelled)) {
                        debug!(%operation, attempt, "Attempt cancelled");
                        metrics.cancelled += 1;
                        slot.cache.settle();
                        continue;
                    }

                    match result {
                        Ok(records) => {
                            debug!(%operation, attempt, count = records.len(), "Read succeeded");
                            metrics.succeeded += 1;
                            slot.cache.store(records);
                        }
                        Err(err) => {
                            metrics.failed += 1;
                            let message = err.user_message(operation.failure_message());
                            slot.cache.fail(message.clone());

                            if err.is_transient() {
                                debug!(%operation, attempt, error = %err, "Transient read failure, not notifying");
                            } else {
                                warn!(%operation, attempt, error = %err, "Read failed");
                                notifier.notify(Notification::error(message));
                                metrics.notifications_raised += 1;
                            }
                        }
                    }
                }

                FetchRequest::Subscribe { operation, reply_tx } => {
                    let slot = slots.entry(operation.clone()).or_insert_with(Slot::new);
                    let subscription = slot.cache.subscribe(operation);
                    metrics.tracked_operations = slots.len();
                    let _ = reply_tx.send(subscription);
                }

                FetchRequest::Prepend { operation, record } => {
                    if let Some(slot) = slots.get(&operation) {
                        debug!(%operation, record_id = %record.id(), "Prepending record");
                        slot.cache.prepend(record);
                    }
                }

                FetchRequest::GetMetrics { reply_tx } => {
                    let _ = reply_tx.send(metrics.clone());
                }

                FetchRequest::Teardown { reply_tx } => {
                    info!("Fetch coordinator tearing down");
                    for (operation, slot) in &slots {
                        if slot.state.cancel() {
                            debug!(%operation, "Cancelled in-flight attempt on teardown");
                            metrics.cancellations += 1;
                        }
                        // No completion will be processed after this point
                        if slot.state.is_loading() {
                            slot.cache.settle();
                        }
                    }
                    if let Some(reply_tx) = reply_tx {
                        let _ = reply_tx.send(metrics.clone());
                    }
                    break;
                }
            }
        }

        info!("Fetch coordinator stopped");
    }
}

/// Perform one read off the coordinator task and report back
fn spawn_read(
    transport: Arc<dyn Transport>,
    tx: mpsc::Sender<FetchRequest>,
    operation: Operation,
    attempt: AttemptId,
    cancel: CancellationToken,
    read_timeout: Duration,
) {
    tokio::spawn(async move {
        let result = read(transport.as_ref(), &operation, cancel, read_timeout).await;
        // The coordinator may already be gone after teardown
        let _ = tx
            .send(FetchRequest::Completed {
                operation,
                attempt,
                result,
            })
            .await;
    });
}

async fn read(
    transport: &dyn Transport,
    operation: &Operation,
    cancel: CancellationToken,
    read_timeout: Duration,
) -> Result<Vec<Record>, FetchError> {
    let path = operation.resource_path();
    let request = tokio::time::timeout(read_timeout, transport.read(&path, cancel.clone()));

    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(FetchError::Cancelled),
        outcome = request => match outcome {
            Ok(Ok(body)) => operation.decode(body),
            Ok(Err(err)) => Err(err),
            Err(_) => Err(FetchError::Timeout(read_timeout)),
        },
    }
}
