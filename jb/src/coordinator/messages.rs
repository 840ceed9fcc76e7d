//! Message types for the fetch coordinator

use serde::{Deserialize, Serialize};
use tokio::sync::oneshot;

use super::cache::Subscription;
use super::operation::Operation;
use super::state::AttemptId;
use crate::domain::Record;
use crate::transport::FetchError;

/// How a request treats the gates
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestMode {
    /// Subject to the rate and single-flight gates
    Gated,
    /// Always issues, superseding any attempt in flight
    Refresh,
}

/// Internal requests to the coordinator task
#[derive(Debug)]
pub enum FetchRequest {
    /// Ask for fresh data for an operation
    Request { operation: Operation, mode: RequestMode },

    /// Cancel the operation's in-flight attempt, if any
    Cancel { operation: Operation },

    /// An attempt finished (internal)
    Completed {
        operation: Operation,
        attempt: AttemptId,
        result: Result<Vec<Record>, FetchError>,
    },

    /// Obtain a read-only view of an operation's cache entry
    Subscribe {
        operation: Operation,
        reply_tx: oneshot::Sender<Subscription>,
    },

    /// Put a freshly created record at the front of an existing entry
    Prepend { operation: Operation, record: Record },

    /// Get current metrics
    GetMetrics { reply_tx: oneshot::Sender<FetchMetrics> },

    /// Cancel everything in flight and stop
    Teardown {
        reply_tx: Option<oneshot::Sender<FetchMetrics>>,
    },
}

/// Coordinator counters
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FetchMetrics {
    pub requests_received: u64,
    pub attempts_issued: u64,
    pub rate_limited: u64,
    pub in_flight_skips: u64,
    pub superseded: u64,
    /// Cancellation handles triggered by the coordinator
    pub cancellations: u64,
    pub succeeded: u64,
    pub failed: u64,
    /// Completions of attempts that were cancelled
    pub cancelled: u64,
    /// Completions that arrived for an attempt no longer current
    pub late_discarded: u64,
    pub notifications_raised: u64,
    pub tracked_operations: usize,
}
