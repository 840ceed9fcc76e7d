//! CoordinatorHandle - client interface for requesting shared data

use eyre::{Result, eyre};
use tokio::sync::{mpsc, oneshot};
use tracing::debug;

use super::cache::Subscription;
use super::messages::{FetchMetrics, FetchRequest, RequestMode};
use super::operation::Operation;
use crate::domain::Record;

/// Handle for consumers to interact with the fetch coordinator
///
/// Cheap to clone; pass one to every consumer that needs shared list data.
#[derive(Clone)]
pub struct CoordinatorHandle {
    tx: mpsc::Sender<FetchRequest>,
}

impl CoordinatorHandle {
    pub(crate) fn new(tx: mpsc::Sender<FetchRequest>) -> Self {
        debug!("CoordinatorHandle::new: called");
        Self { tx }
    }

    async fn send(&self, request: FetchRequest) -> Result<()> {
        self.tx
            .send(request)
            .await
            .map_err(|_| eyre!("Coordinator channel closed"))
    }

    /// Ask for fresh data; the result arrives through subscriptions
    ///
    /// Dropped silently by the coordinator when the operation was issued too
    /// recently or is already in flight.
    pub async fn request_data(&self, operation: Operation) -> Result<()> {
        debug!(%operation, "CoordinatorHandle::request_data: called");
        self.send(FetchRequest::Request {
            operation,
            mode: RequestMode::Gated,
        })
        .await
    }

    /// Issue a read regardless of the gates, superseding one in flight
    pub async fn refresh(&self, operation: Operation) -> Result<()> {
        debug!(%operation, "CoordinatorHandle::refresh: called");
        self.send(FetchRequest::Request {
            operation,
            mode: RequestMode::Refresh,
        })
        .await
    }

    /// Cancel the operation's in-flight attempt, if any
    pub async fn cancel(&self, operation: Operation) -> Result<()> {
        debug!(%operation, "CoordinatorHandle::cancel: called");
        self.send(FetchRequest::Cancel { operation }).await
    }

    /// Read-only view of an operation's cache entry
    pub async fn subscribe(&self, operation: Operation) -> Result<Subscription> {
        debug!(%operation, "CoordinatorHandle::subscribe: called");
        let (reply_tx, reply_rx) = oneshot::channel();
        self.send(FetchRequest::Subscribe { operation, reply_tx }).await?;
        reply_rx.await.map_err(|_| eyre!("Coordinator shutdown before reply"))
    }

    pub(crate) async fn prepend(&self, operation: Operation, record: Record) -> Result<()> {
        debug!(%operation, record_id = %record.id(), "CoordinatorHandle::prepend: called");
        self.send(FetchRequest::Prepend { operation, record }).await
    }

    /// Get current coordinator metrics
    pub async fn metrics(&self) -> Result<FetchMetrics> {
        debug!("CoordinatorHandle::metrics: called");
        let (reply_tx, reply_rx) = oneshot::channel();
        self.send(FetchRequest::GetMetrics { reply_tx }).await?;
        reply_rx.await.map_err(|_| eyre!("Coordinator shutdown before reply"))
    }

    /// Cancel everything in flight, stop the coordinator and return its final metrics
    pub async fn teardown(&self) -> Result<FetchMetrics> {
        debug!("CoordinatorHandle::teardown: called");
        let (reply_tx, reply_rx) = oneshot::channel();
        self.send(FetchRequest::Teardown {
            reply_tx: Some(reply_tx),
        })
        .await?;
        reply_rx.await.map_err(|_| eyre!("Coordinator stopped before reply"))
    }

    /// Best-effort teardown for contexts that cannot await
    pub(crate) fn try_teardown(&self) -> bool {
        debug!("CoordinatorHandle::try_teardown: called");
        self.tx.try_send(FetchRequest::Teardown { reply_tx: None }).is_ok()
    }

    /// True once the coordinator task has stopped
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}
