//! Shared result cache and read-only subscriptions

use std::sync::Arc;

use eyre::{Result, eyre};
use tokio::sync::watch;
use tracing::debug;

use super::operation::Operation;
use crate::domain::Record;

/// Last-known-good result for one operation, plus status flags
#[derive(Debug, Clone, Default)]
pub struct CacheEntry {
    /// Records of the latest successful read, shared by every observer
    pub records: Arc<Vec<Record>>,
    pub loading: bool,
    pub error: Option<String>,
}

/// Writer side of one cache entry; owned by the coordinator
#[derive(Debug)]
pub(crate) struct CacheSlot {
    tx: watch::Sender<CacheEntry>,
}

impl CacheSlot {
    pub(crate) fn new() -> Self {
        let (tx, _) = watch::channel(CacheEntry::default());
        Self { tx }
    }

    pub(crate) fn subscribe(&self, operation: Operation) -> Subscription {
        Subscription {
            operation,
            rx: self.tx.subscribe(),
        }
    }

    pub(crate) fn mark_loading(&self) {
        self.tx.send_modify(|entry| entry.loading = true);
    }

    /// Replace records with exactly `records`, clearing loading and error
    pub(crate) fn store(&self, records: Vec<Record>) {
        let records = Arc::new(records);
        self.tx.send_modify(move |entry| {
            entry.records = records;
            entry.loading = false;
            entry.error = None;
        });
    }

    pub(crate) fn fail(&self, message: String) {
        self.tx.send_modify(move |entry| {
            entry.error = Some(message);
            entry.loading = false;
        });
    }

    /// Clear loading without touching records or error
    pub(crate) fn settle(&self) {
        self.tx.send_modify(|entry| entry.loading = false);
    }

    pub(crate) fn prepend(&self, record: Record) {
        self.tx.send_modify(move |entry| {
            let mut records = Vec::with_capacity(entry.records.len() + 1);
            records.push(record);
            records.extend(entry.records.iter().cloned());
            entry.records = Arc::new(records);
        });
    }
}

/// Read-only view of one operation's cache entry
#[derive(Debug, Clone)]
pub struct Subscription {
    operation: Operation,
    rx: watch::Receiver<CacheEntry>,
}

impl Subscription {
    pub fn operation(&self) -> &Operation {
        &self.operation
    }

    /// Current value of the entry
    pub fn snapshot(&self) -> CacheEntry {
        self.rx.borrow().clone()
    }

    /// Wait for the next change and return the new value
    pub async fn changed(&mut self) -> Result<CacheEntry> {
        debug!(operation = %self.operation, "Subscription::changed: called");
        self.rx
            .changed()
            .await
            .map_err(|_| eyre!("Coordinator stopped while waiting on {}", self.operation))?;
        Ok(self.rx.borrow_and_update().clone())
    }

    /// Wait until the entry satisfies `predicate`, checking the current value first
    pub async fn wait_for(&mut self, predicate: impl FnMut(&CacheEntry) -> bool) -> Result<CacheEntry> {
        debug!(operation = %self.operation, "Subscription::wait_for: called");
        let entry = self
            .rx
            .wait_for(predicate)
            .await
            .map_err(|_| eyre!("Coordinator stopped while waiting on {}", self.operation))?;
        Ok(entry.clone())
    }
}
