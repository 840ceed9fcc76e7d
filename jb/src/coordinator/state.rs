//! Per-operation state machine
//!
//! Each key is either `Idle` or `Loading` one attempt. A key returns to `Idle`
//! after every attempt, whether it succeeded, failed or was cancelled.

use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// Identifies one issued read
pub type AttemptId = u64;

/// Where a key sits in its lifecycle
#[derive(Debug, Clone, Default)]
pub enum Phase {
    #[default]
    Idle,
    Loading {
        attempt: AttemptId,
        cancel: CancellationToken,
    },
}

/// Outcome of checking whether a new read may be issued
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gate {
    Open,
    /// Last issue was too recent
    RateLimited { remaining: Duration },
    /// An attempt is still outstanding
    InFlight,
}

/// An attempt replaced by a newer one for the same key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Superseded {
    pub attempt: AttemptId,
    /// False if its handle had already been triggered
    pub triggered: bool,
}

/// State of a single operation key
#[derive(Debug, Default)]
pub struct KeyState {
    phase: Phase,
    last_issued: Option<Instant>,
}

impl KeyState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> &Phase {
        &self.phase
    }

    pub fn is_loading(&self) -> bool {
        matches!(self.phase, Phase::Loading { .. })
    }

    pub fn last_issued(&self) -> Option<Instant> {
        self.last_issued
    }

    /// Current attempt, if loading
    pub fn attempt(&self) -> Option<AttemptId> {
        match &self.phase {
            Phase::Loading { attempt, .. } => Some(*attempt),
            Phase::Idle => None,
        }
    }

    /// Rate gate first, then single-flight
    pub fn gate(&self, now: Instant, min_interval: Duration) -> Gate {
        if let Some(last) = self.last_issued {
            let elapsed = now.saturating_duration_since(last);
            if elapsed < min_interval {
                return Gate::RateLimited {
                    remaining: min_interval - elapsed,
                };
            }
        }
        if self.is_loading() {
            return Gate::InFlight;
        }
        Gate::Open
    }

    /// Move to `Loading` with a fresh attempt
    ///
    /// Any attempt still in flight is superseded and its handle triggered.
    pub fn begin(&mut self, attempt: AttemptId, cancel: CancellationToken, now: Instant) -> Option<Superseded> {
        let previous = match std::mem::replace(&mut self.phase, Phase::Loading { attempt, cancel }) {
            Phase::Loading {
                attempt: previous,
                cancel: handle,
            } => Some(Superseded {
                attempt: previous,
                triggered: trigger(&handle),
            }),
            Phase::Idle => None,
        };
        self.last_issued = Some(now);
        previous
    }

    /// Return to `Idle` if `attempt` is the one in flight
    ///
    /// Yields the settled attempt's handle so the caller can tell whether it
    /// was cancelled. `None` means the completion is stale and must be ignored.
    pub fn settle(&mut self, attempt: AttemptId) -> Option<CancellationToken> {
        match &self.phase {
            Phase::Loading { attempt: current, .. } if *current == attempt => {}
            _ => return None,
        }
        match std::mem::take(&mut self.phase) {
            Phase::Loading { cancel, .. } => Some(cancel),
            Phase::Idle => None,
        }
    }

    /// Trigger the in-flight attempt's handle; the key stays `Loading` until settled
    ///
    /// Returns false if nothing was in flight or the handle had already fired.
    pub fn cancel(&self) -> bool {
        match &self.phase {
            Phase::Loading { cancel, .. } => trigger(cancel),
            Phase::Idle => false,
        }
    }
}

/// Fire a handle at most once
fn trigger(cancel: &CancellationToken) -> bool {
    if cancel.is_cancelled() {
        return false;
    }
    cancel.cancel();
    true
}
