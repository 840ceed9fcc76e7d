//! Fetch coordinator for shared list data
//!
//! Every list the client shows is keyed by an [`Operation`]. The coordinator
//! guarantees for each key:
//! - **Single flight:** at most one read outstanding
//! - **Rate gate:** no new read within the minimum interval of the last one issued
//! - **Cancellation:** a cancelled read never touches the cache or raises a notification
//!
//! Results land in a per-key cache entry that any number of consumers observe
//! through a [`Subscription`].

mod cache;
mod config;
mod core;
mod handle;
mod messages;
mod operation;
mod state;

pub use cache::{CacheEntry, Subscription};
pub use config::FetchConfig;
pub use core::FetchCoordinator;
pub use handle::CoordinatorHandle;
pub use messages::{FetchMetrics, FetchRequest, RequestMode};
pub use operation::Operation;
pub use state::{AttemptId, Gate, KeyState, Phase, Superseded};

#[cfg(test)]
pub(crate) use core::mock;
