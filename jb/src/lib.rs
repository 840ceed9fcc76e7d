//! jobboard - job board client
//!
//! Employers post jobs and review applicants; applicants browse jobs and track
//! their applications. Every list is fetched through a single coordinator that
//! keeps reads single-flight, rate limited and cancellable, and shares the
//! latest result with every consumer.
//!
//! # Modules
//!
//! - [`coordinator`] - Fetch coordinator, per-key state machine and result cache
//! - [`board`] - Session object owning the coordinator plus write operations
//! - [`transport`] - REST transport trait and reqwest implementation
//! - [`notify`] - User-facing notifications
//! - [`domain`] - Jobs, applications and their payloads
//! - [`config`] - Configuration types and loading
//! - [`cli`] - Command-line interface

pub mod board;
pub mod cli;
pub mod config;
pub mod coordinator;
pub mod domain;
pub mod notify;
pub mod transport;

// Re-export commonly used types
pub use board::JobBoard;
pub use config::{ApiConfig, Config};
pub use coordinator::{
    CacheEntry, CoordinatorHandle, FetchConfig, FetchCoordinator, FetchMetrics, Operation, Subscription,
};
pub use domain::{Application, ApplicationStatus, Job, JobType, NewApplication, NewJob, Record};
pub use notify::{Level, Notification, NotificationBus, Notifier};
pub use transport::{FetchError, HttpTransport, Transport, WriteMethod};
