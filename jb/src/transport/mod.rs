//! Transport to the job board REST API
//!
//! The coordinator only knows resource paths. Base URL, bearer token and
//! default timeout belong to the transport and are fixed before the
//! coordinator ever runs.

use async_trait::async_trait;
use serde_json::Value;
use tokio_util::sync::CancellationToken;

mod error;
mod http;

pub use error::FetchError;
pub use http::HttpTransport;

/// HTTP verbs used by mutations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteMethod {
    Post,
    Put,
    Delete,
}

/// Remote access to the API
///
/// Reads carry a cancellation token; a transport should abort the request when
/// it fires, but callers never rely on it doing so.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Fetch a resource and return its decoded JSON body
    async fn read(&self, path: &str, cancel: CancellationToken) -> Result<Value, FetchError>;

    /// Send a mutation and return the decoded JSON body of the response
    async fn write(&self, method: WriteMethod, path: &str, body: Option<Value>) -> Result<Value, FetchError>;
}
