//! Transport error types

use std::time::Duration;
use thiserror::Error;

/// Errors that can occur talking to the job board API
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FetchError {
    #[error("Request cancelled")]
    Cancelled,

    #[error("Network error: {0}")]
    Network(String),

    #[error("Insufficient resources: {0}")]
    ResourceExhausted(String),

    #[error("HTTP {status}: {}", .message.as_deref().unwrap_or("request failed"))]
    Http { status: u16, message: Option<String> },

    #[error("Timeout after {0:?}")]
    Timeout(Duration),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

impl FetchError {
    /// Check if the attempt was cancelled rather than failed
    pub fn is_cancelled(&self) -> bool {
        matches!(self, FetchError::Cancelled)
    }

    /// Connectivity hiccups that are expected under rapid navigation
    ///
    /// These are recorded on the cache entry but never shown to the user.
    pub fn is_transient(&self) -> bool {
        matches!(self, FetchError::Network(_) | FetchError::ResourceExhausted(_))
    }

    /// Message supplied by the server, if it sent one
    pub fn server_message(&self) -> Option<&str> {
        match self {
            FetchError::Http { message, .. } => message.as_deref(),
            _ => None,
        }
    }

    /// Text to show the user: the server's message, else the fallback
    pub fn user_message(&self, fallback: &str) -> String {
        self.server_message().unwrap_or(fallback).to_string()
    }
}
