//! Fetch coordinator configuration

use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

/// Fetch coordinator configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchConfig {
    /// Minimum time between two issued reads of the same operation
    #[serde(rename = "min-interval-ms", default = "default_min_interval_ms")]
    pub min_interval_ms: u64,

    /// Upper bound on a single read, in milliseconds
    #[serde(rename = "read-timeout-ms", default = "default_read_timeout_ms")]
    pub read_timeout_ms: u64,

    /// Channel buffer size for coordinator requests
    #[serde(rename = "channel-buffer", default = "default_channel_buffer")]
    pub channel_buffer: usize,
}

fn default_min_interval_ms() -> u64 {
    debug!("default_min_interval_ms: called");
    2000
}

fn default_read_timeout_ms() -> u64 {
    debug!("default_read_timeout_ms: called");
    10_000
}

fn default_channel_buffer() -> usize {
    debug!("default_channel_buffer: called");
    256
}

impl Default for FetchConfig {
    fn default() -> Self {
        debug!("FetchConfig::default: called");
        Self {
            min_interval_ms: 2000,
            read_timeout_ms: 10_000,
            channel_buffer: 256,
        }
    }
}

impl FetchConfig {
    pub fn min_interval(&self) -> Duration {
        Duration::from_millis(self.min_interval_ms)
    }

    pub fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.read_timeout_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = FetchConfig::default();
        assert_eq!(config.min_interval_ms, 2000);
        assert_eq!(config.read_timeout_ms, 10_000);
        assert_eq!(config.channel_buffer, 256);
    }

    #[test]
    fn test_durations() {
        let config = FetchConfig {
            min_interval_ms: 250,
            read_timeout_ms: 1500,
            ..Default::default()
        };
        assert_eq!(config.min_interval(), Duration::from_millis(250));
        assert_eq!(config.read_timeout(), Duration::from_millis(1500));
    }

    #[test]
    fn test_empty_yaml_uses_defaults() {
        let config: FetchConfig = serde_yaml::from_str("{}").unwrap();
        assert_eq!(config.min_interval_ms, 2000);
        assert_eq!(config.read_timeout_ms, 10_000);
    }
}
