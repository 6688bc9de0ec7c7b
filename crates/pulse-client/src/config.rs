//! Client configuration
//!
//! Timeouts follow the shape of the backend deployment: unary calls are
//! bounded, the event stream is not (unless an idle limit is configured).

use serde::{Deserialize, Serialize};
use std::time::Duration;

fn default_base_url() -> String {
    "http://localhost:8000".to_string()
}
fn default_connect_timeout() -> u64 {
    30_000
}
fn default_request_timeout() -> u64 {
    120_000
}

/// Configuration for [`crate::PulseClient`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Backend origin, e.g. `https://complain.sg`.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Connect timeout for all requests (milliseconds).
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout: u64,

    /// Overall timeout for unary requests (milliseconds). Streaming
    /// subscriptions are never bounded by this.
    #[serde(default = "default_request_timeout")]
    pub request_timeout: u64,

    /// Maximum time to wait between stream reads (milliseconds). `None`
    /// waits indefinitely for the backend, matching the original client.
    #[serde(default)]
    pub idle_timeout: Option<u64>,

    /// Speak the superseded raw-text sentinel protocol instead of the
    /// task + SSE protocol. Only for backends that predate task streaming.
    #[serde(default)]
    pub legacy_sentinel: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            connect_timeout: default_connect_timeout(),
            request_timeout: default_request_timeout(),
            idle_timeout: None,
            legacy_sentinel: false,
        }
    }
}

impl ClientConfig {
    /// Config pointing at the given origin, everything else default.
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout)
    }

    pub fn idle_timeout(&self) -> Option<Duration> {
        self.idle_timeout.map(Duration::from_millis)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ClientConfig::default();
        assert_eq!(config.base_url, "http://localhost:8000");
        assert_eq!(config.connect_timeout(), Duration::from_secs(30));
        assert!(config.idle_timeout().is_none());
        assert!(!config.legacy_sentinel);
    }

    #[test]
    fn test_partial_deserialize() {
        let config: ClientConfig =
            serde_json::from_str(r#"{"base_url":"https://complain.sg","idle_timeout":5000}"#)
                .unwrap();
        assert_eq!(config.base_url, "https://complain.sg");
        assert_eq!(config.idle_timeout(), Some(Duration::from_secs(5)));
        assert_eq!(config.request_timeout(), Duration::from_secs(120));
    }
}
