use serde::{Deserialize, Serialize};

/// Remote controller settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ControllerConfig {
    /// Handshake timeout in seconds.
    pub connect_timeout_secs: u64,
    /// Keepalive ping interval in seconds.
    pub ping_interval_secs: u64,
    /// `Origin` header sent on connect.
    pub origin: Option<String>,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            connect_timeout_secs: 10,
            ping_interval_secs: 30,
            origin: Some("app://mobile-controller".into()),
        }
    }
}
