use serde::{Deserialize, Serialize};

/// Display server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    /// Interface the WebSocket server binds to.
    pub bind_address: String,
    /// Port the WebSocket server listens on (valid range: 1-65535).
    pub port: u16,
    /// Human-readable name shown in the pairing payload.
    pub name: String,
    /// Origins accepted on connect. Matched as substrings of the `Origin` header.
    pub allowed_origins: Vec<String>,
    /// Accept the pairing PIN as a bearer credential so a fresh controller
    /// can connect and send `register`.
    pub allow_pin_bootstrap: bool,
    /// Largest accepted payload in bytes (valid range: 1024-1048576).
    pub max_message_bytes: usize,
    /// Push a `status_update` to every controller after each state change.
    pub broadcast_status: bool,
    /// Volume used for the first video (valid range: 0-100).
    pub default_volume: u8,
    /// Print the pairing QR code on startup.
    pub show_qr: bool,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0".into(),
            port: 8888,
            name: "BrowseSnap Display".into(),
            allowed_origins: vec![
                "app://mobile-controller".into(),
                "localhost".into(),
                "127.0.0.1".into(),
            ],
            allow_pin_bootstrap: true,
            max_message_bytes: 65_536,
            broadcast_status: true,
            default_volume: 50,
            show_qr: true,
        }
    }
}
