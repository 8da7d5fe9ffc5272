use std::fmt;

/// Lifecycle of a controller session.
///
/// `Disconnected → Connecting → Connected → Disconnecting → Disconnected`,
/// with any transport failure landing in `Error`. Nothing reconnects on its
/// own; leaving `Error` takes another `connect`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ConnectionState {
    #[default]
    Disconnected,
    Connecting,
    Connected,
    Disconnecting,
    Error(String),
}

impl ConnectionState {
    pub fn is_connected(&self) -> bool {
        matches!(self, Self::Connected)
    }

    /// States from which `connect` may start a new session.
    pub fn can_connect(&self) -> bool {
        matches!(self, Self::Disconnected | Self::Error(_))
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Disconnected => f.write_str("disconnected"),
            Self::Connecting => f.write_str("connecting"),
            Self::Connected => f.write_str("connected"),
            Self::Disconnecting => f.write_str("disconnecting"),
            Self::Error(msg) => write!(f, "error: {msg}"),
        }
    }
}
