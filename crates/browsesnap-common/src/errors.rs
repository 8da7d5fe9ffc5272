use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("config file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("config parse error: {0}")]
    ParseError(String),

    #[error("config validation error: {0}")]
    ValidationError(String),
}

/// Transport-level failure to establish or keep a session.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConnectionError {
    #[error("invalid display url: {0}")]
    InvalidUrl(String),

    #[error("handshake failed: {0}")]
    Handshake(String),

    #[error("connection timed out after {0}s")]
    Timeout(u64),

    #[error("not connected")]
    NotConnected,

    #[error("transport error: {0}")]
    Transport(String),
}

/// Rejected at accept time. Answered with close code 1008, never a payload.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    #[error("origin not allowed: {0}")]
    OriginRejected(String),

    #[error("missing bearer token")]
    MissingToken,

    #[error("invalid bearer token")]
    InvalidToken,
}

/// Oversized or malformed payload. The connection stays open.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProtocolError {
    #[error("message too large ({size} bytes, limit {limit})")]
    MessageTooLarge { size: usize, limit: usize },

    #[error("invalid command format: {0}")]
    Malformed(String),
}

impl ProtocolError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::MessageTooLarge { .. } => "MESSAGE_TOO_LARGE",
            Self::Malformed(_) => "INVALID_COMMAND",
        }
    }

    /// Short text sent back to the controller.
    pub fn wire_message(&self) -> &'static str {
        match self {
            Self::MessageTooLarge { .. } => "message too large",
            Self::Malformed(_) => "invalid command format",
        }
    }
}

/// A well-formed command the display refuses to act on.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CommandError {
    #[error("invalid pin")]
    InvalidPin,

    #[error("pair with the display first")]
    NotPaired,

    #[error("invalid url: {0}")]
    InvalidUrl(String),
}

impl CommandError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidPin => "INVALID_PIN",
            Self::NotPaired => "NOT_PAIRED",
            Self::InvalidUrl(_) => "INVALID_URL",
        }
    }
}

/// Failure while applying a transition to the display.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DispatchError {
    #[error("display surface failed: {0}")]
    Surface(String),

    #[error("dispatcher is not running")]
    Unavailable,
}

impl DispatchError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::Surface(_) => "DISPATCH_FAILED",
            Self::Unavailable => "DISPATCH_UNAVAILABLE",
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum BrowseSnapError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Connection(#[from] ConnectionError),

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    #[error(transparent)]
    Command(#[from] CommandError),

    #[error(transparent)]
    Dispatch(#[from] DispatchError),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_error_display() {
        let err = ConfigError::FileNotFound(PathBuf::from("/tmp/missing.toml"));
        assert_eq!(err.to_string(), "config file not found: /tmp/missing.toml");

        let err = ConfigError::ParseError("unexpected token".into());
        assert_eq!(err.to_string(), "config parse error: unexpected token");

        let err = ConfigError::ValidationError("display.port = 0".into());
        assert_eq!(err.to_string(), "config validation error: display.port = 0");
    }

    #[test]
    fn protocol_error_codes() {
        let err = ProtocolError::MessageTooLarge {
            size: 70_000,
            limit: 65_536,
        };
        assert_eq!(err.code(), "MESSAGE_TOO_LARGE");
        assert_eq!(err.wire_message(), "message too large");
        assert_eq!(
            err.to_string(),
            "message too large (70000 bytes, limit 65536)"
        );

        let err = ProtocolError::Malformed("missing field `type`".into());
        assert_eq!(err.code(), "INVALID_COMMAND");
        assert_eq!(err.wire_message(), "invalid command format");
    }

    #[test]
    fn command_error_codes() {
        assert_eq!(CommandError::InvalidPin.code(), "INVALID_PIN");
        assert_eq!(CommandError::InvalidPin.to_string(), "invalid pin");
        assert_eq!(CommandError::NotPaired.code(), "NOT_PAIRED");
        assert_eq!(
            CommandError::InvalidUrl("ftp://x".into()).code(),
            "INVALID_URL"
        );
    }

    #[test]
    fn dispatch_error_codes() {
        assert_eq!(DispatchError::Surface("boom".into()).code(), "DISPATCH_FAILED");
        assert_eq!(DispatchError::Unavailable.code(), "DISPATCH_UNAVAILABLE");
    }

    #[test]
    fn browsesnap_error_from_variants() {
        let err: BrowseSnapError = ConfigError::ParseError("bad toml".into()).into();
        assert!(matches!(err, BrowseSnapError::Config(_)));
        assert!(err.to_string().contains("bad toml"));

        let err: BrowseSnapError = AuthError::MissingToken.into();
        assert!(matches!(err, BrowseSnapError::Auth(_)));
        assert_eq!(err.to_string(), "missing bearer token");

        let err: BrowseSnapError = ConnectionError::Timeout(10).into();
        assert_eq!(err.to_string(), "connection timed out after 10s");

        let io_err = std::io::Error::new(std::io::ErrorKind::AddrInUse, "port busy");
        let err: BrowseSnapError = io_err.into();
        assert!(matches!(err, BrowseSnapError::Io(_)));
        assert!(err.to_string().contains("port busy"));
    }
}
