//! Display → controller replies.

use std::collections::BTreeMap;

use browsesnap_common::{now_millis, CommandError, DispatchError, ProtocolError};
use serde::{Deserialize, Serialize};

/// Every wire tag a [`ResponseKind`] can carry.
pub const RESPONSE_TAGS: [&str; 5] = [
    "command_ack",
    "error",
    "pairing_success",
    "status_update",
    "pong",
];

/// A reply plus its outcome flag and creation time.
///
/// On decode, a missing `success` takes the variant's natural value
/// (`false` for `error`, `true` otherwise) and a missing `timestamp` takes
/// the receiver's clock.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "ResponseWire")]
pub struct Response {
    #[serde(flatten)]
    pub kind: ResponseKind,
    pub success: bool,
    pub timestamp: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum ResponseKind {
    CommandAck {
        command_type: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        message: Option<String>,
    },
    Error {
        error_code: String,
        error_message: String,
    },
    PairingSuccess {
        device_id: String,
        device_name: String,
        auth_token: String,
    },
    StatusUpdate {
        status: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        details: Option<BTreeMap<String, String>>,
    },
    Pong,
}

#[derive(Deserialize)]
struct ResponseWire {
    #[serde(flatten)]
    kind: ResponseKind,
    #[serde(default)]
    success: Option<bool>,
    #[serde(default)]
    timestamp: Option<i64>,
}

impl From<ResponseWire> for Response {
    fn from(wire: ResponseWire) -> Self {
        let success = wire.success.unwrap_or_else(|| wire.kind.default_success());
        Self {
            kind: wire.kind,
            success,
            timestamp: wire.timestamp.unwrap_or_else(now_millis),
        }
    }
}

impl ResponseKind {
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::CommandAck { .. } => "command_ack",
            Self::Error { .. } => "error",
            Self::PairingSuccess { .. } => "pairing_success",
            Self::StatusUpdate { .. } => "status_update",
            Self::Pong => "pong",
        }
    }

    fn default_success(&self) -> bool {
        !matches!(self, Self::Error { .. })
    }
}

impl Response {
    /// Stamp `kind` with the current time and its natural success flag.
    pub fn new(kind: ResponseKind) -> Self {
        let success = kind.default_success();
        Self {
            kind,
            success,
            timestamp: now_millis(),
        }
    }

    pub fn command_ack(
        command_type: impl Into<String>,
        success: bool,
        message: Option<String>,
    ) -> Self {
        Self {
            success,
            ..Self::new(ResponseKind::CommandAck {
                command_type: command_type.into(),
                message,
            })
        }
    }

    pub fn error(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(ResponseKind::Error {
            error_code: code.into(),
            error_message: message.into(),
        })
    }

    pub fn pairing_success(
        device_id: impl Into<String>,
        device_name: impl Into<String>,
        auth_token: impl Into<String>,
    ) -> Self {
        Self::new(ResponseKind::PairingSuccess {
            device_id: device_id.into(),
            device_name: device_name.into(),
            auth_token: auth_token.into(),
        })
    }

    pub fn status(status: impl Into<String>, details: Option<BTreeMap<String, String>>) -> Self {
        Self::new(ResponseKind::StatusUpdate {
            status: status.into(),
            details,
        })
    }

    pub fn pong() -> Self {
        Self::new(ResponseKind::Pong)
    }

    pub fn is_error(&self) -> bool {
        matches!(self.kind, ResponseKind::Error { .. })
    }

    /// `errorCode` of an error response.
    pub fn error_code(&self) -> Option<&str> {
        match &self.kind {
            ResponseKind::Error { error_code, .. } => Some(error_code),
            _ => None,
        }
    }
}

impl From<&ProtocolError> for Response {
    fn from(err: &ProtocolError) -> Self {
        Self::error(err.code(), err.wire_message())
    }
}

impl From<&CommandError> for Response {
    fn from(err: &CommandError) -> Self {
        Self::error(err.code(), err.to_string())
    }
}

impl From<&DispatchError> for Response {
    fn from(err: &DispatchError) -> Self {
        Self::error(err.code(), err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_defaults_to_unsuccessful() {
        let resp = Response::error("INVALID_PIN", "invalid pin");
        assert!(!resp.success);
        assert!(resp.is_error());
        assert_eq!(resp.error_code(), Some("INVALID_PIN"));
    }

    #[test]
    fn other_variants_default_to_successful() {
        assert!(Response::pong().success);
        assert!(Response::status("connected", None).success);
        assert!(Response::pairing_success("tv", "TV", "tok").success);
    }

    #[test]
    fn command_ack_carries_explicit_success() {
        let ack = Response::command_ack("pause", false, Some("rejected".into()));
        assert!(!ack.success);
        let value = serde_json::to_value(&ack).unwrap();
        assert_eq!(value["type"], "command_ack");
        assert_eq!(value["commandType"], "pause");
        assert_eq!(value["success"], false);
        assert_eq!(value["message"], "rejected");
    }

    #[test]
    fn missing_success_takes_variant_default() {
        let resp: Response = serde_json::from_str(
            r#"{"type":"error","errorCode":"X","errorMessage":"y","timestamp":5}"#,
        )
        .unwrap();
        assert!(!resp.success);
        assert_eq!(resp.timestamp, 5);

        let resp: Response = serde_json::from_str(r#"{"type":"pong"}"#).unwrap();
        assert!(resp.success);
        assert!(resp.timestamp > 0);
    }

    #[test]
    fn status_details_serialize_as_object() {
        let mut details = BTreeMap::new();
        details.insert("url".to_string(), "https://example.com".to_string());
        let resp = Response::status("browsing", Some(details));
        let value = serde_json::to_value(&resp).unwrap();
        assert_eq!(value["details"]["url"], "https://example.com");
    }

    #[test]
    fn errors_convert_to_wire_codes() {
        let resp = Response::from(&ProtocolError::MessageTooLarge {
            size: 70_000,
            limit: 65_536,
        });
        assert_eq!(resp.error_code(), Some("MESSAGE_TOO_LARGE"));
        assert!(matches!(
            resp.kind,
            ResponseKind::Error { ref error_message, .. } if error_message == "message too large"
        ));

        let resp = Response::from(&CommandError::InvalidPin);
        assert_eq!(resp.error_code(), Some("INVALID_PIN"));

        let resp = Response::from(&DispatchError::Surface("gone".into()));
        assert_eq!(resp.error_code(), Some("DISPATCH_FAILED"));
    }
}
