//! JSON encoding and decoding of wire messages.
//!
//! Decoding never panics: every malformed payload maps to a [`DecodeError`]
//! describing what was wrong, so the server can answer with an `error`
//! response and keep the connection open.

use browsesnap_common::ProtocolError;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::command::{Command, COMMAND_TAGS};
use crate::response::{Response, RESPONSE_TAGS};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    #[error("payload is not valid JSON: {0}")]
    Syntax(String),

    #[error("payload is not a JSON object")]
    NotAnObject,

    #[error("missing `type` discriminant")]
    MissingType,

    #[error("`type` discriminant is not a string")]
    InvalidType,

    #[error("unknown message type `{0}`")]
    UnknownType(String),

    #[error("invalid fields for `{tag}`: {reason}")]
    InvalidFields { tag: String, reason: String },
}

impl From<DecodeError> for ProtocolError {
    fn from(err: DecodeError) -> Self {
        ProtocolError::Malformed(err.to_string())
    }
}

/// A message with a closed, stable set of wire tags.
pub trait WireMessage: Serialize + DeserializeOwned {
    const TAGS: &'static [&'static str];

    /// Encode as a compact JSON string.
    fn encode(&self) -> String {
        // Wire messages hold only strings, integers, booleans and string-keyed maps.
        serde_json::to_string(self).expect("wire messages always serialize")
    }
}

impl WireMessage for Command {
    const TAGS: &'static [&'static str] = &COMMAND_TAGS;
}

impl WireMessage for Response {
    const TAGS: &'static [&'static str] = &RESPONSE_TAGS;
}

/// Decode a controller command from raw frame bytes.
pub fn decode_command(bytes: &[u8]) -> Result<Command, DecodeError> {
    decode(bytes)
}

/// Decode a display response from raw frame bytes.
pub fn decode_response(bytes: &[u8]) -> Result<Response, DecodeError> {
    decode(bytes)
}

fn decode<T: WireMessage>(bytes: &[u8]) -> Result<T, DecodeError> {
    let value: Value =
        serde_json::from_slice(bytes).map_err(|e| DecodeError::Syntax(e.to_string()))?;

    let tag = match value.as_object().ok_or(DecodeError::NotAnObject)?.get("type") {
        Some(Value::String(tag)) => tag.clone(),
        Some(_) => return Err(DecodeError::InvalidType),
        None => return Err(DecodeError::MissingType),
    };
    if !T::TAGS.contains(&tag.as_str()) {
        return Err(DecodeError::UnknownType(tag));
    }

    serde_json::from_value(value).map_err(|e| DecodeError::InvalidFields {
        tag,
        reason: e.to_string(),
    })
}
