//! Pairing bootstrap: what a display advertises so a controller can reach it.
//!
//! The canonical payload is a small JSON object, shown as a QR code on the
//! display. The older `browsesnap://pair?ip=..&pin=..&name=..` URI is still
//! accepted when parsing.

use std::fmt;

use browsesnap_common::DeviceId;
use serde::{Deserialize, Serialize};

use crate::security::{generate_pin, generate_token};

pub const DEFAULT_PORT: u16 = 8888;

const LEGACY_SCHEME: &str = "browsesnap";
const LEGACY_HOST: &str = "pair";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PairingPayloadError {
    #[error("pairing payload is neither JSON nor a browsesnap:// URI")]
    UnrecognizedFormat,

    #[error("invalid pairing JSON: {0}")]
    InvalidJson(String),

    #[error("pairing URI is missing `{0}`")]
    MissingField(&'static str),

    #[error("invalid port `{0}`")]
    InvalidPort(String),
}

/// Everything a controller needs to open a session with a display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PairingPayload {
    pub ip: String,
    #[serde(default = "default_port")]
    pub port: u16,
    pub pin: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

impl PairingPayload {
    pub fn to_json(&self) -> String {
        serde_json::json!(self).to_string()
    }

    /// Parse either the canonical JSON or the legacy URI form.
    pub fn parse(input: &str) -> Result<Self, PairingPayloadError> {
        let input = input.trim();
        if input.starts_with('{') {
            let payload: Self = serde_json::from_str(input)
                .map_err(|e| PairingPayloadError::InvalidJson(e.to_string()))?;
            if payload.ip.is_empty() {
                return Err(PairingPayloadError::MissingField("ip"));
            }
            if payload.pin.is_empty() {
                return Err(PairingPayloadError::MissingField("pin"));
            }
            return Ok(payload);
        }
        Self::parse_legacy_uri(input)
    }

    fn parse_legacy_uri(input: &str) -> Result<Self, PairingPayloadError> {
        let uri = url::Url::parse(input).map_err(|_| PairingPayloadError::UnrecognizedFormat)?;
        if uri.scheme() != LEGACY_SCHEME || uri.host_str() != Some(LEGACY_HOST) {
            return Err(PairingPayloadError::UnrecognizedFormat);
        }

        let (mut ip, mut pin, mut name, mut port) = (None, None, None, None);
        for (key, value) in uri.query_pairs() {
            match key.as_ref() {
                "ip" => ip = Some(value.into_owned()),
                "pin" => pin = Some(value.into_owned()),
                "name" => name = Some(value.into_owned()),
                "port" => port = Some(value.into_owned()),
                _ => {}
            }
        }

        let port = match port {
            Some(raw) => raw
                .parse()
                .ok()
                .filter(|p| *p != 0)
                .ok_or(PairingPayloadError::InvalidPort(raw))?,
            None => DEFAULT_PORT,
        };

        Ok(Self {
            ip: ip
                .filter(|s| !s.is_empty())
                .ok_or(PairingPayloadError::MissingField("ip"))?,
            port,
            pin: pin
                .filter(|s| !s.is_empty())
                .ok_or(PairingPayloadError::MissingField("pin"))?,
            name: name.filter(|s| !s.is_empty()),
        })
    }

    /// WebSocket endpoint of the advertised display.
    pub fn ws_url(&self) -> String {
        format!("ws://{}:{}", self.ip, self.port)
    }
}

/// Credentials a display holds for its lifetime.
///
/// The PIN is never rotated, so anyone who saw it once can pair again
/// until the display restarts.
#[derive(Clone)]
pub struct PairingSession {
    pub pin: String,
    pub token: String,
    pub display_name: String,
    pub ip_address: String,
    pub port: u16,
    pub device_id: DeviceId,
}

impl PairingSession {
    /// Fresh PIN, token and device id for a display reachable at `ip:port`.
    pub fn generate(
        display_name: impl Into<String>,
        ip_address: impl Into<String>,
        port: u16,
    ) -> Self {
        Self {
            pin: generate_pin(),
            token: generate_token(),
            display_name: display_name.into(),
            ip_address: ip_address.into(),
            port,
            device_id: DeviceId::new(),
        }
    }

    /// What gets encoded into the QR code. Carries the PIN, never the token.
    pub fn payload(&self) -> PairingPayload {
        PairingPayload {
            ip: self.ip_address.clone(),
            port: self.port,
            pin: self.pin.clone(),
            name: Some(self.display_name.clone()),
        }
    }
}

impl fmt::Debug for PairingSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PairingSession")
            .field("pin", &"[REDACTED]")
            .field("token", &"[REDACTED]")
            .field("display_name", &self.display_name)
            .field("ip_address", &self.ip_address)
            .field("port", &self.port)
            .field("device_id", &self.device_id)
            .finish()
    }
}
