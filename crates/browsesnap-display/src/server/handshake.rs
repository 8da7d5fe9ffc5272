//! Accept-time checks on the upgrade request.

use browsesnap_common::AuthError;
use browsesnap_config::DisplayConfig;
use browsesnap_protocol::security::{parse_bearer, validate_origin, validate_token};
use browsesnap_protocol::PairingSession;
use tokio_tungstenite::tungstenite::handshake::server::Request;
use tokio_tungstenite::tungstenite::http::header;

/// The upgrade headers the display cares about.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HandshakeHeaders {
    pub origin: Option<String>,
    pub authorization: Option<String>,
}

impl HandshakeHeaders {
    pub fn from_request(req: &Request) -> Self {
        let get = |name: header::HeaderName| {
            req.headers()
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string)
        };
        Self {
            origin: get(header::ORIGIN),
            authorization: get(header::AUTHORIZATION),
        }
    }
}

/// Which secret the controller presented.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Credential {
    /// The session token: paired from the first frame.
    Token,
    /// The pairing PIN: may only `register` or `ping` until paired.
    Pin,
}

/// Decide whether a connection may proceed.
///
/// A missing `Origin` is allowed (native controllers do not send one); a
/// present one must match the allow-list.
pub fn authorize(
    headers: &HandshakeHeaders,
    config: &DisplayConfig,
    pairing: &PairingSession,
) -> Result<Credential, AuthError> {
    if let Some(origin) = &headers.origin {
        if !validate_origin(origin, &config.allowed_origins) {
            return Err(AuthError::OriginRejected(origin.clone()));
        }
    }

    let presented = headers
        .authorization
        .as_deref()
        .and_then(parse_bearer)
        .ok_or(AuthError::MissingToken)?;

    if validate_token(presented, &pairing.token) {
        Ok(Credential::Token)
    } else if config.allow_pin_bootstrap && validate_token(presented, &pairing.pin) {
        Ok(Credential::Pin)
    } else {
        Err(AuthError::InvalidToken)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pairing() -> PairingSession {
        PairingSession {
            pin: "4821".into(),
            token: "tok-abc".into(),
            display_name: "Den".into(),
            ip_address: "127.0.0.1".into(),
            port: 8888,
            device_id: "tv-1".to_string().into(),
        }
    }

    fn headers(origin: Option<&str>, authorization: Option<&str>) -> HandshakeHeaders {
        HandshakeHeaders {
            origin: origin.map(String::from),
            authorization: authorization.map(String::from),
        }
    }

    #[test]
    fn token_and_pin_credentials() {
        let config = DisplayConfig::default();
        assert_eq!(
            authorize(&headers(Some("app://mobile-controller"), Some("Bearer tok-abc")), &config, &pairing()),
            Ok(Credential::Token)
        );
        assert_eq!(
            authorize(&headers(None, Some("Bearer 4821")), &config, &pairing()),
            Ok(Credential::Pin)
        );
    }

    #[test]
    fn pin_rejected_when_bootstrap_disabled() {
        let config = DisplayConfig {
            allow_pin_bootstrap: false,
            ..DisplayConfig::default()
        };
        assert_eq!(
            authorize(&headers(None, Some("Bearer 4821")), &config, &pairing()),
            Err(AuthError::InvalidToken)
        );
    }

    #[test]
    fn bad_origin_rejected_before_token() {
        let config = DisplayConfig::default();
        assert_eq!(
            authorize(&headers(Some("http://evil.example"), Some("Bearer tok-abc")), &config, &pairing()),
            Err(AuthError::OriginRejected("http://evil.example".into()))
        );
    }

    #[test]
    fn missing_or_malformed_bearer() {
        let config = DisplayConfig::default();
        assert_eq!(
            authorize(&headers(None, None), &config, &pairing()),
            Err(AuthError::MissingToken)
        );
        assert_eq!(
            authorize(&headers(None, Some("tok-abc")), &config, &pairing()),
            Err(AuthError::MissingToken)
        );
        assert_eq!(
            authorize(&headers(None, Some("Bearer nope")), &config, &pairing()),
            Err(AuthError::InvalidToken)
        );
    }
}
