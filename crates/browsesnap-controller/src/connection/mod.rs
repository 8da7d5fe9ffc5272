//! Controller connection manager.
//!
//! One live session at a time. The write half sits behind a
//! `tokio::sync::Mutex` shared by `send_command`, `disconnect` and the
//! keepalive task; the read half is drained by a background task that
//! publishes every decoded reply.

mod session;


use std::sync::Arc;
use std::time::Duration;

use browsesnap_common::ConnectionError;
use browsesnap_config::ControllerConfig;
use browsesnap_protocol::{Command, Response, WireMessage};
use futures_util::SinkExt;
use tokio::sync::{broadcast, watch, Mutex};
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::{header, HeaderValue};
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, info, warn};

use crate::state::ConnectionState;
use session::{Session, Shared, WsStream};

/// Capacity of the reply feed. Slow feed readers skip ahead; the latest
/// reply is always available through [`ControllerConnection::subscribe_responses`].
const RESPONSE_FEED_CAPACITY: usize = 64;

#[derive(Debug, Clone)]
pub struct ConnectOptions {
    pub connect_timeout: Duration,
    pub ping_interval: Duration,
    /// Sent as the `Origin` header when set.
    pub origin: Option<String>,
}

impl From<&ControllerConfig> for ConnectOptions {
    fn from(config: &ControllerConfig) -> Self {
        Self {
            connect_timeout: Duration::from_secs(config.connect_timeout_secs),
            ping_interval: Duration::from_secs(config.ping_interval_secs),
            origin: config.origin.clone(),
        }
    }
}

impl Default for ConnectOptions {
    fn default() -> Self {
        Self::from(&ControllerConfig::default())
    }
}

pub struct ControllerConnection {
    options: ConnectOptions,
    shared: Arc<Shared>,
    session: Mutex<Option<Session>>,
}

impl ControllerConnection {
    pub fn new(options: ConnectOptions) -> Self {
        let (feed, _) = broadcast::channel(RESPONSE_FEED_CAPACITY);
        Self {
            options,
            shared: Arc::new(Shared {
                state: watch::channel(ConnectionState::Disconnected).0,
                latest: watch::channel(None).0,
                feed,
            }),
            session: Mutex::new(None),
        }
    }

    pub fn from_config(config: &ControllerConfig) -> Self {
        Self::new(ConnectOptions::from(config))
    }

    /// Open a session to `url` (`ws://host:port`).
    ///
    /// Returns the resulting state: `Connected` on success, `Error` on
    /// failure or timeout. Calling this while a session is live or being
    /// established changes nothing and returns the current state.
    pub async fn connect(&self, url: &str, token: Option<&str>) -> ConnectionState {
        let claimed = self.shared.state.send_if_modified(|state| {
            if state.can_connect() {
                *state = ConnectionState::Connecting;
                true
            } else {
                false
            }
        });
        if !claimed {
            let current = self.state();
            warn!(state = %current, "connect ignored, session already active");
            return current;
        }

        info!(url = %url, "Connecting to display");
        let ws = match self.open(url, token).await {
            Ok(ws) => ws,
            Err(e) => {
                warn!(url = %url, error = %e, "Failed to connect to display");
                if !self.leave_connecting(ConnectionState::Error(e.to_string())) {
                    debug!("handshake failed after disconnect");
                }
                return self.state();
            }
        };

        let mut slot = self.session.lock().await;
        // A disconnect() during the handshake wins.
        if !self.leave_connecting(ConnectionState::Connected) {
            debug!("handshake finished after disconnect, dropping session");
            return self.state();
        }

        *slot = Some(Session::start(
            ws,
            Arc::clone(&self.shared),
            self.options.ping_interval,
        ));
        info!(url = %url, "Connected to display");
        ConnectionState::Connected
    }

    /// Move out of `Connecting`, unless a disconnect already moved us on.
    fn leave_connecting(&self, next: ConnectionState) -> bool {
        self.shared.state.send_if_modified(|state| {
            if *state == ConnectionState::Connecting {
                *state = next;
                true
            } else {
                false
            }
        })
    }

    async fn open(&self, url: &str, token: Option<&str>) -> Result<WsStream, ConnectionError> {
        let parsed =
            url::Url::parse(url).map_err(|e| ConnectionError::InvalidUrl(format!("{url}: {e}")))?;
        if parsed.scheme() != "ws" {
            return Err(ConnectionError::InvalidUrl(format!(
                "{url}: expected a ws:// url"
            )));
        }

        let mut request = url
            .into_client_request()
            .map_err(|e| ConnectionError::InvalidUrl(e.to_string()))?;
        let headers = request.headers_mut();
        if let Some(token) = token {
            let value = HeaderValue::from_str(&format!("Bearer {token}")).map_err(|_| {
                ConnectionError::Handshake("token is not a valid header value".into())
            })?;
            headers.insert(header::AUTHORIZATION, value);
        }
        if let Some(origin) = &self.options.origin {
            let value = HeaderValue::from_str(origin).map_err(|_| {
                ConnectionError::Handshake(format!("origin `{origin}` is not a valid header value"))
            })?;
            headers.insert(header::ORIGIN, value);
        }

        let timeout = self.options.connect_timeout;
        match tokio::time::timeout(timeout, connect_async(request)).await {
            Ok(Ok((ws, _))) => Ok(ws),
            Ok(Err(e)) => Err(ConnectionError::Handshake(e.to_string())),
            Err(_elapsed) => Err(ConnectionError::Timeout(timeout.as_secs())),
        }
    }

    /// Fire-and-forget send. False when there is no live session or the
    /// write fails; the reply, if any, arrives on the response observers.
    pub async fn send_command(&self, command: &Command) -> bool {
        let writer = match self.session.lock().await.as_ref() {
            Some(session) if self.state().is_connected() => session.writer(),
            _ => {
                debug!(command = command.type_name(), "No live session, command dropped");
                return false;
            }
        };

        let payload = command.encode();
        let result = writer.lock().await.send(Message::Text(payload.into())).await;
        match result {
            Ok(()) => {
                debug!(command = command.type_name(), "Command sent");
                true
            }
            Err(e) => {
                warn!(command = command.type_name(), error = %e, "Command send failed");
                self.shared.fail(e.to_string());
                false
            }
        }
    }

    /// Close the session with code 1000. Safe to call repeatedly.
    pub async fn disconnect(&self) {
        let session = self.session.lock().await.take();
        match session {
            Some(session) => {
                self.shared.set_state(ConnectionState::Disconnecting);
                session.close().await;
                self.shared.set_state(ConnectionState::Disconnected);
                info!("Disconnected from display");
            }
            None => {
                self.shared.state.send_if_modified(|state| {
                    if *state == ConnectionState::Disconnected {
                        false
                    } else {
                        *state = ConnectionState::Disconnected;
                        true
                    }
                });
            }
        }
    }

    pub fn state(&self) -> ConnectionState {
        self.shared.state.borrow().clone()
    }

    pub fn latest_response(&self) -> Option<Response> {
        self.shared.latest.borrow().clone()
    }

    /// Receiver that starts with the current state and sees every later one.
    pub fn subscribe_state(&self) -> watch::Receiver<ConnectionState> {
        self.shared.state.subscribe()
    }

    /// Receiver holding the most recent reply from the display.
    pub fn subscribe_responses(&self) -> watch::Receiver<Option<Response>> {
        self.shared.latest.subscribe()
    }

    /// Every reply received after this call, in arrival order.
    pub fn response_feed(&self) -> broadcast::Receiver<Response> {
        self.shared.feed.subscribe()
    }
}
