//! A live session: shared writer, reply reader and keepalive.

use std::sync::Arc;
use std::time::Duration;

use browsesnap_protocol::{decode_response, Response};
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::{broadcast, watch, Mutex};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};
use tracing::{debug, info, trace, warn};

use crate::state::ConnectionState;

pub(super) type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;
type SharedSink = Arc<Mutex<SplitSink<WsStream, Message>>>;

const MIN_PING_INTERVAL: Duration = Duration::from_millis(100);

/// Observable state shared between the manager and its session tasks.
pub(super) struct Shared {
    pub(super) state: watch::Sender<ConnectionState>,
    pub(super) latest: watch::Sender<Option<Response>>,
    pub(super) feed: broadcast::Sender<Response>,
}

impl Shared {
    pub(super) fn set_state(&self, state: ConnectionState) {
        debug!(state = %state, "Connection state changed");
        self.state.send_replace(state);
    }

    /// Record a transport failure unless the session already wound down.
    pub(super) fn fail(&self, reason: String) {
        self.state.send_if_modified(|state| match state {
            ConnectionState::Connected | ConnectionState::Disconnecting => {
                *state = ConnectionState::Error(reason);
                true
            }
            _ => false,
        });
    }

    fn peer_closing(&self) {
        self.state.send_if_modified(|state| {
            if *state == ConnectionState::Connected {
                *state = ConnectionState::Disconnecting;
                true
            } else {
                false
            }
        });
    }

    fn peer_closed(&self) {
        self.state.send_if_modified(|state| match state {
            ConnectionState::Connected | ConnectionState::Disconnecting => {
                *state = ConnectionState::Disconnected;
                true
            }
            _ => false,
        });
    }

    fn publish(&self, bytes: &[u8]) {
        match decode_response(bytes) {
            Ok(response) => {
                debug!(kind = response.kind.type_name(), success = response.success, "Reply from display");
                // No feed subscribers is fine.
                let _ = self.feed.send(response.clone());
                self.latest.send_replace(Some(response));
            }
            Err(e) => warn!(error = %e, "Undecodable reply from display"),
        }
    }
}

/// Aborts the session's background tasks when dropped.
struct SessionTasks {
    reader: JoinHandle<()>,
    heartbeat: JoinHandle<()>,
}

impl SessionTasks {
    fn abort(&self) {
        self.reader.abort();
        self.heartbeat.abort();
    }
}

impl Drop for SessionTasks {
    fn drop(&mut self) {
        self.abort();
    }
}

pub(super) struct Session {
    writer: SharedSink,
    tasks: SessionTasks,
}

impl Session {
    pub(super) fn start(ws: WsStream, shared: Arc<Shared>, ping_interval: Duration) -> Self {
        let (sink, stream) = ws.split();
        let writer = Arc::new(Mutex::new(sink));
        let tasks = SessionTasks {
            reader: tokio::spawn(read_loop(stream, shared)),
            heartbeat: tokio::spawn(heartbeat(Arc::clone(&writer), ping_interval)),
        };
        Self { writer, tasks }
    }

    pub(super) fn writer(&self) -> SharedSink {
        Arc::clone(&self.writer)
    }

    /// Stop the background tasks and send a normal close.
    pub(super) async fn close(self) {
        self.tasks.abort();
        let mut sink = self.writer.lock().await;
        let frame = CloseFrame {
            code: CloseCode::Normal,
            reason: "controller disconnect".into(),
        };
        if let Err(e) = sink.send(Message::Close(Some(frame))).await {
            debug!(error = %e, "Close frame not delivered");
        }
        let _ = sink.close().await;
    }
}

async fn read_loop(mut stream: SplitStream<WsStream>, shared: Arc<Shared>) {
    while let Some(frame) = stream.next().await {
        match frame {
            Ok(Message::Text(text)) => shared.publish(text.as_bytes()),
            Ok(Message::Binary(data)) => shared.publish(&data),
            Ok(Message::Close(frame)) => {
                let code = frame.as_ref().map(|f| u16::from(f.code));
                info!(code = ?code, "Display closed the session");
                shared.peer_closing();
                break;
            }
            Ok(_) => {}
            Err(e) => {
                warn!(error = %e, "Session transport error");
                shared.fail(e.to_string());
                return;
            }
        }
    }
    shared.peer_closed();
}

async fn heartbeat(writer: SharedSink, period: Duration) {
    let period = period.max(MIN_PING_INTERVAL);
    let mut interval = tokio::time::interval_at(Instant::now() + period, period);
    loop {
        interval.tick().await;
        let mut sink = writer.lock().await;
        if let Err(e) = sink.send(Message::Ping(Default::default())).await {
            debug!(error = %e, "Keepalive stopped");
            break;
        }
        trace!("Keepalive ping sent");
    }
}
