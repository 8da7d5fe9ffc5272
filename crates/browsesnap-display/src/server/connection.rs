//! Per-connection handler: authorize, register, then serve frames.

use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::sync::Arc;

use browsesnap_common::ProtocolError;
use browsesnap_protocol::{decode_command, Response, WireMessage};
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::{mpsc, watch};
use tokio_tungstenite::tungstenite::handshake::server::{
    ErrorResponse, Request, Response as HandshakeResponse,
};
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tokio_tungstenite::tungstenite::protocol::{CloseFrame, WebSocketConfig};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{accept_hdr_async_with_config, WebSocketStream};

use super::handshake::{authorize, Credential, HandshakeHeaders};
use crate::context::DisplayContext;
use crate::registry::ClientId;

/// Outbound messages buffered per connection before drops start.
const CLIENT_QUEUE_CAPACITY: usize = 256;

/// Frames up to this multiple of `max_message_bytes` are read and answered
/// with `MESSAGE_TOO_LARGE`; anything bigger ends the connection.
pub(crate) const TRANSPORT_LIMIT_FACTOR: usize = 16;

const WELCOME_MESSAGE: &str = "Connected to display";
const ACK_MESSAGE: &str = "Command received";

pub(crate) async fn handle_socket(
    stream: TcpStream,
    addr: SocketAddr,
    ctx: Arc<DisplayContext>,
    shutdown: watch::Receiver<bool>,
) {
    let mut headers = HandshakeHeaders::default();
    let callback = |req: &Request,
                    resp: HandshakeResponse|
     -> Result<HandshakeResponse, ErrorResponse> {
        headers = HandshakeHeaders::from_request(req);
        Ok(resp)
    };
    let config = transport_config(ctx.config.max_message_bytes);
    let mut ws = match accept_hdr_async_with_config(stream, callback, Some(config)).await {
        Ok(ws) => ws,
        Err(e) => {
            tracing::warn!(peer = %addr, error = %e, "WS handshake failed");
            return;
        }
    };

    let credential = match authorize(&headers, &ctx.config, &ctx.pairing) {
        Ok(credential) => credential,
        Err(e) => {
            tracing::warn!(peer = %addr, error = %e, "Rejecting controller");
            close(&mut ws, CloseCode::Policy, "unauthorized").await;
            return;
        }
    };

    if !ctx.dispatcher.is_running() {
        tracing::error!(peer = %addr, "Dispatcher is not running, refusing controller");
        close(&mut ws, CloseCode::Error, "internal error").await;
        return;
    }

    let id = ClientId::from(addr);
    let (tx, rx) = mpsc::channel::<String>(CLIENT_QUEUE_CAPACITY);
    ctx.registry
        .register(id, credential == Credential::Token, tx)
        .await;
    tracing::info!(client = %id, credential = ?credential, "Controller connected");

    serve(ws, id, rx, &ctx, shutdown).await;

    ctx.registry.unregister(&id).await;
    tracing::info!(client = %id, "Controller disconnected");
}

fn transport_config(max_message_bytes: usize) -> WebSocketConfig {
    let limit = max_message_bytes.saturating_mul(TRANSPORT_LIMIT_FACTOR);
    WebSocketConfig::default()
        .max_message_size(Some(limit))
        .max_frame_size(Some(limit))
}

async fn serve(
    ws: WebSocketStream<TcpStream>,
    id: ClientId,
    mut rx: mpsc::Receiver<String>,
    ctx: &DisplayContext,
    mut shutdown: watch::Receiver<bool>,
) {
    let (mut sink, mut stream) = ws.split();

    let details = BTreeMap::from([("message".to_string(), WELCOME_MESSAGE.to_string())]);
    let welcome = Response::status("connected", Some(details));
    if sink.send(Message::Text(welcome.encode().into())).await.is_err() {
        return;
    }

    loop {
        tokio::select! {
            // Dispatcher replies and broadcasts.
            Some(json) = rx.recv() => {
                if sink.send(Message::Text(json.into())).await.is_err() {
                    break;
                }
            }

            frame = stream.next() => {
                let reply = match frame {
                    Some(Ok(Message::Text(text))) => handle_payload(text.as_bytes(), id, ctx).await,
                    Some(Ok(Message::Binary(data))) => handle_payload(&data, id, ctx).await,
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Err(e)) => {
                        tracing::debug!(client = %id, error = %e, "WS error");
                        break;
                    }
                    // Ping/pong: tungstenite answers pings itself.
                    Some(Ok(_)) => {
                        ctx.registry.touch(&id).await;
                        continue;
                    }
                };
                if sink.send(Message::Text(reply.encode().into())).await.is_err() {
                    break;
                }
            }

            _ = shutdown.changed() => {
                let frame = CloseFrame {
                    code: CloseCode::Normal,
                    reason: "display shutting down".into(),
                };
                let _ = sink.send(Message::Close(Some(frame))).await;
                break;
            }
        }
    }
}

/// Check, decode and enqueue one inbound payload; returns the immediate reply.
async fn handle_payload(bytes: &[u8], id: ClientId, ctx: &DisplayContext) -> Response {
    ctx.registry.touch(&id).await;

    let limit = ctx.config.max_message_bytes;
    if bytes.len() > limit {
        tracing::warn!(client = %id, size = bytes.len(), limit, "Rejecting oversized message");
        return Response::from(&ProtocolError::MessageTooLarge {
            size: bytes.len(),
            limit,
        });
    }

    let command = match decode_command(bytes) {
        Ok(command) => command,
        Err(e) => {
            tracing::debug!(client = %id, error = %e, "Undecodable command");
            return Response::from(&ProtocolError::from(e));
        }
    };

    let command_type = command.type_name();
    match ctx.dispatcher.submit(id, command).await {
        Ok(()) => Response::command_ack(command_type, true, Some(ACK_MESSAGE.into())),
        Err(e) => {
            tracing::error!(client = %id, error = %e, "Command not dispatched");
            Response::from(&e)
        }
    }
}

async fn close(ws: &mut WebSocketStream<TcpStream>, code: CloseCode, reason: &'static str) {
    let frame = CloseFrame {
        code,
        reason: reason.into(),
    };
    if let Err(e) = ws.close(Some(frame)).await {
        tracing::debug!(error = %e, "Close frame not delivered");
    }
}
