//! Open controller connections.
//!
//! Each connection registers the sending half of its outbound queue; the
//! dispatcher and broadcasts push pre-encoded JSON through it. The registry
//! is the only place the connection count comes from.

use std::collections::HashMap;
use std::fmt;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use browsesnap_protocol::{Response, WireMessage};
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{mpsc, watch, RwLock};

/// A connection, identified by its remote address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ClientId(SocketAddr);

impl From<SocketAddr> for ClientId {
    fn from(addr: SocketAddr) -> Self {
        Self(addr)
    }
}

impl fmt::Display for ClientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

pub struct ClientConnection {
    pub id: ClientId,
    /// Presented the session token, or paired with the PIN since connecting.
    pub authenticated: bool,
    pub connected_at: Instant,
    pub last_seen_at: Instant,
    tx: mpsc::Sender<String>,
}

impl ClientConnection {
    fn push(&self, json: String) -> bool {
        match self.tx.try_send(json) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) => {
                tracing::warn!(client = %self.id, "Outbound queue full, dropping message");
                false
            }
            Err(TrySendError::Closed(_)) => {
                tracing::debug!(client = %self.id, "Connection already closing");
                false
            }
        }
    }
}

#[derive(Clone)]
pub struct ClientRegistry {
    clients: Arc<RwLock<HashMap<ClientId, ClientConnection>>>,
    count: Arc<watch::Sender<usize>>,
}

impl Default for ClientRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ClientRegistry {
    pub fn new() -> Self {
        Self {
            clients: Arc::new(RwLock::new(HashMap::new())),
            count: Arc::new(watch::channel(0).0),
        }
    }

    pub async fn register(&self, id: ClientId, authenticated: bool, tx: mpsc::Sender<String>) {
        let now = Instant::now();
        let mut map = self.clients.write().await;
        map.insert(
            id,
            ClientConnection {
                id,
                authenticated,
                connected_at: now,
                last_seen_at: now,
                tx,
            },
        );
        self.count.send_replace(map.len());
    }

    /// Returns true if the connection was registered.
    pub async fn unregister(&self, id: &ClientId) -> bool {
        let mut map = self.clients.write().await;
        let removed = map.remove(id).is_some();
        self.count.send_replace(map.len());
        removed
    }

    /// Refresh `last_seen_at`.
    pub async fn touch(&self, id: &ClientId) {
        if let Some(client) = self.clients.write().await.get_mut(id) {
            client.last_seen_at = Instant::now();
        }
    }

    pub async fn mark_authenticated(&self, id: &ClientId) {
        if let Some(client) = self.clients.write().await.get_mut(id) {
            client.authenticated = true;
        }
    }

    pub async fn is_authenticated(&self, id: &ClientId) -> bool {
        self.clients
            .read()
            .await
            .get(id)
            .is_some_and(|c| c.authenticated)
    }

    pub async fn last_seen(&self, id: &ClientId) -> Option<Instant> {
        self.clients.read().await.get(id).map(|c| c.last_seen_at)
    }

    /// Queue `response` for one connection. False if it is gone or backed up.
    pub async fn send_to(&self, id: &ClientId, response: &Response) -> bool {
        let map = self.clients.read().await;
        match map.get(id) {
            Some(client) => client.push(response.encode()),
            None => false,
        }
    }

    /// Queue `response` for every open connection; returns how many took it.
    pub async fn broadcast(&self, response: &Response) -> usize {
        let json = response.encode();
        let map = self.clients.read().await;
        map.values().filter(|client| client.push(json.clone())).count()
    }

    pub async fn count(&self) -> usize {
        self.clients.read().await.len()
    }

    pub fn subscribe_count(&self) -> watch::Receiver<usize> {
        self.count.subscribe()
    }
}
