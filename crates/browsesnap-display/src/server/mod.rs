//! WebSocket server controllers connect to.

mod connection;
pub mod handshake;


use std::io;
use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::TcpListener;
use tokio::sync::watch;

use crate::context::DisplayContext;

pub struct DisplayServer {
    listener: TcpListener,
    ctx: Arc<DisplayContext>,
}

impl DisplayServer {
    /// Bind to the configured `bind_address:port`.
    pub async fn bind(ctx: Arc<DisplayContext>) -> io::Result<Self> {
        let addr = format!("{}:{}", ctx.config.bind_address, ctx.config.port);
        Self::bind_to(&addr, ctx).await
    }

    pub async fn bind_to(addr: &str, ctx: Arc<DisplayContext>) -> io::Result<Self> {
        let listener = TcpListener::bind(addr).await?;
        Ok(Self { listener, ctx })
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Accept controllers until `shutdown` changes or its sender is dropped.
    /// Open connections get a normal close at the same moment.
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) {
        if let Ok(addr) = self.listener.local_addr() {
            tracing::info!(addr = %addr, "Display server listening");
        }

        loop {
            tokio::select! {
                accepted = self.listener.accept() => match accepted {
                    Ok((stream, addr)) => {
                        let ctx = Arc::clone(&self.ctx);
                        let shutdown = shutdown.clone();
                        tokio::spawn(connection::handle_socket(stream, addr, ctx, shutdown));
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, "TCP accept error");
                    }
                },
                _ = shutdown.changed() => {
                    tracing::info!("Display server shutting down");
                    break;
                }
            }
        }
    }
}
