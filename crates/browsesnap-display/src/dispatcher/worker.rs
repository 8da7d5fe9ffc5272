//! The dispatcher actor: sole owner of the state machine.

use std::panic::{self, AssertUnwindSafe};

use browsesnap_common::DispatchError;
use browsesnap_protocol::{Command, Response};
use tokio::sync::{mpsc, watch};
use tracing::{debug, error, info};

use super::machine::{Outcome, StateMachine};
use super::state::DisplayState;
use super::surface::DisplaySurface;
use crate::registry::{ClientId, ClientRegistry};

/// Commands waiting for the worker. Senders wait when it is full.
pub const QUEUE_CAPACITY: usize = 256;

/// A decoded command and the connection it arrived on.
#[derive(Debug)]
pub struct Dispatch {
    pub client: ClientId,
    pub command: Command,
}

/// Cloneable entry point into the dispatcher queue.
#[derive(Clone)]
pub struct DispatcherHandle {
    tx: mpsc::Sender<Dispatch>,
}

impl DispatcherHandle {
    /// Enqueue in receipt order. Fails only when the worker has stopped.
    pub async fn submit(&self, client: ClientId, command: Command) -> Result<(), DispatchError> {
        self.tx
            .send(Dispatch { client, command })
            .await
            .map_err(|_| DispatchError::Unavailable)
    }

    pub fn is_running(&self) -> bool {
        !self.tx.is_closed()
    }
}

pub struct Worker<S> {
    machine: StateMachine,
    surface: S,
    registry: ClientRegistry,
    state_tx: watch::Sender<DisplayState>,
    broadcast_status: bool,
}

impl<S: DisplaySurface + Send + 'static> Worker<S> {
    pub fn new(
        machine: StateMachine,
        surface: S,
        registry: ClientRegistry,
        broadcast_status: bool,
    ) -> (Self, watch::Receiver<DisplayState>) {
        let (state_tx, state_rx) = watch::channel(machine.state().clone());
        let worker = Self {
            machine,
            surface,
            registry,
            state_tx,
            broadcast_status,
        };
        (worker, state_rx)
    }

    /// Spawn the worker; it runs until every handle is dropped.
    pub fn spawn(self) -> (DispatcherHandle, tokio::task::JoinHandle<()>) {
        let (tx, rx) = mpsc::channel(QUEUE_CAPACITY);
        let task = tokio::spawn(self.run(rx));
        (DispatcherHandle { tx }, task)
    }

    async fn run(mut self, mut rx: mpsc::Receiver<Dispatch>) {
        info!("Dispatcher started");
        while let Some(Dispatch { client, command }) = rx.recv().await {
            self.handle(client, command).await;
        }
        info!("Dispatcher stopped");
    }

    async fn handle(&mut self, client: ClientId, command: Command) {
        let paired = self.registry.is_authenticated(&client).await;
        debug!(client = %client, command = command.type_name(), paired, "Dispatching");

        // A panicking surface costs this command, not the worker.
        let applied = panic::catch_unwind(AssertUnwindSafe(|| {
            self.machine.apply(&command.kind, paired, &mut self.surface)
        }));
        let outcome = applied.unwrap_or_else(|_| {
            error!(client = %client, command = command.type_name(), "Display surface panicked");
            let err = DispatchError::Surface("display surface panicked".into());
            Outcome {
                reply: Some(Response::from(&err)),
                ..Outcome::default()
            }
        });

        if outcome.paired {
            self.registry.mark_authenticated(&client).await;
        }
        if let Some(reply) = outcome.reply {
            if !self.registry.send_to(&client, &reply).await {
                debug!(client = %client, "Reply dropped, connection gone");
            }
        }
        if outcome.state_changed {
            let state = self.machine.state().clone();
            info!(state = state.name(), "Display state changed");
            if self.broadcast_status {
                let status = Response::status(state.name(), Some(state.details()));
                self.registry.broadcast(&status).await;
            }
            self.state_tx.send_replace(state);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::net::SocketAddr;
    use std::time::Duration;

    use browsesnap_protocol::{decode_response, CommandKind, PairingSession, ResponseKind};

    use super::*;
    use crate::dispatcher::surface::{LoggingSurface, SurfaceError};

    fn client(port: u16) -> ClientId {
        ClientId::from(SocketAddr::from(([127, 0, 0, 1], port)))
    }

    async fn recv(rx: &mut mpsc::Receiver<String>) -> Response {
        let json = tokio::time::timeout(Duration::from_secs(5), rx.recv())
            .await
            .unwrap()
            .unwrap();
        decode_response(json.as_bytes()).unwrap()
    }

    fn start(
        registry: &ClientRegistry,
        broadcast_status: bool,
    ) -> (DispatcherHandle, watch::Receiver<DisplayState>, PairingSession) {
        let pairing = PairingSession::generate("Den", "127.0.0.1", 8888);
        let machine = StateMachine::new(pairing.clone(), 50);
        let (worker, state_rx) =
            Worker::new(machine, LoggingSurface::new(), registry.clone(), broadcast_status);
        let (handle, _task) = worker.spawn();
        (handle, state_rx, pairing)
    }

    #[tokio::test]
    async fn pin_pairing_authenticates_the_connection() {
        let registry = ClientRegistry::new();
        let (handle, _, pairing) = start(&registry, true);
        let (tx, mut rx) = mpsc::channel(16);
        registry.register(client(1), false, tx).await;

        handle
            .submit(client(1), Command::register("phone", "Pixel", pairing.pin.clone()))
            .await
            .unwrap();
        match recv(&mut rx).await.kind {
            ResponseKind::PairingSuccess { auth_token, .. } => assert_eq!(auth_token, pairing.token),
            other => panic!("unexpected {other:?}"),
        }
        assert!(registry.is_authenticated(&client(1)).await);
    }

    #[tokio::test]
    async fn state_changes_are_published_and_broadcast() {
        let registry = ClientRegistry::new();
        let (handle, mut state_rx, _) = start(&registry, true);
        let (tx_a, mut rx_a) = mpsc::channel(16);
        let (tx_b, mut rx_b) = mpsc::channel(16);
        registry.register(client(1), true, tx_a).await;
        registry.register(client(2), true, tx_b).await;

        handle
            .submit(client(1), Command::open_url("https://example.com"))
            .await
            .unwrap();

        tokio::time::timeout(Duration::from_secs(5), state_rx.changed())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(
            *state_rx.borrow(),
            DisplayState::Browsing {
                url: "https://example.com".into()
            }
        );

        for rx in [&mut rx_a, &mut rx_b] {
            match recv(rx).await.kind {
                ResponseKind::StatusUpdate { status, details } => {
                    assert_eq!(status, "browsing");
                    assert_eq!(details.unwrap()["url"], "https://example.com");
                }
                other => panic!("unexpected {other:?}"),
            }
        }
    }

    #[tokio::test]
    async fn broadcast_can_be_disabled() {
        let registry = ClientRegistry::new();
        let (handle, state_rx, _) = start(&registry, false);
        let (tx, mut rx) = mpsc::channel(16);
        registry.register(client(1), true, tx).await;

        handle
            .submit(client(1), Command::open_url("https://example.com"))
            .await
            .unwrap();
        handle.submit(client(1), Command::new(CommandKind::Ping)).await.unwrap();

        // The pong is the first thing queued: no status update before it.
        assert_eq!(recv(&mut rx).await.kind, ResponseKind::Pong);
        assert!(state_rx.has_changed().unwrap());
    }

    #[tokio::test]
    async fn commands_apply_in_submission_order() {
        let registry = ClientRegistry::new();
        let (handle, state_rx, _) = start(&registry, false);
        let (tx, mut rx) = mpsc::channel(64);
        registry.register(client(1), true, tx).await;

        for i in 0..20 {
            handle
                .submit(client(1), Command::open_url(format!("https://example.com/{i}")))
                .await
                .unwrap();
        }
        handle.submit(client(1), Command::new(CommandKind::Ping)).await.unwrap();
        assert_eq!(recv(&mut rx).await.kind, ResponseKind::Pong);
        assert_eq!(
            *state_rx.borrow(),
            DisplayState::Browsing {
                url: "https://example.com/19".into()
            }
        );
    }

    /// Panics on page loads; every other call succeeds.
    struct PanickingSurface;

    impl DisplaySurface for PanickingSurface {
        fn load_url(&mut self, _url: &str) -> Result<(), SurfaceError> {
            panic!("renderer crashed");
        }
        fn go_back(&mut self) -> Result<Option<String>, SurfaceError> {
            Ok(None)
        }
        fn go_forward(&mut self) -> Result<Option<String>, SurfaceError> {
            Ok(None)
        }
        fn play_video(&mut self, _: &str, _: Option<&str>, _: i64) -> Result<(), SurfaceError> {
            Ok(())
        }
        fn pause(&mut self) -> Result<(), SurfaceError> {
            Ok(())
        }
        fn resume(&mut self) -> Result<(), SurfaceError> {
            Ok(())
        }
        fn stop_video(&mut self) -> Result<(), SurfaceError> {
            Ok(())
        }
        fn set_volume(&mut self, _: u8) -> Result<(), SurfaceError> {
            Ok(())
        }
        fn seek(&mut self, _: i64) -> Result<(), SurfaceError> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn surface_panic_fails_the_command_not_the_worker() {
        let registry = ClientRegistry::new();
        let pairing = PairingSession::generate("Den", "127.0.0.1", 8888);
        let machine = StateMachine::new(pairing, 50);
        let (worker, state_rx) = Worker::new(machine, PanickingSurface, registry.clone(), true);
        let (handle, task) = worker.spawn();
        let (tx, mut rx) = mpsc::channel(16);
        registry.register(client(1), true, tx).await;

        handle
            .submit(client(1), Command::open_url("https://example.com"))
            .await
            .unwrap();
        assert_eq!(recv(&mut rx).await.error_code(), Some("DISPATCH_FAILED"));

        handle.submit(client(1), Command::new(CommandKind::Ping)).await.unwrap();
        assert_eq!(recv(&mut rx).await.kind, ResponseKind::Pong);
        assert!(handle.is_running());
        assert!(!task.is_finished());
        assert_eq!(*state_rx.borrow(), DisplayState::Pairing);
    }

    #[tokio::test]
    async fn submit_fails_once_worker_is_gone() {
        let registry = ClientRegistry::new();
        let (handle, _, _) = start(&registry, false);
        let (tx, rx) = mpsc::channel(1);
        drop(rx);
        let dead = DispatcherHandle { tx };
        assert!(!dead.is_running());
        assert_eq!(
            dead.submit(client(1), Command::new(CommandKind::Ping)).await,
            Err(DispatchError::Unavailable)
        );
        assert!(handle.is_running());
    }
}
