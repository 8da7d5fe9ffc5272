//! Everything a running display shares between its tasks.

use std::sync::Arc;

use browsesnap_config::DisplayConfig;
use browsesnap_protocol::PairingSession;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::dispatcher::{DispatcherHandle, DisplayState, DisplaySurface, StateMachine, Worker};
use crate::registry::ClientRegistry;

/// Built once at startup and shared by `Arc`; there is no global state.
pub struct DisplayContext {
    pub config: DisplayConfig,
    pub pairing: PairingSession,
    pub registry: ClientRegistry,
    pub dispatcher: DispatcherHandle,
    state: watch::Receiver<DisplayState>,
}

impl DisplayContext {
    /// Build the context and spawn the dispatcher worker driving `surface`.
    ///
    /// Must be called inside a Tokio runtime.
    pub fn start<S>(
        config: DisplayConfig,
        pairing: PairingSession,
        surface: S,
    ) -> (Arc<Self>, JoinHandle<()>)
    where
        S: DisplaySurface + Send + 'static,
    {
        let registry = ClientRegistry::new();
        let machine = StateMachine::new(pairing.clone(), config.default_volume);
        let (worker, state) =
            Worker::new(machine, surface, registry.clone(), config.broadcast_status);
        let (dispatcher, task) = worker.spawn();

        let ctx = Arc::new(Self {
            config,
            pairing,
            registry,
            dispatcher,
            state,
        });
        (ctx, task)
    }

    pub fn current_state(&self) -> DisplayState {
        self.state.borrow().clone()
    }

    pub fn subscribe_state(&self) -> watch::Receiver<DisplayState> {
        self.state.clone()
    }

    pub fn subscribe_count(&self) -> watch::Receiver<usize> {
        self.registry.subscribe_count()
    }
}
