//! Display side of BrowseSnap: the WebSocket server controllers pair with,
//! and the dispatcher that turns their commands into display state.

pub mod context;
pub mod dispatcher;
pub mod qr;
pub mod registry;
pub mod server;

pub use context::DisplayContext;
pub use dispatcher::{DisplayState, DisplaySurface, LoggingSurface};
pub use registry::{ClientId, ClientRegistry};
pub use server::DisplayServer;
