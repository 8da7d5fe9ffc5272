//! Controller side of BrowseSnap: one WebSocket session to a display.
//!
//! [`ControllerConnection`] owns the session and exposes its lifecycle and
//! the display's replies as latest-value observables.

pub mod connection;
pub mod state;

pub use connection::{ConnectOptions, ControllerConnection};
pub use state::ConnectionState;
