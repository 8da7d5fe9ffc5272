//! Command dispatcher: applies controller commands to the display one at
//! a time, in the order the server received them.

pub mod machine;
pub mod state;
pub mod surface;
pub mod worker;

pub use machine::{Outcome, StateMachine, BLANK_PAGE};
pub use state::DisplayState;
pub use surface::{DisplaySurface, LoggingSurface, SurfaceError};
pub use worker::{Dispatch, DispatcherHandle, Worker};
