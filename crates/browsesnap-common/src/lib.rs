//! Shared building blocks for the BrowseSnap workspace: the error taxonomy,
//! identifiers and wall-clock timestamps.

pub mod errors;
pub mod id;
pub mod time;

pub use errors::{
    AuthError, BrowseSnapError, CommandError, ConfigError, ConnectionError, DispatchError,
    ProtocolError,
};
pub use id::{new_id, DeviceId};
pub use time::now_millis;

pub type Result<T> = std::result::Result<T, BrowseSnapError>;
