//! Wire protocol between a BrowseSnap controller and display.
//!
//! Commands flow controller → display, responses flow back. Both are JSON
//! objects with a `type` discriminant and flat camelCase fields. Unknown
//! fields are ignored on decode so either side can grow new fields.

pub mod codec;
pub mod command;
pub mod pairing;
pub mod response;
pub mod security;

pub use codec::{decode_command, decode_response, DecodeError, WireMessage};
pub use command::{Command, CommandKind};
pub use pairing::{PairingPayload, PairingPayloadError, PairingSession, DEFAULT_PORT};
pub use response::{Response, ResponseKind};
