//! Configuration schema types for BrowseSnap.
//!
//! All structs use `serde(default)` so partial configs work correctly.

mod controller;
mod display;
mod logging;

pub use controller::*;
pub use display::*;
pub use logging::*;

use serde::{Deserialize, Serialize};

/// Current config schema version.
pub const CONFIG_SCHEMA_VERSION: u32 = 1;

/// Root configuration. Only override what you want to change.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BrowseSnapConfig {
    pub display: DisplayConfig,
    pub controller: ControllerConfig,
    pub logging: LoggingConfig,
}
