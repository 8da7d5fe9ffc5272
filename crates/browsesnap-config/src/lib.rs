//! BrowseSnap configuration system.
//!
//! TOML-based configuration shared by the display server and the remote
//! controller. Every section uses serde defaults so partial configs work
//! out of the box.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use browsesnap_config::load_config;
//!
//! let config = load_config().expect("failed to load config");
//! println!("listening on port {}", config.display.port);
//! ```

pub mod schema;
pub mod toml_loader;
pub mod validation;

pub use schema::{
    BrowseSnapConfig, ControllerConfig, DisplayConfig, LogLevel, LoggingConfig,
    CONFIG_SCHEMA_VERSION,
};
pub use toml_loader::{load_default, load_from_path};

use browsesnap_common::ConfigError;

/// Load config from the platform default path and validate it.
///
/// Creates a commented default `config.toml` if none exists.
pub fn load_config() -> Result<BrowseSnapConfig, ConfigError> {
    let config = toml_loader::load_default()?;
    validation::validate(&config)?;
    Ok(config)
}

/// Load and validate the config at an explicit path (the `--config` flag).
pub fn load_config_from(path: &std::path::Path) -> Result<BrowseSnapConfig, ConfigError> {
    let config = toml_loader::load_from_path(path)?;
    validation::validate(&config)?;
    Ok(config)
}

/// Serialize a config to a pretty-printed JSON string.
pub fn config_to_json(config: &BrowseSnapConfig) -> String {
    serde_json::to_string_pretty(config)
        .unwrap_or_else(|e| format!("{{\"error\": \"failed to serialize config: {e}\"}}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_to_json_contains_all_sections() {
        let config = BrowseSnapConfig::default();
        let json = config_to_json(&config);
        assert!(json.contains("\"display\""));
        assert!(json.contains("\"controller\""));
        assert!(json.contains("\"logging\""));
    }

    #[test]
    fn config_schema_version_is_1() {
        assert_eq!(CONFIG_SCHEMA_VERSION, 1);
    }

    #[test]
    fn default_config_round_trips_through_json() {
        let config = BrowseSnapConfig::default();
        let json = config_to_json(&config);
        let parsed: BrowseSnapConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.display.port, 8888);
        assert_eq!(parsed.display.max_message_bytes, 65_536);
        assert_eq!(parsed.controller.connect_timeout_secs, 10);
    }

    #[test]
    fn load_config_from_rejects_invalid_values() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[display]\nport = 0\n").unwrap();
        let err = load_config_from(&path).unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));
    }

    #[test]
    fn load_config_from_reads_overrides() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[display]\nport = 9100\nname = \"Den\"\n").unwrap();
        let config = load_config_from(&path).unwrap();
        assert_eq!(config.display.port, 9100);
        assert_eq!(config.display.name, "Den");
    }
}
