//! Full configuration validation.
//!
//! Each section has its own validator; this orchestrator calls them all and
//! collects the errors into a single `ConfigError`.

mod helpers;


use crate::schema::BrowseSnapConfig;
use browsesnap_common::ConfigError;

use helpers::{validate_min, validate_range};

/// Run all validations on a config, collecting all errors.
pub fn validate(config: &BrowseSnapConfig) -> Result<(), ConfigError> {
    let mut errors: Vec<String> = Vec::new();

    validate_display(&mut errors, config);
    validate_controller(&mut errors, config);

    if errors.is_empty() {
        Ok(())
    } else {
        Err(ConfigError::ValidationError(errors.join("; ")))
    }
}

fn validate_display(errors: &mut Vec<String>, config: &BrowseSnapConfig) {
    let display = &config.display;
    validate_range(errors, "display.port", u64::from(display.port), 1, 65_535);
    validate_range(
        errors,
        "display.max_message_bytes",
        display.max_message_bytes as u64,
        1024,
        1_048_576,
    );
    validate_range(
        errors,
        "display.default_volume",
        u64::from(display.default_volume),
        0,
        100,
    );
    if display.name.trim().is_empty() {
        errors.push("display.name must not be empty".into());
    }
    if display.bind_address.parse::<std::net::IpAddr>().is_err() {
        errors.push(format!(
            "display.bind_address = {:?} is not an IP address",
            display.bind_address
        ));
    }
}

fn validate_controller(errors: &mut Vec<String>, config: &BrowseSnapConfig) {
    validate_min(
        errors,
        "controller.connect_timeout_secs",
        config.controller.connect_timeout_secs,
        1,
    );
    validate_min(
        errors,
        "controller.ping_interval_secs",
        config.controller.ping_interval_secs,
        1,
    );
}
