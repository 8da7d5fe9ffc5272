//! Default TOML config template with inline documentation comments.

/// Generate the default TOML config content with comments.
pub(crate) fn default_config_toml() -> String {
    r##"# BrowseSnap Configuration
# Schema version 1
# Only override what you want to change -- missing fields use defaults.

[display]
# bind_address = "0.0.0.0"
# port = 8888                 # 1-65535
# name = "BrowseSnap Display"
# allowed_origins = ["app://mobile-controller", "localhost", "127.0.0.1"]
# allow_pin_bootstrap = true  # accept the PIN as bearer until the first register
# max_message_bytes = 65536   # 1024-1048576
# broadcast_status = true
# default_volume = 50         # 0-100
# show_qr = true

[controller]
# connect_timeout_secs = 10   # >= 1
# ping_interval_secs = 30     # >= 1
# origin = "app://mobile-controller"

[logging]
# level = "info"              # trace, debug, info, warn, error
"##
    .to_string()
}
