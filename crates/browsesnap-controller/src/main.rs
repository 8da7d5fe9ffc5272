//! browsesnap-remote: send one command to a display from the terminal.
//!
//! Connects, sends, prints every reply received within `--wait-ms` as a
//! JSON line, then disconnects. Exits non-zero when the connection fails
//! or the display answers with an error.

mod cli;

use std::process::ExitCode;
use std::time::Duration;

use browsesnap_config::BrowseSnapConfig;
use browsesnap_controller::{ConnectionState, ControllerConnection};
use browsesnap_protocol::WireMessage;
use tokio::sync::broadcast::error::RecvError;
use tracing_subscriber::EnvFilter;

fn init_tracing(directive: &str) {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(directive)),
        )
        .init();
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = cli::parse();

    let loaded = match &args.config {
        Some(path) => browsesnap_config::load_config_from(path),
        None => browsesnap_config::load_config(),
    };
    let level = args.log_level.clone().unwrap_or_else(|| {
        loaded
            .as_ref()
            .map(|c| c.logging.level.as_directive())
            .unwrap_or("warn")
            .to_string()
    });
    init_tracing(&level);

    let config = loaded.unwrap_or_else(|e| {
        tracing::warn!("Config load failed, using defaults: {e}");
        BrowseSnapConfig::default()
    });

    let endpoint = match args.endpoint() {
        Ok(endpoint) => endpoint,
        Err(e) => {
            eprintln!("browsesnap-remote: {e}");
            return ExitCode::FAILURE;
        }
    };

    let conn = ControllerConnection::from_config(&config.controller);
    let mut feed = conn.response_feed();
    let mut states = conn.subscribe_state();

    let state = conn.connect(&endpoint.url, endpoint.bearer.as_deref()).await;
    if state != ConnectionState::Connected {
        eprintln!("browsesnap-remote: could not connect to {}: {state}", endpoint.url);
        return ExitCode::FAILURE;
    }

    let command = args.command.to_command(endpoint.pin.as_deref());
    if !conn.send_command(&command).await {
        eprintln!("browsesnap-remote: failed to send {}", command.type_name());
        conn.disconnect().await;
        return ExitCode::FAILURE;
    }

    let mut saw_error = false;
    let deadline = tokio::time::sleep(Duration::from_millis(args.wait_ms));
    tokio::pin!(deadline);
    loop {
        tokio::select! {
            _ = &mut deadline => break,
            reply = feed.recv() => match reply {
                Ok(response) => {
                    saw_error |= response.is_error();
                    println!("{}", response.encode());
                }
                Err(RecvError::Lagged(n)) => tracing::warn!(skipped = n, "Missed replies"),
                Err(RecvError::Closed) => break,
            },
            changed = states.changed() => {
                if changed.is_err() || !states.borrow().is_connected() {
                    let state = states.borrow().clone();
                    eprintln!("browsesnap-remote: session ended ({state})");
                    break;
                }
            }
        }
    }

    conn.disconnect().await;
    if saw_error {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}
