//! browsesnap-display: serve one display to paired controllers.
//!
//! Prints the pairing PIN and QR code, then accepts controllers until
//! Ctrl-C. Commands drive a [`LoggingSurface`], so every page load and
//! player action shows up in the log.

use std::net::{IpAddr, Ipv4Addr, UdpSocket};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use browsesnap_config::BrowseSnapConfig;
use browsesnap_display::{qr, DisplayContext, DisplayServer, LoggingSurface};
use browsesnap_protocol::PairingSession;
use clap::Parser;
use tokio::sync::watch;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "browsesnap-display", version, about = "BrowseSnap display server")]
struct Args {
    /// Port to listen on (overrides config).
    #[arg(long)]
    port: Option<u16>,

    /// Interface to bind (overrides config).
    #[arg(long)]
    bind: Option<String>,

    /// Display name shown to controllers (overrides config).
    #[arg(long)]
    name: Option<String>,

    /// Config file to load instead of the default location.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Log filter directive, e.g. `debug` or `browsesnap_display=trace`.
    #[arg(long)]
    log_level: Option<String>,

    /// Skip printing the pairing QR code.
    #[arg(long)]
    no_qr: bool,
}

impl Args {
    fn apply(&self, config: &mut BrowseSnapConfig) {
        if let Some(port) = self.port {
            config.display.port = port;
        }
        if let Some(bind) = &self.bind {
            config.display.bind_address = bind.clone();
        }
        if let Some(name) = &self.name {
            config.display.name = name.clone();
        }
        if self.no_qr {
            config.display.show_qr = false;
        }
    }
}

fn init_tracing(directive: &str) {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(directive)),
        )
        .init();
}

/// Address controllers on the LAN should dial. Connecting a UDP socket sends
/// nothing; it only makes the OS pick the outbound interface.
fn local_ip() -> IpAddr {
    UdpSocket::bind("0.0.0.0:0")
        .and_then(|socket| {
            socket.connect("8.8.8.8:80")?;
            socket.local_addr()
        })
        .map(|addr| addr.ip())
        .unwrap_or(IpAddr::V4(Ipv4Addr::LOCALHOST))
}

fn print_pairing(pairing: &PairingSession, show_qr: bool) {
    let payload = pairing.payload().to_json();
    println!();
    println!("  Pair a controller with {}", pairing.display_name);
    println!("  PIN: {}", pairing.pin);
    if show_qr {
        match qr::render_qr_unicode(&payload) {
            Some(code) => {
                println!();
                print!("{code}");
            }
            None => tracing::warn!("Failed to render pairing QR code"),
        }
    }
    println!();
    println!("  Or enter manually: {payload}");
    println!();
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    let loaded = match &args.config {
        Some(path) => browsesnap_config::load_config_from(path),
        None => browsesnap_config::load_config(),
    };
    let level = args.log_level.clone().unwrap_or_else(|| {
        loaded
            .as_ref()
            .map(|c| c.logging.level.as_directive())
            .unwrap_or("info")
            .to_string()
    });
    init_tracing(&level);

    let mut config = loaded.unwrap_or_else(|e| {
        tracing::warn!("Config load failed, using defaults: {e}");
        BrowseSnapConfig::default()
    });
    args.apply(&mut config);
    let display = config.display;

    let ip = local_ip();
    let pairing = PairingSession::generate(display.name.clone(), ip.to_string(), display.port);
    tracing::info!(
        device_id = %pairing.device_id,
        name = %pairing.display_name,
        ip = %ip,
        port = pairing.port,
        "Pairing session created"
    );

    let show_qr = display.show_qr;
    let (ctx, mut worker) = DisplayContext::start(display, pairing, LoggingSurface::new());

    let server = match DisplayServer::bind(Arc::clone(&ctx)).await {
        Ok(server) => server,
        Err(e) => {
            tracing::error!(
                addr = %format!("{}:{}", ctx.config.bind_address, ctx.config.port),
                error = %e,
                "Failed to bind display server"
            );
            return ExitCode::FAILURE;
        }
    };
    print_pairing(&ctx.pairing, show_qr);

    let mut states = ctx.subscribe_state();
    tokio::spawn(async move {
        while states.changed().await.is_ok() {
            let state = states.borrow_and_update().clone();
            tracing::info!(state = state.name(), details = ?state.details(), "Display state changed");
        }
    });

    let mut counts = ctx.subscribe_count();
    tokio::spawn(async move {
        while counts.changed().await.is_ok() {
            let count = *counts.borrow_and_update();
            tracing::info!(count, "Connected controllers");
        }
    });

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Could not listen for Ctrl-C");
            // Hold the sender so the server keeps running.
            std::future::pending::<()>().await;
        }
        let _ = shutdown_tx.send(true);
    });

    tokio::select! {
        _ = server.run(shutdown_rx) => {}
        result = &mut worker => {
            // Without the dispatcher every connection would be refused.
            tracing::error!(result = ?result, "Dispatcher stopped unexpectedly");
            return ExitCode::FAILURE;
        }
    }

    // Give connections a moment to flush their close frames.
    tokio::time::sleep(std::time::Duration::from_millis(200)).await;
    worker.abort();
    tracing::info!("Display stopped");
    ExitCode::SUCCESS
}
