use std::path::PathBuf;

use browsesnap_common::new_id;
use browsesnap_protocol::security::classify_as_video;
use browsesnap_protocol::{Command, CommandKind, PairingPayload};
use clap::{Parser, Subcommand};

/// Send one command to a BrowseSnap display and print its replies.
#[derive(Parser, Debug)]
#[command(name = "browsesnap-remote", version, about)]
pub struct Args {
    /// Pairing payload shown by the display (JSON or browsesnap:// URI).
    #[arg(long, conflicts_with = "url", required_unless_present = "url")]
    pub pairing: Option<String>,

    /// Display endpoint, e.g. ws://192.168.1.20:8888.
    #[arg(long)]
    pub url: Option<String>,

    /// Session token from an earlier pairing.
    #[arg(long)]
    pub token: Option<String>,

    /// How long to collect replies after sending, in milliseconds.
    #[arg(long, default_value_t = 1000)]
    pub wait_ms: u64,

    /// Config file path override.
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Log level override (debug, info, warn, error).
    #[arg(long)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: RemoteCommand,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum RemoteCommand {
    /// Open a web page.
    Open { url: String },
    /// Play a video.
    Play {
        url: String,
        #[arg(long)]
        title: Option<String>,
        #[arg(long, default_value_t = 0)]
        start_ms: i64,
    },
    /// Open a URL, as video when it looks like one.
    Send { url: String },
    Back,
    Forward,
    Pause,
    Resume,
    Stop,
    /// Set the player volume (0-100, clamped by the display).
    Volume {
        #[arg(allow_negative_numbers = true)]
        level: i32,
    },
    /// Seek the player to a position in milliseconds.
    Seek {
        #[arg(allow_negative_numbers = true)]
        position_ms: i64,
    },
    /// Pair with the display.
    Register {
        #[arg(long, default_value = "Mobile")]
        name: String,
        #[arg(long)]
        device_id: Option<String>,
        /// Defaults to the PIN from `--pairing`.
        #[arg(long)]
        pin: Option<String>,
    },
    Ping,
}

/// Where to connect and which credentials to present.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    pub url: String,
    pub bearer: Option<String>,
    pub pin: Option<String>,
}

impl Args {
    /// Resolve the target display. With only a pairing payload, the PIN
    /// doubles as the bearer credential until `register` yields a token.
    pub fn endpoint(&self) -> Result<Endpoint, String> {
        match (&self.pairing, &self.url) {
            (Some(raw), _) => {
                let payload = PairingPayload::parse(raw).map_err(|e| e.to_string())?;
                Ok(Endpoint {
                    url: payload.ws_url(),
                    bearer: self.token.clone().or_else(|| Some(payload.pin.clone())),
                    pin: Some(payload.pin),
                })
            }
            (None, Some(url)) => Ok(Endpoint {
                url: url.clone(),
                bearer: self.token.clone(),
                pin: None,
            }),
            (None, None) => Err("either --pairing or --url is required".into()),
        }
    }
}

impl RemoteCommand {
    pub fn to_command(&self, pairing_pin: Option<&str>) -> Command {
        let kind = match self {
            Self::Open { url } => CommandKind::OpenUrl { url: url.clone() },
            Self::Play {
                url,
                title,
                start_ms,
            } => CommandKind::PlayVideo {
                url: url.clone(),
                title: title.clone(),
                start_position_ms: *start_ms,
            },
            Self::Send { url } if classify_as_video(url) => CommandKind::PlayVideo {
                url: url.clone(),
                title: None,
                start_position_ms: 0,
            },
            Self::Send { url } => CommandKind::OpenUrl { url: url.clone() },
            Self::Back => CommandKind::NavigateBack,
            Self::Forward => CommandKind::NavigateForward,
            Self::Pause => CommandKind::Pause,
            Self::Resume => CommandKind::Resume,
            Self::Stop => CommandKind::Stop,
            Self::Volume { level } => CommandKind::SetVolume { level: *level },
            Self::Seek { position_ms } => CommandKind::Seek {
                position_ms: *position_ms,
            },
            Self::Register {
                name,
                device_id,
                pin,
            } => CommandKind::Register {
                device_id: device_id.clone().unwrap_or_else(new_id),
                device_name: name.clone(),
                pin: pin
                    .as_deref()
                    .or(pairing_pin)
                    .unwrap_or_default()
                    .to_string(),
            },
            Self::Ping => CommandKind::Ping,
        };
        Command::new(kind)
    }
}

pub fn parse() -> Args {
    Args::parse()
}
