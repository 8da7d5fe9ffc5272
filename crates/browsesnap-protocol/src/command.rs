//! Controller → display instructions.

use browsesnap_common::now_millis;
use serde::{Deserialize, Serialize};

/// Every wire tag a [`CommandKind`] can carry.
pub const COMMAND_TAGS: [&str; 11] = [
    "open_url",
    "play_video",
    "navigate_back",
    "navigate_forward",
    "pause",
    "resume",
    "stop",
    "set_volume",
    "seek",
    "register",
    "ping",
];

/// A command plus the producer's creation time.
///
/// The timestamp is not required to be monotonic across reconnects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Command {
    #[serde(flatten)]
    pub kind: CommandKind,
    #[serde(default = "now_millis")]
    pub timestamp: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum CommandKind {
    OpenUrl {
        url: String,
    },
    PlayVideo {
        url: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        title: Option<String>,
        #[serde(default)]
        start_position_ms: i64,
    },
    NavigateBack,
    NavigateForward,
    Pause,
    Resume,
    Stop,
    SetVolume {
        level: i32,
    },
    Seek {
        position_ms: i64,
    },
    Register {
        device_id: String,
        #[serde(default = "default_device_name")]
        device_name: String,
        #[serde(default)]
        pin: String,
    },
    Ping,
}

fn default_device_name() -> String {
    "Mobile".into()
}

impl Command {
    /// Stamp `kind` with the current time.
    pub fn new(kind: CommandKind) -> Self {
        Self {
            kind,
            timestamp: now_millis(),
        }
    }

    pub fn open_url(url: impl Into<String>) -> Self {
        Self::new(CommandKind::OpenUrl { url: url.into() })
    }

    pub fn play_video(url: impl Into<String>, title: Option<String>) -> Self {
        Self::new(CommandKind::PlayVideo {
            url: url.into(),
            title,
            start_position_ms: 0,
        })
    }

    pub fn register(
        device_id: impl Into<String>,
        device_name: impl Into<String>,
        pin: impl Into<String>,
    ) -> Self {
        Self::new(CommandKind::Register {
            device_id: device_id.into(),
            device_name: device_name.into(),
            pin: pin.into(),
        })
    }

    /// Wire tag of this command, echoed back as `commandType` in acks.
    pub fn type_name(&self) -> &'static str {
        self.kind.type_name()
    }
}

impl CommandKind {
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::OpenUrl { .. } => "open_url",
            Self::PlayVideo { .. } => "play_video",
            Self::NavigateBack => "navigate_back",
            Self::NavigateForward => "navigate_forward",
            Self::Pause => "pause",
            Self::Resume => "resume",
            Self::Stop => "stop",
            Self::SetVolume { .. } => "set_volume",
            Self::Seek { .. } => "seek",
            Self::Register { .. } => "register",
            Self::Ping => "ping",
        }
    }

    /// Commands a connection may send before it has paired.
    pub fn allowed_before_pairing(&self) -> bool {
        matches!(self, Self::Register { .. } | Self::Ping)
    }
}

impl From<CommandKind> for Command {
    fn from(kind: CommandKind) -> Self {
        Self::new(kind)
    }
}
