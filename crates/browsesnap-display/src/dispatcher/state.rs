use std::collections::BTreeMap;

/// What the display is showing.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum DisplayState {
    /// Waiting for a controller; the pairing code is on screen.
    #[default]
    Pairing,
    Browsing {
        url: String,
    },
    VideoPlayer {
        url: String,
        title: Option<String>,
        is_playing: bool,
        /// 0..=100
        volume: u8,
        position_ms: i64,
    },
}

impl DisplayState {
    /// Status name carried by `status_update` broadcasts.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Pairing => "pairing",
            Self::Browsing { .. } => "browsing",
            Self::VideoPlayer { .. } => "video_player",
        }
    }

    pub fn details(&self) -> BTreeMap<String, String> {
        let mut details = BTreeMap::new();
        match self {
            Self::Pairing => {}
            Self::Browsing { url } => {
                details.insert("url".into(), url.clone());
            }
            Self::VideoPlayer {
                url,
                title,
                is_playing,
                volume,
                position_ms,
            } => {
                details.insert("url".into(), url.clone());
                if let Some(title) = title {
                    details.insert("title".into(), title.clone());
                }
                details.insert("isPlaying".into(), is_playing.to_string());
                details.insert("volume".into(), volume.to_string());
                details.insert("positionMs".into(), position_ms.to_string());
            }
        }
        details
    }
}
