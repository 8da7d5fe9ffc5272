//! The rendering side of the display, behind a trait.
//!
//! A real display drives a browser view and a video player; tests and the
//! headless binary use [`LoggingSurface`].

use browsesnap_common::DispatchError;
use tracing::info;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SurfaceError {
    #[error("failed to load {url}: {reason}")]
    Load { url: String, reason: String },

    #[error("player error: {0}")]
    Player(String),
}

impl From<SurfaceError> for DispatchError {
    fn from(err: SurfaceError) -> Self {
        DispatchError::Surface(err.to_string())
    }
}

/// Side effects of display transitions. Called only from the dispatcher
/// worker, one command at a time.
pub trait DisplaySurface {
    fn load_url(&mut self, url: &str) -> Result<(), SurfaceError>;

    /// Step back in the browser history. `None` when there is no earlier page.
    fn go_back(&mut self) -> Result<Option<String>, SurfaceError>;

    /// Step forward in the browser history. `None` when already at the newest page.
    fn go_forward(&mut self) -> Result<Option<String>, SurfaceError>;

    fn play_video(
        &mut self,
        url: &str,
        title: Option<&str>,
        start_position_ms: i64,
    ) -> Result<(), SurfaceError>;

    fn pause(&mut self) -> Result<(), SurfaceError>;

    fn resume(&mut self) -> Result<(), SurfaceError>;

    fn stop_video(&mut self) -> Result<(), SurfaceError>;

    fn set_volume(&mut self, level: u8) -> Result<(), SurfaceError>;

    fn seek(&mut self, position_ms: i64) -> Result<(), SurfaceError>;
}

/// Headless surface: keeps a browser-style history and logs every effect.
#[derive(Debug, Default)]
pub struct LoggingSurface {
    history: Vec<String>,
    /// Index of the current page in `history`.
    cursor: Option<usize>,
}

impl LoggingSurface {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current_page(&self) -> Option<&str> {
        self.cursor.map(|i| self.history[i].as_str())
    }
}

impl DisplaySurface for LoggingSurface {
    fn load_url(&mut self, url: &str) -> Result<(), SurfaceError> {
        // Loading a page drops any forward history.
        let keep = self.cursor.map_or(0, |i| i + 1);
        self.history.truncate(keep);
        self.history.push(url.to_string());
        self.cursor = Some(self.history.len() - 1);
        info!(url = %url, "Loading page");
        Ok(())
    }

    fn go_back(&mut self) -> Result<Option<String>, SurfaceError> {
        match self.cursor {
            Some(i) if i > 0 => {
                self.cursor = Some(i - 1);
                info!(url = %self.history[i - 1], "Navigated back");
                Ok(Some(self.history[i - 1].clone()))
            }
            _ => {
                info!("No earlier page, leaving the browser");
                self.history.clear();
                self.cursor = None;
                Ok(None)
            }
        }
    }

    fn go_forward(&mut self) -> Result<Option<String>, SurfaceError> {
        match self.cursor {
            Some(i) if i + 1 < self.history.len() => {
                self.cursor = Some(i + 1);
                info!(url = %self.history[i + 1], "Navigated forward");
                Ok(Some(self.history[i + 1].clone()))
            }
            _ => Ok(None),
        }
    }

    fn play_video(
        &mut self,
        url: &str,
        title: Option<&str>,
        start_position_ms: i64,
    ) -> Result<(), SurfaceError> {
        info!(url = %url, title = ?title, start_position_ms, "Playing video");
        Ok(())
    }

    fn pause(&mut self) -> Result<(), SurfaceError> {
        info!("Video paused");
        Ok(())
    }

    fn resume(&mut self) -> Result<(), SurfaceError> {
        info!("Video resumed");
        Ok(())
    }

    fn stop_video(&mut self) -> Result<(), SurfaceError> {
        info!("Video stopped");
        Ok(())
    }

    fn set_volume(&mut self, level: u8) -> Result<(), SurfaceError> {
        info!(level, "Volume set");
        Ok(())
    }

    fn seek(&mut self, position_ms: i64) -> Result<(), SurfaceError> {
        info!(position_ms, "Seeked");
        Ok(())
    }
}
