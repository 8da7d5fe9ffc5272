//! Display state machine.
//!
//! `apply` is deterministic: the same commands against the same surface
//! results always yield the same states and replies.

use browsesnap_common::{CommandError, DispatchError};
use browsesnap_protocol::security::{classify_as_video, is_valid_url, validate_token};
use browsesnap_protocol::{CommandKind, PairingSession, Response};
use tracing::{debug, info, warn};

use super::state::DisplayState;
use super::surface::{DisplaySurface, SurfaceError};

/// Where `stop` lands when no page was opened before the video.
pub const BLANK_PAGE: &str = "about:blank";

/// Result of applying one command.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Outcome {
    /// Sent to the connection that issued the command.
    pub reply: Option<Response>,
    pub state_changed: bool,
    /// The issuing connection presented the right PIN.
    pub paired: bool,
}

impl Outcome {
    fn reply(response: Response) -> Self {
        Self {
            reply: Some(response),
            ..Self::default()
        }
    }
}

pub struct StateMachine {
    state: DisplayState,
    /// Most recent non-video page shown in the browser, restored by `stop`.
    last_page: Option<String>,
    default_volume: u8,
    pairing: PairingSession,
}

impl StateMachine {
    pub fn new(pairing: PairingSession, default_volume: u8) -> Self {
        Self {
            state: DisplayState::Pairing,
            last_page: None,
            default_volume: default_volume.min(100),
            pairing,
        }
    }

    pub fn state(&self) -> &DisplayState {
        &self.state
    }

    /// Apply `command` from a connection that is (or is not yet) paired.
    ///
    /// Surface failures leave the state untouched and come back as a
    /// `DISPATCH_FAILED` reply.
    pub fn apply(
        &mut self,
        command: &CommandKind,
        paired: bool,
        surface: &mut dyn DisplaySurface,
    ) -> Outcome {
        if !paired && !command.allowed_before_pairing() {
            debug!(command = command.type_name(), "Rejecting command from unpaired controller");
            return Outcome::reply(Response::from(&CommandError::NotPaired));
        }

        match self.transition(command, surface) {
            Ok(outcome) => outcome,
            Err(e) => {
                warn!(command = command.type_name(), error = %e, "Display surface failed");
                Outcome::reply(Response::from(&DispatchError::from(e)))
            }
        }
    }

    fn transition(
        &mut self,
        command: &CommandKind,
        surface: &mut dyn DisplaySurface,
    ) -> Result<Outcome, SurfaceError> {
        use CommandKind as C;
        use DisplayState as S;

        let next = match (command, &self.state) {
            (C::Ping, _) => return Ok(Outcome::reply(Response::pong())),
            (
                C::Register {
                    device_id,
                    device_name,
                    pin,
                },
                _,
            ) => return Ok(self.register(device_id, device_name, pin)),

            (C::OpenUrl { url }, _) => {
                if !is_valid_url(url) {
                    let err = CommandError::InvalidUrl(url.clone());
                    return Ok(Outcome::reply(Response::from(&err)));
                }
                surface.load_url(url)?;
                self.remember_page(url);
                S::Browsing { url: url.clone() }
            }
            (
                C::PlayVideo {
                    url,
                    title,
                    start_position_ms,
                },
                current,
            ) => {
                let volume = match current {
                    S::VideoPlayer { volume, .. } => *volume,
                    _ => self.default_volume,
                };
                let position_ms = (*start_position_ms).max(0);
                surface.play_video(url, title.as_deref(), position_ms)?;
                S::VideoPlayer {
                    url: url.clone(),
                    title: title.clone(),
                    is_playing: true,
                    volume,
                    position_ms,
                }
            }

            (C::NavigateBack, S::Browsing { .. }) => match surface.go_back()? {
                Some(url) => {
                    self.remember_page(&url);
                    S::Browsing { url }
                }
                None => {
                    self.last_page = None;
                    S::Pairing
                }
            },
            (C::NavigateForward, S::Browsing { .. }) => match surface.go_forward()? {
                Some(url) => {
                    self.remember_page(&url);
                    S::Browsing { url }
                }
                None => return Ok(Outcome::default()),
            },

            (C::Pause, S::VideoPlayer { .. }) => {
                surface.pause()?;
                self.update_video(|playing, _, _| *playing = false)
            }
            (C::Resume, S::VideoPlayer { .. }) => {
                surface.resume()?;
                self.update_video(|playing, _, _| *playing = true)
            }
            (C::Stop, S::VideoPlayer { .. }) => {
                surface.stop_video()?;
                S::Browsing {
                    url: self
                        .last_page
                        .clone()
                        .unwrap_or_else(|| BLANK_PAGE.to_string()),
                }
            }
            (C::SetVolume { level }, S::VideoPlayer { .. }) => {
                let level = (*level).clamp(0, 100) as u8;
                surface.set_volume(level)?;
                self.update_video(|_, volume, _| *volume = level)
            }
            (C::Seek { position_ms }, S::VideoPlayer { .. }) => {
                let target = (*position_ms).max(0);
                surface.seek(target)?;
                self.update_video(|_, _, position| *position = target)
            }

            (command, state) => {
                debug!(
                    command = command.type_name(),
                    state = state.name(),
                    "Ignoring command outside its state"
                );
                return Ok(Outcome::default());
            }
        };

        let state_changed = next != self.state;
        if state_changed {
            debug!(from = self.state.name(), to = next.name(), "Display state changed");
            self.state = next;
        }
        Ok(Outcome {
            state_changed,
            ..Outcome::default()
        })
    }

    fn remember_page(&mut self, url: &str) {
        if !classify_as_video(url) {
            self.last_page = Some(url.to_string());
        }
    }

    fn register(&self, device_id: &str, device_name: &str, pin: &str) -> Outcome {
        if !validate_token(pin, &self.pairing.pin) {
            warn!(device_id, device_name, "Pairing rejected: wrong pin");
            return Outcome::reply(Response::from(&CommandError::InvalidPin));
        }
        info!(device_id, device_name, "Controller paired");
        Outcome {
            reply: Some(Response::pairing_success(
                self.pairing.device_id.as_str(),
                self.pairing.display_name.as_str(),
                self.pairing.token.as_str(),
            )),
            state_changed: false,
            paired: true,
        }
    }

    /// Copy of the current video state with `update(is_playing, volume, position_ms)` applied.
    fn update_video(&self, update: impl FnOnce(&mut bool, &mut u8, &mut i64)) -> DisplayState {
        let mut next = self.state.clone();
        if let DisplayState::VideoPlayer {
            is_playing,
            volume,
            position_ms,
            ..
        } = &mut next
        {
            update(is_playing, volume, position_ms);
        }
        next
    }
}
