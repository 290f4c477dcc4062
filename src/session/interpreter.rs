//! Two-mode interpretation of device tokens.
//!
//! In volume mode the encoder changes the current slider's volume in steps
//! of [`VOLUME_STEP`]. Holding the button switches to channel-select mode,
//! where the encoder walks the ordered slider list instead; releasing it
//! makes the highlighted slider current.

use crate::config::ConfigManager;
use crate::protocol::Token;
use tracing::debug;

/// Volume change per encoder detent.
pub const VOLUME_STEP: f32 = 0.01;

/// A slider's volume changed.
#[derive(Debug, Clone, PartialEq)]
pub struct SliderMoveEvent {
    pub slider_id: String,
    /// New volume in `[0.0, 1.0]`.
    pub percent_value: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    #[default]
    Volume,
    ChannelSelect,
}

/// Per-session interpretation state.
#[derive(Debug, Default)]
pub struct Interpreter {
    mode: Mode,
    index: usize,
    current: Option<String>,
    /// Slider count seen at the last refresh. Zero forces a refresh on the
    /// next token.
    cached_slider_count: usize,
}

impl Interpreter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn current_slider(&self) -> Option<&str> {
        self.current.as_deref()
    }

    pub fn cached_slider_count(&self) -> usize {
        self.cached_slider_count
    }

    /// Forget the cached slider count so the next token re-reads the slider
    /// list, clamps the index and re-resolves the current slider.
    pub fn reset_slider_count(&mut self) {
        self.cached_slider_count = 0;
    }

    /// Apply one token.
    ///
    /// A volume change is written back to `config` (marking it dirty) before
    /// the event is returned; at most one event results per token.
    pub fn handle(&mut self, token: Token, config: &ConfigManager) -> Option<SliderMoveEvent> {
        if self.cached_slider_count == 0 {
            self.refresh(config);
        }
        if self.cached_slider_count == 0 {
            debug!(%token, "No sliders configured, ignoring input");
            return None;
        }

        match (self.mode, token) {
            (Mode::Volume, Token::Down) => {
                debug!("Selecting channel");
                self.mode = Mode::ChannelSelect;
                None
            }
            (Mode::Volume, Token::Up) | (Mode::ChannelSelect, Token::Down) => None,
            (Mode::Volume, Token::Left) => self.step_volume(-VOLUME_STEP, config),
            (Mode::Volume, Token::Right) => self.step_volume(VOLUME_STEP, config),
            (Mode::ChannelSelect, Token::Left) => {
                self.index = self.index.saturating_sub(1);
                self.select(config);
                None
            }
            (Mode::ChannelSelect, Token::Right) => {
                self.index = (self.index + 1).min(self.cached_slider_count - 1);
                self.select(config);
                None
            }
            (Mode::ChannelSelect, Token::Up) => {
                debug!("Selecting volume");
                self.mode = Mode::Volume;
                self.current = config.slider_key_at(self.index).ok();
                None
            }
        }
    }

    fn refresh(&mut self, config: &ConfigManager) {
        let count = config.slider_count();
        self.cached_slider_count = count;
        if count == 0 {
            self.index = 0;
            self.current = None;
            return;
        }
        self.index = self.index.min(count - 1);
        self.current = config.slider_key_at(self.index).ok();
        debug!(count, index = self.index, current = ?self.current, "Refreshed slider state");
    }

    fn select(&mut self, config: &ConfigManager) {
        self.current = config.slider_key_at(self.index).ok();
        debug!(index = self.index, current = ?self.current, "Channel");
    }

    fn step_volume(&mut self, delta: f32, config: &ConfigManager) -> Option<SliderMoveEvent> {
        let key = self.current.clone()?;
        let stepped = config.modify_slider(&key, |mapping| {
            let from = mapping.volume;
            mapping.volume = quantize(from + delta);
            (from, mapping.volume)
        });
        let (from, to) = match stepped {
            Ok(step) => step,
            Err(e) => {
                // The slider vanished in a reload; pick up whatever now sits
                // at our index and wait for the next detent.
                debug!(error = %e, "Current slider missing, re-resolving");
                self.current = config.slider_key_at(self.index).ok();
                return None;
            }
        };
        if to == from {
            return None;
        }

        debug!(slider = %key, from, to, "Changing volume");
        Some(SliderMoveEvent {
            slider_id: key,
            percent_value: to,
        })
    }
}

/// Clamp to `[0.0, 1.0]` and snap to whole percent so repeated steps do not
/// accumulate float drift.
fn quantize(value: f32) -> f32 {
    ((value.clamp(0.0, 1.0) * 100.0).round() / 100.0).clamp(0.0, 1.0)
}
