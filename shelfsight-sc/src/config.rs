//! Configuration for audio output

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Where the centering tone is rendered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToneOutputKind {
    /// Tone parameters are tracked but nothing is played
    Null,
    /// Default output device (requires the `audio-output` feature)
    Device,
}

/// Audio configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioConfig {
    /// Tone output
    pub output: ToneOutputKind,

    /// Output device name (None = default device)
    pub device_name: Option<String>,

    /// Directory holding `shutter.wav`, `processing.wav` and `complete.wav`.
    /// Cues are skipped when unset.
    pub cue_dir: Option<PathBuf>,

    /// Program that plays a cue file (None = platform default: afplay or aplay)
    pub cue_player: Option<String>,

    /// Loading chime frequency (Hz)
    pub chime_frequency_hz: f32,

    /// Loading chime gain (0.0-1.0)
    pub chime_gain: f32,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            output: ToneOutputKind::Null,
            device_name: None,
            cue_dir: None,
            cue_player: None,
            chime_frequency_hz: 660.0,
            chime_gain: 0.2,
        }
    }
}

impl AudioConfig {
    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if !(20.0..=20_000.0).contains(&self.chime_frequency_hz) {
            return Err("Chime frequency must be between 20 and 20000 Hz".to_string());
        }

        if !(0.0..=1.0).contains(&self.chime_gain) {
            return Err("Chime gain must be between 0.0 and 1.0".to_string());
        }

        if let Some(ref name) = self.device_name {
            if name.is_empty() || name.len() > 256 {
                return Err("Device name must be 1-256 characters".to_string());
            }
        }

        if let Some(ref player) = self.cue_player {
            if player.trim().is_empty() {
                return Err("Cue player cannot be empty if provided".to_string());
            }
        }

        Ok(())
    }
}
