//! shelfsight-sc: sound for the shelfsight assistant
//!
//! - [`Sonifier`]: one continuous tone per camera session whose pitch
//!   encodes how centered the tracked object is
//! - [`LoadingChime`]: steady tone while the detection model loads
//! - [`CuePlayer`]: short best-effort sound cues (shutter, processing, complete)

pub mod error;
pub mod config;
pub mod tone;
pub mod sonifier;
pub mod chime;
pub mod cues;
#[cfg(feature = "audio-output")]
pub mod device;

pub use error::AudioError;
pub use config::{AudioConfig, ToneOutputKind};
pub use tone::{NullToneOutput, SineRenderer, ToneGenerator, ToneOutput, ToneParams};
pub use sonifier::{frequency_for, Sonifier};
pub use chime::LoadingChime;
pub use cues::{build_cue_player, CommandCuePlayer, CuePlayer, NullCuePlayer, SoundCue};

use std::sync::Arc;

/// Build the configured tone output
pub fn build_tone_output(config: &AudioConfig) -> Result<Arc<dyn ToneOutput>, AudioError> {
    config.validate().map_err(AudioError::Config)?;
    match config.output {
        ToneOutputKind::Null => Ok(Arc::new(NullToneOutput)),
        #[cfg(feature = "audio-output")]
        ToneOutputKind::Device => Ok(Arc::new(device::DeviceToneOutput::new(config.device_name.clone()))),
        #[cfg(not(feature = "audio-output"))]
        ToneOutputKind::Device => Err(AudioError::Config(
            "Device tone output requires the 'audio-output' feature".to_string(),
        )),
    }
}
