//! TTS engine implementations

pub mod native;
pub mod console;
pub mod silent;

use crate::config::{SpeechConfig, TtsEngineKind};
use crate::error::SpeechError;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::warn;

/// Trait for TTS engines
///
/// `speak` resolves when the utterance has been fully spoken. Dropping the
/// future must stop playback.
#[async_trait]
pub trait SpeechEngine: Send + Sync {
    /// Speak text to completion
    async fn speak(&self, text: &str) -> Result<(), SpeechError>;

    /// Check if engine is available
    fn is_available(&self) -> bool;

    /// Get engine name
    fn name(&self) -> &str;
}

/// Build the configured engine
///
/// A native engine with no usable TTS program degrades to silent.
pub fn build_engine(config: &SpeechConfig) -> Result<Arc<dyn SpeechEngine>, SpeechError> {
    config.validate().map_err(SpeechError::Config)?;

    if !config.enabled {
        return Ok(Arc::new(silent::SilentSpeechEngine));
    }

    let engine: Arc<dyn SpeechEngine> = match config.engine {
        TtsEngineKind::Native => {
            let native = native::NativeSpeechEngine::new(config);
            if native.is_available() {
                Arc::new(native)
            } else {
                warn!("No native TTS program found, speech cues will be skipped");
                Arc::new(silent::SilentSpeechEngine)
            }
        }
        TtsEngineKind::Console => Arc::new(console::ConsoleSpeechEngine::new(config.rate)),
        TtsEngineKind::Silent => Arc::new(silent::SilentSpeechEngine),
    };
    Ok(engine)
}

/// Strip control characters and cap the length
pub(crate) fn sanitize_text(text: &str, max_len: usize) -> String {
    text.chars()
        .map(|c| if c.is_control() { ' ' } else { c })
        .take(max_len)
        .collect::<String>()
        .trim()
        .to_string()
}
