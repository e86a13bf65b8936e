//! Engine used when speech is unavailable

use crate::engines::SpeechEngine;
use crate::error::SpeechError;
use async_trait::async_trait;

/// Always unavailable; the channel skips every cue sent to it
#[derive(Debug, Default, Clone, Copy)]
pub struct SilentSpeechEngine;

#[async_trait]
impl SpeechEngine for SilentSpeechEngine {
    async fn speak(&self, _text: &str) -> Result<(), SpeechError> {
        Ok(())
    }

    fn is_available(&self) -> bool {
        false
    }

    fn name(&self) -> &str {
        "silent"
    }
}
