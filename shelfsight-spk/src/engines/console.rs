//! Engine that prints utterances instead of voicing them

use crate::engines::SpeechEngine;
use crate::error::SpeechError;
use async_trait::async_trait;
use std::time::Duration;
use tracing::info;

/// Logs each utterance and holds it for its approximate spoken duration
pub struct ConsoleSpeechEngine {
    words_per_minute: u32,
}

impl ConsoleSpeechEngine {
    pub fn new(words_per_minute: u32) -> Self {
        Self {
            words_per_minute: words_per_minute.max(1),
        }
    }

    /// How long reading `text` aloud takes at the configured rate
    pub fn duration_for(&self, text: &str) -> Duration {
        let words = text.split_whitespace().count().max(1) as u64;
        Duration::from_millis(words * 60_000 / self.words_per_minute as u64)
    }
}

#[async_trait]
impl SpeechEngine for ConsoleSpeechEngine {
    async fn speak(&self, text: &str) -> Result<(), SpeechError> {
        info!(target: "shelfsight::speech", "Speaking: {}", text);
        tokio::time::sleep(self.duration_for(text)).await;
        Ok(())
    }

    fn is_available(&self) -> bool {
        true
    }

    fn name(&self) -> &str {
        "console"
    }
}
