//! Configuration for speech output

use serde::{Deserialize, Serialize};

/// Speech configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpeechConfig {
    /// Enable speech; when off every cue resolves immediately as skipped
    pub enabled: bool,

    /// Which engine speaks
    pub engine: TtsEngineKind,

    /// Voice settings
    pub voice: VoiceConfig,

    /// Speech rate (words per minute, 80-500, default 150)
    pub rate: u32,

    /// Volume (0.0-1.0, default 0.8)
    pub volume: f32,

    /// Pitch adjustment (-1.0 to 1.0, default 0.0)
    pub pitch: f32,

    /// Maximum characters spoken per utterance; longer text is truncated
    pub max_text_len: usize,
}

/// TTS engine type
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TtsEngineKind {
    /// Platform command-line TTS (espeak-ng / espeak on Linux, say on macOS)
    Native,
    /// Writes utterances to the log and waits as long as reading them would take
    Console,
    /// Speech unavailable; all cues are skipped
    Silent,
}

/// Voice configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VoiceConfig {
    /// Voice name/identifier
    pub name: Option<String>,

    /// Language code (e.g., "en-US", "es-ES")
    pub language: String,
}

impl Default for SpeechConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            engine: TtsEngineKind::Native,
            voice: VoiceConfig::default(),
            rate: 150,
            volume: 0.8,
            pitch: 0.0,
            max_text_len: 2_000,
        }
    }
}

impl Default for VoiceConfig {
    fn default() -> Self {
        Self {
            name: None,
            language: "en-US".to_string(),
        }
    }
}

impl VoiceConfig {
    /// Both values end up as the `-v` argument of espeak or say
    pub fn validate(&self) -> Result<(), String> {
        if self.language.is_empty()
            || !self.language.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
        {
            return Err(format!("Invalid language code '{}'", self.language));
        }

        if let Some(ref name) = self.name {
            if name.trim().is_empty() || name.starts_with('-') {
                return Err(format!("Invalid voice name '{}'", name));
            }
        }

        Ok(())
    }
}

impl SpeechConfig {
    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.rate < 80 || self.rate > 500 {
            return Err("Speech rate must be between 80 and 500 words per minute".to_string());
        }

        if !(0.0..=1.0).contains(&self.volume) {
            return Err("Volume must be between 0.0 and 1.0".to_string());
        }

        if !(-1.0..=1.0).contains(&self.pitch) {
            return Err("Pitch must be between -1.0 and 1.0".to_string());
        }

        if self.max_text_len == 0 || self.max_text_len > 100_000 {
            return Err("Max text length must be between 1 and 100000".to_string());
        }

        self.voice.validate()
    }
}
