//! Configuration for the interaction core

use crate::phrases::TUTORIAL;
use serde::{Deserialize, Serialize};
use shelfsight_core::{FacingMode, Settings, TimingConfig};
use shelfsight_sc::AudioConfig;

/// Assistant configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssistantConfig {
    /// User settings (sanitized on use)
    pub settings: Settings,

    /// Loop timers and delays
    pub timing: TimingConfig,

    /// Loading chime parameters
    pub audio: AudioConfig,

    /// Camera used by the first session
    pub facing: FacingMode,

    /// Start a session automatically once the model is loaded
    pub auto_start: bool,

    /// JPEG quality of uploaded snapshots (1-100)
    pub jpeg_quality: u8,

    /// Tutorial narration, one paragraph per entry
    pub tutorial: Vec<String>,

    /// Command mailbox capacity
    pub command_buffer: usize,

    /// Event broadcast capacity
    pub event_buffer: usize,
}

impl Default for AssistantConfig {
    fn default() -> Self {
        Self {
            settings: Settings::default(),
            timing: TimingConfig::default(),
            audio: AudioConfig::default(),
            facing: FacingMode::User,
            auto_start: true,
            jpeg_quality: 85,
            tutorial: TUTORIAL.iter().map(|p| p.to_string()).collect(),
            command_buffer: 64,
            event_buffer: 256,
        }
    }
}

impl AssistantConfig {
    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        self.timing.validate()?;
        self.audio.validate()?;

        if self.jpeg_quality == 0 || self.jpeg_quality > 100 {
            return Err("JPEG quality must be between 1 and 100".to_string());
        }

        if self.command_buffer == 0 || self.command_buffer > 10_000 {
            return Err("Command buffer must be between 1 and 10000".to_string());
        }

        if self.event_buffer == 0 || self.event_buffer > 100_000 {
            return Err("Event buffer must be between 1 and 100000".to_string());
        }

        Ok(())
    }
}
