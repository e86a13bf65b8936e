//! User settings and loop timing configuration

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Allowed range for the capture centering threshold (percent)
pub const CENTER_THRESHOLD_RANGE: (f32, f32) = (50.0, 100.0);
/// Allowed range for the tone volume
pub const BEEP_VOLUME_RANGE: (f32, f32) = (0.0, 1.0);
/// Allowed range for tone frequencies (Hz)
pub const FREQUENCY_RANGE: (f32, f32) = (20.0, 20_000.0);
/// Allowed range for the no-object delay before the move prompt (ms)
pub const MOVE_PROMPT_DELAY_RANGE: (u64, u64) = (500, 60_000);
/// Allowed range for the cooldown between captures (ms)
pub const CAPTURE_DELAY_RANGE: (u64, u64) = (0, 60_000);

/// Attributes the description service can be asked to report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DescriptionField {
    Brand,
    Name,
    ExpirationRange,
    Mold,
    Recipe,
}

impl DescriptionField {
    /// Fixed reporting order
    pub const ORDER: [DescriptionField; 5] = [
        DescriptionField::Brand,
        DescriptionField::Name,
        DescriptionField::ExpirationRange,
        DescriptionField::Mold,
        DescriptionField::Recipe,
    ];

    /// Phrase used when asking the vision model for this field
    pub fn prompt_phrase(&self) -> &'static str {
        match self {
            DescriptionField::Brand => "the brand",
            DescriptionField::Name => "the object name",
            DescriptionField::ExpirationRange => "the expiration date range in months based on the brand",
            DescriptionField::Mold => "whether any mold is visible (yes or no)",
            DescriptionField::Recipe => "a link to a recipe using the object",
        }
    }

    /// Example answer fragment for this field
    pub fn example(&self) -> &'static str {
        match self {
            DescriptionField::Brand => "Horizon",
            DescriptionField::Name => "Milk",
            DescriptionField::ExpirationRange => "1-2 months",
            DescriptionField::Mold => "no",
            DescriptionField::Recipe => "https://example.com/recipes/milk",
        }
    }
}

/// Which descriptive fields to request from the description service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FieldSelection {
    pub brand: bool,
    pub name: bool,
    pub expiration_range: bool,
    pub mold: bool,
    pub recipe: bool,
}

impl Default for FieldSelection {
    fn default() -> Self {
        Self {
            brand: false,
            name: true,
            expiration_range: true,
            mold: false,
            recipe: false,
        }
    }
}

impl FieldSelection {
    /// Check whether a single field is selected
    pub fn contains(&self, field: DescriptionField) -> bool {
        match field {
            DescriptionField::Brand => self.brand,
            DescriptionField::Name => self.name,
            DescriptionField::ExpirationRange => self.expiration_range,
            DescriptionField::Mold => self.mold,
            DescriptionField::Recipe => self.recipe,
        }
    }

    /// Selected fields in reporting order (brand, name, expiration, mold, recipe)
    pub fn enabled(&self) -> Vec<DescriptionField> {
        DescriptionField::ORDER
            .iter()
            .copied()
            .filter(|f| self.contains(*f))
            .collect()
    }

    /// True when nothing is selected
    pub fn is_empty(&self) -> bool {
        self.enabled().is_empty()
    }
}

/// User-facing settings consumed by the interaction core
///
/// Numeric values outside their documented bounds are clamped by
/// [`Settings::sanitized`], never rejected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Settings {
    /// Sonification tone and sound cues
    pub sounds_enabled: bool,

    /// Spoken "Stop" cue before a capture
    pub stop_alert_enabled: bool,

    /// Spoken move prompt after a period without detections
    pub move_prompt_enabled: bool,

    /// Time without a detection before the move prompt starts (ms)
    pub move_prompt_delay_ms: u64,

    /// Minimum time between two captures (ms)
    pub capture_delay_ms: u64,

    /// Centeredness percentage required to trigger a capture (50-100)
    pub center_threshold_percent: f32,

    /// Tone volume (0.0-1.0)
    pub beep_volume: f32,

    /// Tone frequency at centeredness 0 (Hz)
    pub min_frequency_hz: f32,

    /// Tone frequency at centeredness 1 (Hz)
    pub max_frequency_hz: f32,

    /// Descriptive fields requested from the description service
    pub fields: FieldSelection,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            sounds_enabled: true,
            stop_alert_enabled: true,
            move_prompt_enabled: true,
            move_prompt_delay_ms: 3000,
            capture_delay_ms: 3000,
            center_threshold_percent: 80.0,
            beep_volume: 0.5,
            min_frequency_hz: 200.0,
            max_frequency_hz: 1000.0,
            fields: FieldSelection::default(),
        }
    }
}

fn clamp_f32(value: f32, (min, max): (f32, f32), fallback: f32) -> f32 {
    if value.is_nan() {
        return fallback;
    }
    value.clamp(min, max)
}

impl Settings {
    /// Return a copy with every numeric option clamped to its bounds
    pub fn sanitized(&self) -> Self {
        let defaults = Settings::default();
        let mut out = self.clone();

        out.move_prompt_delay_ms = self
            .move_prompt_delay_ms
            .clamp(MOVE_PROMPT_DELAY_RANGE.0, MOVE_PROMPT_DELAY_RANGE.1);
        out.capture_delay_ms = self
            .capture_delay_ms
            .clamp(CAPTURE_DELAY_RANGE.0, CAPTURE_DELAY_RANGE.1);
        out.center_threshold_percent = clamp_f32(
            self.center_threshold_percent,
            CENTER_THRESHOLD_RANGE,
            defaults.center_threshold_percent,
        );
        out.beep_volume = clamp_f32(self.beep_volume, BEEP_VOLUME_RANGE, defaults.beep_volume);

        let mut min = clamp_f32(self.min_frequency_hz, FREQUENCY_RANGE, defaults.min_frequency_hz);
        let mut max = clamp_f32(self.max_frequency_hz, FREQUENCY_RANGE, defaults.max_frequency_hz);
        if min > max {
            std::mem::swap(&mut min, &mut max);
        }
        // min < max must hold strictly
        if min == max {
            if max < FREQUENCY_RANGE.1 {
                max = (min + 1.0).min(FREQUENCY_RANGE.1);
            } else {
                min = max - 1.0;
            }
        }
        out.min_frequency_hz = min;
        out.max_frequency_hz = max;

        out
    }

    pub fn move_prompt_delay(&self) -> Duration {
        Duration::from_millis(self.move_prompt_delay_ms)
    }

    pub fn capture_delay(&self) -> Duration {
        Duration::from_millis(self.capture_delay_ms)
    }

    /// Default location of the persisted settings file
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .map(|mut p| {
                p.push("shelfsight");
                p.push("settings.toml");
                p
            })
            .unwrap_or_else(|| PathBuf::from("./shelfsight-settings.toml"))
    }

    /// Load settings from a TOML, YAML or JSON file (chosen by extension)
    ///
    /// Loaded values are sanitized before being returned.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let settings: Settings = match extension_of(path).as_str() {
            "yaml" | "yml" => serde_yaml::from_str(&contents)
                .map_err(|e| Error::Deserialization(format!("{}: {}", path.display(), e)))?,
            "json" => serde_json::from_str(&contents)
                .map_err(|e| Error::Deserialization(format!("{}: {}", path.display(), e)))?,
            _ => toml::from_str(&contents)
                .map_err(|e| Error::Deserialization(format!("{}: {}", path.display(), e)))?,
        };
        Ok(settings.sanitized())
    }

    /// Persist settings to a file (last write wins)
    pub fn save(&self, path: &Path) -> Result<()> {
        let contents = match extension_of(path).as_str() {
            "yaml" | "yml" => serde_yaml::to_string(self)
                .map_err(|e| Error::Serialization(e.to_string()))?,
            "json" => serde_json::to_string_pretty(self)
                .map_err(|e| Error::Serialization(e.to_string()))?,
            _ => toml::to_string_pretty(self)
                .map_err(|e| Error::Serialization(e.to_string()))?,
        };

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        std::fs::write(path, contents)?;
        Ok(())
    }
}

fn extension_of(path: &Path) -> String {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default()
}

/// Timers and delays of the interaction loop
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingConfig {
    /// Interval between detection ticks (ms), roughly one display frame
    pub frame_interval_ms: u64,

    /// Delay before retrying after a failed detection tick (ms)
    pub tick_backoff_ms: u64,

    /// Interval between repeated move prompts (ms)
    pub nudge_interval_ms: u64,

    /// Number of unanswered move prompts before pausing
    pub max_nudges: u32,

    /// Pause after a spoken result before detection resumes (ms)
    pub settle_delay_ms: u64,

    /// Delay before restarting after a settings/tutorial overlay closes (ms)
    pub restart_grace_ms: u64,

    /// Delay before restarting after switching camera facing mode (ms)
    pub facing_switch_delay_ms: u64,

    /// Delay between silencing the tone and tearing it down (ms)
    pub tone_teardown_ms: u64,

    /// Delay between model load and the first camera session (ms)
    pub startup_delay_ms: u64,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            frame_interval_ms: 33,
            tick_backoff_ms: 1000,
            nudge_interval_ms: 5000,
            max_nudges: 3,
            settle_delay_ms: 1500,
            restart_grace_ms: 1000,
            facing_switch_delay_ms: 2000,
            tone_teardown_ms: 100,
            startup_delay_ms: 1000,
        }
    }
}

impl TimingConfig {
    /// Validate configuration
    pub fn validate(&self) -> std::result::Result<(), String> {
        if self.frame_interval_ms == 0 {
            return Err("Frame interval must be greater than 0".to_string());
        }

        if self.frame_interval_ms > 10_000 {
            return Err("Frame interval too large (max 10000 ms)".to_string());
        }

        if self.nudge_interval_ms == 0 {
            return Err("Nudge interval must be greater than 0".to_string());
        }

        if self.max_nudges == 0 {
            return Err("Max nudges must be at least 1".to_string());
        }

        if self.max_nudges > 100 {
            return Err("Max nudges too large (max 100)".to_string());
        }

        Ok(())
    }

    pub fn frame_interval(&self) -> Duration {
        Duration::from_millis(self.frame_interval_ms)
    }

    pub fn tick_backoff(&self) -> Duration {
        Duration::from_millis(self.tick_backoff_ms)
    }

    pub fn nudge_interval(&self) -> Duration {
        Duration::from_millis(self.nudge_interval_ms)
    }

    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }

    pub fn restart_grace(&self) -> Duration {
        Duration::from_millis(self.restart_grace_ms)
    }

    pub fn facing_switch_delay(&self) -> Duration {
        Duration::from_millis(self.facing_switch_delay_ms)
    }

    pub fn tone_teardown(&self) -> Duration {
        Duration::from_millis(self.tone_teardown_ms)
    }

    pub fn startup_delay(&self) -> Duration {
        Duration::from_millis(self.startup_delay_ms)
    }
}
