//! Application configuration file

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use shelfsight_assist::AssistantConfig;
use shelfsight_core::{Settings, TimingConfig};
use shelfsight_eye::{CameraConfig, DetectorConfig};
use shelfsight_llm::DescribeConfig;
use shelfsight_sc::AudioConfig;
use shelfsight_spk::SpeechConfig;
use std::path::Path;

/// Everything the binary needs, one section per crate
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub settings: Settings,
    pub timing: TimingConfig,
    pub speech: SpeechConfig,
    pub describe: DescribeConfig,
    pub camera: CameraConfig,
    pub detector: DetectorConfig,
    pub audio: AudioConfig,
}

impl AppConfig {
    /// Load from TOML, YAML or JSON (chosen by extension)
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_ascii_lowercase();

        let config: AppConfig = match extension.as_str() {
            "yaml" | "yml" => serde_yaml::from_str(&contents)?,
            "json" => serde_json::from_str(&contents)?,
            _ => toml::from_str(&contents)?,
        };
        config.validate()?;
        Ok(config)
    }

    /// Load `path` when given, defaults otherwise
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        self.timing.validate().map_err(|e| anyhow!("timing: {}", e))?;
        self.speech.validate().map_err(|e| anyhow!("speech: {}", e))?;
        self.describe.validate().map_err(|e| anyhow!("describe: {}", e))?;
        self.camera.validate().map_err(|e| anyhow!("camera: {}", e))?;
        self.detector.validate().map_err(|e| anyhow!("detector: {}", e))?;
        self.audio.validate().map_err(|e| anyhow!("audio: {}", e))?;
        Ok(())
    }

    /// Configuration of the interaction core
    pub fn assistant_config(&self, settings: Settings, auto_start: bool) -> AssistantConfig {
        AssistantConfig {
            settings,
            timing: self.timing.clone(),
            audio: self.audio.clone(),
            jpeg_quality: self.camera.jpeg_quality,
            auto_start,
            ..AssistantConfig::default()
        }
    }
}

/// Set one setting by its camelCase key, e.g. `captureDelayMs 2000` or `fields.brand true`
///
/// The value is parsed as JSON when possible and as a string otherwise.
/// The result is sanitized, so out-of-range numbers are clamped.
pub fn apply_setting(settings: &Settings, key: &str, value: &str) -> Result<Settings> {
    let mut tree = serde_json::to_value(settings)?;
    let parsed: Value = serde_json::from_str(value).unwrap_or_else(|_| Value::String(value.to_string()));

    let mut slot = &mut tree;
    for part in key.split('.') {
        slot = slot
            .as_object_mut()
            .and_then(|object| object.get_mut(part))
            .ok_or_else(|| anyhow!("Unknown setting: {}", key))?;
    }
    if slot.is_object() {
        return Err(anyhow!("Setting {} is a group, name one of its fields", key));
    }
    *slot = parsed;

    let updated: Settings =
        serde_json::from_value(tree).with_context(|| format!("Invalid value for {}: {}", key, value))?;
    Ok(updated.sanitized())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
        let assistant = config.assistant_config(config.settings.clone(), true);
        assert!(assistant.validate().is_ok());
        assert_eq!(assistant.jpeg_quality, config.camera.jpeg_quality);
    }

    #[test]
    fn test_apply_numeric_setting() {
        let settings = apply_setting(&Settings::default(), "captureDelayMs", "2000").unwrap();
        assert_eq!(settings.capture_delay_ms, 2000);
    }

    #[test]
    fn test_apply_nested_field_flag() {
        let settings = apply_setting(&Settings::default(), "fields.brand", "true").unwrap();
        assert!(settings.fields.brand);
    }

    #[test]
    fn test_apply_clamps_out_of_range() {
        let settings = apply_setting(&Settings::default(), "beepVolume", "7").unwrap();
        assert!(settings.beep_volume <= 1.0);
    }

    #[test]
    fn test_apply_rejects_unknown_and_mistyped() {
        assert!(apply_setting(&Settings::default(), "volume", "1").is_err());
        assert!(apply_setting(&Settings::default(), "fields", "true").is_err());
        assert!(apply_setting(&Settings::default(), "soundsEnabled", "loud").is_err());
    }
}
