//! Settings persistence and clamping tests

use shelfsight_core::config::{FREQUENCY_RANGE, CENTER_THRESHOLD_RANGE};
use shelfsight_core::{Error, Settings};
use std::fs;
use tempfile::tempdir;

#[test]
fn test_save_and_load_toml() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("settings.toml");

    let mut settings = Settings::default();
    settings.sounds_enabled = false;
    settings.capture_delay_ms = 4500;
    settings.fields.brand = true;
    settings.save(&path).unwrap();

    let loaded = Settings::load(&path).unwrap();
    assert_eq!(loaded, settings);
}

#[test]
fn test_save_creates_parent_directory() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("nested").join("deeper").join("settings.json");
    Settings::default().save(&path).unwrap();
    assert!(path.exists());
    assert_eq!(Settings::load(&path).unwrap(), Settings::default());
}

#[test]
fn test_last_write_wins() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("settings.yaml");

    let mut first = Settings::default();
    first.beep_volume = 0.2;
    first.save(&path).unwrap();

    let mut second = Settings::default();
    second.beep_volume = 0.9;
    second.save(&path).unwrap();

    assert_eq!(Settings::load(&path).unwrap().beep_volume, 0.9);
}

#[test]
fn test_load_uses_camel_case_keys_and_clamps() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("settings.toml");
    fs::write(
        &path,
        r#"
soundsEnabled = true
centerThresholdPercent = 20
beepVolume = 4.0
minFrequencyHz = 1200
maxFrequencyHz = 400
movePromptDelayMs = 2000

[fields]
brand = true
expirationRange = false
"#,
    )
    .unwrap();

    let loaded = Settings::load(&path).unwrap();
    assert_eq!(loaded.center_threshold_percent, CENTER_THRESHOLD_RANGE.0);
    assert_eq!(loaded.beep_volume, 1.0);
    assert!(loaded.min_frequency_hz < loaded.max_frequency_hz);
    assert!(loaded.max_frequency_hz <= FREQUENCY_RANGE.1);
    assert_eq!(loaded.move_prompt_delay_ms, 2000);
    assert!(loaded.fields.brand);
    assert!(loaded.fields.name);
    assert!(!loaded.fields.expiration_range);
}

#[test]
fn test_load_invalid_file() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("settings.toml");
    fs::write(&path, "soundsEnabled = [not valid").unwrap();
    match Settings::load(&path) {
        Err(Error::Deserialization(msg)) => assert!(msg.contains("settings.toml")),
        other => panic!("Expected Deserialization error, got {:?}", other),
    }
}

#[test]
fn test_load_missing_file() {
    let dir = tempdir().unwrap();
    match Settings::load(&dir.path().join("missing.toml")) {
        Err(Error::Io(_)) => {}
        other => panic!("Expected Io error, got {:?}", other),
    }
}
