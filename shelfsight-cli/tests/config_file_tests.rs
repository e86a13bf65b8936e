use shelfsight_cli::AppConfig;
use shelfsight_eye::DetectorBackendKind;
use shelfsight_llm::DescribeBackendKind;
use std::io::Write;
use std::path::PathBuf;

fn write(dir: &tempfile::TempDir, name: &str, contents: &str) -> PathBuf {
    let path = dir.path().join(name);
    let mut file = std::fs::File::create(&path).unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    path
}

#[test]
fn test_load_partial_toml() {
    let dir = tempfile::tempdir().unwrap();
    let path = write(
        &dir,
        "shelfsight.toml",
        r#"
[settings]
captureDelayMs = 2500
centerThresholdPercent = 90.0

[settings.fields]
brand = true

[timing]
nudge_interval_ms = 4000

[describe]
backend = "openai"
api_key = "sk-test"

[detector.backend]
kind = "scripted"
path = "script.json"
"#,
    );

    let config = AppConfig::load(&path).unwrap();
    assert_eq!(config.settings.capture_delay_ms, 2500);
    assert_eq!(config.settings.center_threshold_percent, 90.0);
    assert!(config.settings.fields.brand);
    assert!(config.settings.fields.name);
    assert_eq!(config.timing.nudge_interval_ms, 4000);
    assert_eq!(config.timing.max_nudges, 3);
    assert_eq!(config.describe.backend, DescribeBackendKind::OpenAi);
    assert_eq!(
        config.detector.backend,
        DetectorBackendKind::Scripted {
            path: PathBuf::from("script.json")
        }
    );
}

#[test]
fn test_load_yaml_and_json() {
    let dir = tempfile::tempdir().unwrap();
    let yaml = write(&dir, "shelfsight.yaml", "settings:\n  soundsEnabled: false\n");
    assert!(!AppConfig::load(&yaml).unwrap().settings.sounds_enabled);

    let json = write(&dir, "shelfsight.json", r#"{"timing": {"max_nudges": 5}}"#);
    assert_eq!(AppConfig::load(&json).unwrap().timing.max_nudges, 5);
}

#[test]
fn test_invalid_timing_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = write(&dir, "bad.toml", "[timing]\nframe_interval_ms = 0\n");
    let err = AppConfig::load(&path).unwrap_err();
    assert!(err.to_string().contains("timing"), "{}", err);
}

#[test]
fn test_missing_file_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    assert!(AppConfig::load(&dir.path().join("absent.toml")).is_err());
    assert!(AppConfig::load_or_default(None).is_ok());
}
