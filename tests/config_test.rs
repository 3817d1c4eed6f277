//! Integration tests for configuration loading.

use rush_output::config::{load_config, load_config_or_default, Config};
use std::fs;
use std::path::PathBuf;
use tempfile::tempdir;

#[test]
fn load_full_config() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("rush-output.toml");
    fs::write(
        &path,
        r#"
[output]
path = "/var/tmp/capture.fbvp"
sync_on_close = false

[logging]
filter = "rush_output=debug"
"#,
    )
    .unwrap();

    let config = load_config(&path).unwrap();
    assert_eq!(config.output.path, PathBuf::from("/var/tmp/capture.fbvp"));
    assert!(!config.output.sync_on_close);
    assert_eq!(config.logging.filter.as_deref(), Some("rush_output=debug"));
}

#[test]
fn missing_file_is_an_error() {
    let dir = tempdir().unwrap();
    let err = load_config(&dir.path().join("nope.toml")).unwrap_err();
    assert!(err.to_string().contains("Failed to read config file"));
}

#[test]
fn malformed_toml_is_an_error() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("bad.toml");
    fs::write(&path, "[output\npath = 3").unwrap();
    let err = load_config(&path).unwrap_err();
    assert!(err.to_string().contains("Failed to parse config file"));
}

#[test]
fn empty_output_path_fails_validation() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("empty.toml");
    fs::write(&path, "[output]\npath = \"\"\n").unwrap();
    let err = load_config(&path).unwrap_err();
    assert!(format!("{err:#}").contains("Output path cannot be empty"));
}

#[test]
fn explicit_path_wins_over_defaults() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("custom.toml");
    fs::write(&path, "[output]\npath = \"~/captures/out.fbvp\"\n").unwrap();

    let config = load_config_or_default(Some(&path)).unwrap();
    assert_eq!(config.output.path, PathBuf::from("~/captures/out.fbvp"));

    // The sink target expands the home directory.
    if std::env::var_os("HOME").is_some() {
        let target = config.output.sink_target();
        assert!(!target.describe().to_string_lossy().starts_with('~'));
    }
}

#[test]
fn default_config_round_trips_through_toml() {
    let config = Config::default();
    let text = toml::to_string(&config).unwrap();
    let parsed: Config = toml::from_str(&text).unwrap();
    assert_eq!(parsed.output.path, config.output.path);
    assert_eq!(parsed.output.sync_on_close, config.output.sync_on_close);
}
