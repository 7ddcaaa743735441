/// Configuration loading tests
/// Uses temporary TOML files and an injected environment
use echohub_player::{config::environment, AppConfig, OutputFormat, ReplayError};
use std::fs;
use tempfile::TempDir;

fn env(vars: &[(&str, &str)]) -> config::Environment {
    let map = vars
        .iter()
        .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
        .collect();
    environment().source(Some(map))
}

fn write_config(dir: &TempDir, contents: &str) -> std::path::PathBuf {
    let path = dir.path().join("echohub.toml");
    fs::write(&path, contents).unwrap();
    path
}

#[test]
fn file_values_override_defaults() {
    let dir = TempDir::new().unwrap();
    let path = write_config(
        &dir,
        r#"
[player]
seek_step_secs = 10.0
repeat = true
default_artwork = "/images/fallback.png"

[output]
format = "json"
show_events = true
"#,
    );

    let config = AppConfig::load_with(Some(&path), env(&[])).unwrap();

    assert_eq!(config.player.seek_step_secs, 10.0);
    assert!(config.player.repeat);
    assert_eq!(config.player.default_artwork, "/images/fallback.png");
    // Untouched keys keep their defaults
    assert_eq!(config.player.slider_hide_delay_ms, 3000);
    assert_eq!(config.player.initial_volume, 1.0);
    assert_eq!(config.output.format, OutputFormat::Json);
    assert!(config.output.show_events);
}

#[test]
fn environment_overrides_file() {
    let dir = TempDir::new().unwrap();
    let path = write_config(
        &dir,
        r#"
[player]
seek_step_secs = 10.0
"#,
    );

    let config = AppConfig::load_with(
        Some(&path),
        env(&[
            ("ECHOHUB_PLAYER__SEEK_STEP_SECS", "15"),
            ("ECHOHUB_PLAYER__INITIAL_VOLUME", "0.5"),
            ("ECHOHUB_OUTPUT__FORMAT", "json"),
        ]),
    )
    .unwrap();

    assert_eq!(config.player.seek_step_secs, 15.0);
    assert_eq!(config.player.initial_volume, 0.5);
    assert_eq!(config.output.format, OutputFormat::Json);
}

#[test]
fn environment_alone_is_enough() {
    let config = AppConfig::load_with(
        None,
        env(&[("ECHOHUB_PLAYER__SLIDER_HIDE_DELAY_MS", "1500")]),
    )
    .unwrap();

    assert_eq!(config.player.slider_hide_delay_ms, 1500);
    assert_eq!(config.output.format, OutputFormat::Text);
}

#[test]
fn missing_explicit_file_is_an_error() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("missing.toml");

    let result = AppConfig::load_with(Some(&path), env(&[]));
    assert!(matches!(result, Err(ReplayError::Config(_))));
}

#[test]
fn out_of_range_values_are_rejected() {
    let dir = TempDir::new().unwrap();
    let path = write_config(
        &dir,
        r#"
[player]
initial_volume = 1.5
"#,
    );

    let result = AppConfig::load_with(Some(&path), env(&[]));
    assert!(matches!(result, Err(ReplayError::Playback(_))));
}

#[test]
fn malformed_file_is_a_config_error() {
    let dir = TempDir::new().unwrap();
    let path = write_config(&dir, "[player\nseek_step_secs = ");

    let result = AppConfig::load_with(Some(&path), env(&[]));
    assert!(matches!(result, Err(ReplayError::Config(_))));
}
