//! Integration tests for configuration loading
//!
//! Tests that verify config loading from files and environment variables.

use std::fs;
use std::path::PathBuf;

use serial_test::serial;
use vrview::config::AppConfig;
use vrview_render::ReferenceSpace;

fn scratch_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("vrview-config-{}-{}", name, std::process::id()));
    fs::create_dir_all(&dir).unwrap();
    dir
}

#[test]
#[serial]
fn test_env_override() {
    std::env::set_var("VRV_WINDOW__TITLE", "Test From Env");
    std::env::set_var("VRV_VR__MAX_ENTER_ATTEMPTS", "5");
    let config = AppConfig::load().unwrap();
    std::env::remove_var("VRV_WINDOW__TITLE");
    std::env::remove_var("VRV_VR__MAX_ENTER_ATTEMPTS");

    assert_eq!(config.window.title, "Test From Env");
    assert_eq!(config.vr.max_enter_attempts, 5);
    assert_eq!(config.vr.to_session_config().max_enter_attempts, 5);
}

#[test]
#[serial]
fn test_default_file_matches_defaults() {
    let config = AppConfig::load().unwrap();
    let defaults = AppConfig::default();

    assert_eq!(config.window.width, defaults.window.width);
    assert_eq!(config.camera.start_position, defaults.camera.start_position);
    assert_eq!(config.display.scene_path, defaults.display.scene_path);
    assert_eq!(config.effects.vignette_offset, defaults.effects.vignette_offset);
    assert_eq!(config.vr.retry_delay_ms, defaults.vr.retry_delay_ms);
    assert_eq!(config.vr.reference_space, ReferenceSpace::LocalFloor);
}

#[test]
#[serial]
fn test_user_file_overrides_default_file() {
    let dir = scratch_dir("user");
    fs::write(
        dir.join("default.toml"),
        "[window]\ntitle = \"from default\"\nwidth = 640\n",
    )
    .unwrap();
    fs::write(
        dir.join("user.toml"),
        "[window]\ntitle = \"from user\"\n\n[vr]\nreference_space = \"bounded-floor\"\n",
    )
    .unwrap();

    let config = AppConfig::load_from(&dir).unwrap();
    fs::remove_dir_all(&dir).ok();

    assert_eq!(config.window.title, "from user");
    assert_eq!(config.window.width, 640);
    assert_eq!(config.vr.reference_space, ReferenceSpace::BoundedFloor);
}

#[test]
#[serial]
fn test_missing_directory_yields_defaults() {
    let config = AppConfig::load_from("does/not/exist").unwrap();
    assert_eq!(config.window.title, "vrview");
    assert!(config.vr.auto_enter);
}

#[test]
#[serial]
fn test_invalid_value_is_an_error() {
    let dir = scratch_dir("invalid");
    fs::write(dir.join("default.toml"), "[vr]\nreference_space = \"sideways\"\n").unwrap();

    let result = AppConfig::load_from(&dir);
    fs::remove_dir_all(&dir).ok();

    let err = result.unwrap_err();
    assert!(err.to_string().starts_with("Configuration error:"));
}
