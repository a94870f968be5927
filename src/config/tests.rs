//! Unit tests for configuration module
//!
//! Tests configuration parsing, validation, serialization and socket-name
//! resolution.

use super::*;
use anyhow::Result;
use std::fs;
use tempfile::tempdir;

#[test]
fn test_default_configuration_is_valid() {
    let config = SessionConfig::default();

    assert!(config.validate().is_ok());
    assert_eq!(config.input.default_seat, "seat0");
    assert_eq!(config.output.geometry(), Rect::new(0, 0, 1920, 1080));
    assert_eq!(config.output.refresh_rate, 60);
    assert!(config.extensions.window_manager);
    assert!(config.selection.keep_unretained_on_disconnect);
    assert!(!config.selection.retain);
    assert!(config.general.socket_name.is_none());
}

#[test]
fn test_configuration_serialization_roundtrip() -> Result<()> {
    let mut original = SessionConfig::default();
    original.general.socket_name = Some("wayland-7".to_string());
    original.output.orientation = ScreenOrientation::InvertedPortrait;
    original.render.api = GraphicsApi::Vulkan;

    let toml_string = toml::to_string(&original)?;
    let deserialized: SessionConfig = toml::from_str(&toml_string)?;

    assert_eq!(original, deserialized);
    Ok(())
}

#[test]
fn test_configuration_from_file() -> Result<()> {
    let dir = tempdir()?;
    let file_path = dir.path().join("session.toml");

    let test_config = r#"
[general]
socket_name = "wayland-test"
debug = true

[output]
width = 2560
height = 1440
refresh_rate = 144
orientation = "portrait"

[selection]
retain = true

[render]
api = "opengles"
"#;
    fs::write(&file_path, test_config)?;

    let config = SessionConfig::load(&file_path)?;
    assert_eq!(config.general.socket_name.as_deref(), Some("wayland-test"));
    assert!(config.general.debug);
    assert_eq!(config.output.geometry(), Rect::new(0, 0, 2560, 1440));
    assert_eq!(config.output.refresh_rate, 144);
    assert_eq!(config.output.orientation, ScreenOrientation::Portrait);
    assert!(config.selection.retain);
    assert!(config.selection.keep_unretained_on_disconnect);
    assert_eq!(config.render.api, GraphicsApi::OpenGlEs);
    assert!(config.render.hardware_integration);
    // Untouched sections keep their defaults
    assert_eq!(config.input, InputConfig::default());

    Ok(())
}

#[test]
fn test_out_of_range_output_is_accepted() -> Result<()> {
    let config: SessionConfig = toml::from_str(
        r#"
[output]
width = -5
height = 0
refresh_rate = -1
"#,
    )?;
    assert!(config.validate().is_ok());
    assert_eq!(config.output.width, -5);
    Ok(())
}

#[test]
fn test_invalid_seat_rejected() {
    let mut config = SessionConfig::default();
    config.input.default_seat = "  ".to_string();
    assert!(config.validate().is_err());
}

#[test]
fn test_socket_name_with_slash_rejected() {
    let mut config = SessionConfig::default();
    config.general.socket_name = Some("../evil".to_string());
    assert!(config.validate().is_err());
}

#[test]
fn test_missing_file_errors() {
    let result = SessionConfig::load("/nonexistent/wlsession/session.toml");
    assert!(result.is_err());
}

#[test]
fn test_malformed_file_errors() -> Result<()> {
    let dir = tempdir()?;
    let file_path = dir.path().join("broken.toml");
    fs::write(&file_path, "[output\nwidth = ")?;
    assert!(SessionConfig::load(&file_path).is_err());
    Ok(())
}

#[test]
fn test_save_and_reload() -> Result<()> {
    let dir = tempdir()?;
    let file_path = dir.path().join("saved.toml");

    let mut config = SessionConfig::default();
    config.extensions.touch = true;
    config.save(&file_path)?;

    let loaded = SessionConfig::load(&file_path)?;
    assert!(loaded.extensions.touch);
    Ok(())
}

#[test]
fn test_socket_override_wins() {
    let args = ["app", "--wayland-socket-name", "wayland-9"];
    assert_eq!(
        resolve_socket_name(Some("wayland-1"), &args).as_deref(),
        Some("wayland-9")
    );
}

#[test]
fn test_dangling_override_flag_ignored() {
    let args = ["app", "--wayland-socket-name"];
    assert_eq!(
        resolve_socket_name(Some("wayland-1"), &args).as_deref(),
        Some("wayland-1")
    );
}

#[test]
fn test_empty_socket_name_is_none() {
    let args: [&str; 0] = [];
    assert_eq!(resolve_socket_name(Some(""), &args), None);
    assert_eq!(resolve_socket_name(None, &args), None);
    assert_eq!(resolve_socket_name(Some("x"), &["--wayland-socket-name", ""]), None);
}

#[test]
fn test_with_socket_override() {
    let config = SessionConfig::default()
        .with_socket_override(&["bin".to_string(), SOCKET_NAME_FLAG.to_string(), "w-2".to_string()]);
    assert_eq!(config.general.socket_name.as_deref(), Some("w-2"));
}

#[test]
fn test_merge_partial_overrides_changed_sections() {
    let base = SessionConfig::default();
    let mut partial = SessionConfig::default();
    partial.output.refresh_rate = 120;

    let merged = base.merge_partial(partial);
    assert_eq!(merged.output.refresh_rate, 120);
    assert_eq!(merged.input, InputConfig::default());
}
