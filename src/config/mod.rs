//! Configuration management for wlsession
//!
//! This module handles loading, parsing, and validating the session
//! configuration from TOML files, and resolving the listening socket name
//! from process arguments once at startup.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::geometry::Rect;
use crate::output::ScreenOrientation;
use crate::render::GraphicsApi;

/// Process argument that overrides the configured socket name
pub const SOCKET_NAME_FLAG: &str = "--wayland-socket-name";

/// Main configuration struct containing all session settings
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct SessionConfig {
    /// General settings
    #[serde(default)]
    pub general: GeneralConfig,

    /// Initial output state
    #[serde(default)]
    pub output: OutputConfig,

    /// Clipboard behaviour
    #[serde(default)]
    pub selection: SelectionConfig,

    /// Input device settings
    #[serde(default)]
    pub input: InputConfig,

    /// Protocol extensions to bring up
    #[serde(default)]
    pub extensions: ExtensionsConfig,

    /// Render backend settings
    #[serde(default)]
    pub render: RenderConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct GeneralConfig {
    /// Listening socket name; unset lets the transport pick its default
    pub socket_name: Option<String>,

    /// Enable debug logging
    pub debug: bool,
}

/// Initial output geometry; stored literally, never validated
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct OutputConfig {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,

    /// Refresh rate in Hz
    pub refresh_rate: i32,

    pub orientation: ScreenOrientation,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SelectionConfig {
    /// Start with retained selection enabled
    pub retain: bool,

    /// Keep an unretained selection when its owner disconnects
    pub keep_unretained_on_disconnect: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct InputConfig {
    /// Seat name of the default input device
    pub default_seat: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ExtensionsConfig {
    /// Bring up the window manager extension during startup
    pub window_manager: bool,

    /// Enable the sub-surface extension during startup
    pub sub_surface: bool,

    /// Enable the touch extension during startup
    pub touch: bool,

    /// Initial touch extension flag: synthesize mouse from touch
    pub mouse_from_touch: bool,

    /// Initial client full-screen hint
    pub client_full_screen_hint: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RenderConfig {
    /// Whether the headless backend reports a hardware path
    pub hardware_integration: bool,

    /// Graphics API of the hardware path
    pub api: GraphicsApi,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            x: 0,
            y: 0,
            width: 1920,
            height: 1080,
            refresh_rate: 60,
            orientation: ScreenOrientation::Primary,
        }
    }
}

impl OutputConfig {
    pub fn geometry(&self) -> Rect {
        Rect::new(self.x, self.y, self.width, self.height)
    }
}

impl Default for SelectionConfig {
    fn default() -> Self {
        Self {
            retain: false,
            keep_unretained_on_disconnect: true,
        }
    }
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            default_seat: "seat0".to_string(),
        }
    }
}

impl Default for ExtensionsConfig {
    fn default() -> Self {
        Self {
            window_manager: true,
            sub_surface: false,
            touch: false,
            mouse_from_touch: false,
            client_full_screen_hint: false,
        }
    }
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            hardware_integration: true,
            api: GraphicsApi::OpenGl,
        }
    }
}

/// Resolves the socket name from an explicit value and process arguments
///
/// `--wayland-socket-name <name>` wins over `explicit` when it is followed by
/// a value. An empty name resolves to `None`.
pub fn resolve_socket_name<S: AsRef<str>>(explicit: Option<&str>, args: &[S]) -> Option<String> {
    let mut name = explicit.map(str::to_string);

    // First occurrence only, as the argument scan in the launcher does
    if let Some(index) = args.iter().position(|a| a.as_ref() == SOCKET_NAME_FLAG) {
        if let Some(value) = args.get(index + 1) {
            name = Some(value.as_ref().to_string());
        }
    }

    name.filter(|n| !n.is_empty())
}

impl SessionConfig {
    /// Load configuration from a TOML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        // Expand ~ to home directory
        let expanded_path = if path.to_string_lossy().starts_with('~') {
            let home = std::env::var("HOME").context("Failed to get HOME environment variable")?;
            let rest = path.strip_prefix("~").unwrap_or(path);
            Path::new(&home).join(rest)
        } else {
            path.to_path_buf()
        };

        let contents = fs::read_to_string(&expanded_path)
            .with_context(|| format!("Failed to read config file: {}", expanded_path.display()))?;

        let config: SessionConfig = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", expanded_path.display()))?;

        config.validate()?;

        Ok(config)
    }

    /// Validate the configuration
    ///
    /// Output values are deliberately left alone; only settings the core
    /// can not operate with are rejected.
    pub fn validate(&self) -> Result<()> {
        if self.input.default_seat.trim().is_empty() {
            anyhow::bail!("Invalid default_seat: must not be empty");
        }

        if let Some(name) = &self.general.socket_name {
            if name.contains('/') {
                anyhow::bail!("Invalid socket_name '{}': must not contain '/'", name);
            }
        }

        Ok(())
    }

    /// Save configuration to a TOML file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let contents = toml::to_string_pretty(self).context("Failed to serialize configuration")?;

        fs::write(path, contents).context("Failed to write configuration file")?;

        Ok(())
    }

    /// Applies a socket-name override from process arguments
    pub fn with_socket_override<S: AsRef<str>>(mut self, args: &[S]) -> Self {
        self.general.socket_name = resolve_socket_name(self.general.socket_name.as_deref(), args);
        self
    }

    /// Merge a partial configuration into this one
    /// Non-default sections from the partial config override this config
    pub fn merge_partial(mut self, partial: SessionConfig) -> Self {
        let default_config = SessionConfig::default();

        if partial.general != default_config.general {
            self.general = partial.general;
        }
        if partial.output != default_config.output {
            self.output = partial.output;
        }
        if partial.selection != default_config.selection {
            self.selection = partial.selection;
        }
        if partial.input != default_config.input {
            self.input = partial.input;
        }
        if partial.extensions != default_config.extensions {
            self.extensions = partial.extensions;
        }
        if partial.render != default_config.render {
            self.render = partial.render;
        }

        self
    }
}

#[cfg(test)]
mod tests;

#[cfg(test)]
mod property_tests;
