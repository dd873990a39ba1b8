//! Configuration and color handling for cmdconsole.
//!
//! This module provides:
//! - TOML configuration file loading from `~/.cmdconsole/config.toml`
//! - The named console colors used for output rows and the prompt
//!
//! # Configuration File
//!
//! ```toml
//! # Console kind: "command" or "pass-through"
//! kind = "command"
//!
//! # Geometry (optional, defaults to the current terminal size)
//! width = 120
//! height = 40
//!
//! # Prompt color
//! command_color = "yellow"
//!
//! # Ring buffer capacities
//! scrollback_lines = 1024
//! history_size = 100
//!
//! # Key poll timeout, bounds how long `stop` waits for the input thread
//! poll_interval_ms = 50
//!
//! # Keep a scrolled-back view on the same lines while output arrives
//! anchor_scrollback = true
//!
//! # Log level for ~/.cmdconsole/cmdconsole.log
//! log_level = "info"
//! ```

use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use serde::de::IntoDeserializer;
use serde::{Deserialize, Serialize};

use crate::console::ConsoleKind;

/// Default scrollback capacity
pub const BUF_SIZE: usize = 1024;
/// Default command history capacity
pub const HISTORY_SIZE: usize = 100;

/// Main configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConsoleConfig {
    /// Which console implementation to use
    pub kind: ConsoleKind,
    /// Console width in columns (None = terminal width)
    pub width: Option<u16>,
    /// Console height in rows (None = terminal height)
    pub height: Option<u16>,
    /// Prompt color
    pub command_color: Color,
    /// Scrollback capacity in rows
    pub scrollback_lines: usize,
    /// Command history capacity
    pub history_size: usize,
    /// Key poll timeout in milliseconds
    pub poll_interval_ms: u64,
    /// Anchor a scrolled-back view instead of keeping its index
    pub anchor_scrollback: bool,
    /// Log level filter
    pub log_level: String,
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            kind: ConsoleKind::Command,
            width: None,
            height: None,
            command_color: Color::White,
            scrollback_lines: BUF_SIZE,
            history_size: HISTORY_SIZE,
            poll_interval_ms: 50,
            anchor_scrollback: true,
            log_level: "info".to_string(),
        }
    }
}

impl ConsoleConfig {
    /// Load configuration from the default file, falling back to defaults
    pub fn load() -> Self {
        match Self::get_config_path() {
            Some(path) => Self::load_from(&path),
            None => Self::default(),
        }
    }

    /// Load configuration from `path`, falling back to defaults
    pub fn load_from(path: &Path) -> Self {
        if path.exists() {
            if let Ok(content) = fs::read_to_string(path) {
                match toml::from_str(&content) {
                    Ok(config) => return config,
                    Err(e) => tracing::warn!("Ignoring malformed config {}: {}", path.display(), e),
                }
            }
        }
        Self::default()
    }

    /// Save configuration to the default file
    pub fn save(&self) -> Result<(), String> {
        match Self::get_config_path() {
            Some(path) => self.save_to(&path),
            None => Err("Could not determine config path".to_string()),
        }
    }

    /// Save configuration to `path`
    pub fn save_to(&self, path: &Path) -> Result<(), String> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| format!("Failed to serialize config: {}", e))?;
        fs::write(path, content)
            .map_err(|e| format!("Failed to write config: {}", e))?;
        Ok(())
    }

    /// Key poll timeout
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(1))
    }

    /// Directory holding the config and log files
    pub fn config_dir() -> Option<PathBuf> {
        let dir = home_dir()?.join(".cmdconsole");
        if !dir.exists() {
            let _ = fs::create_dir_all(&dir);
        }
        Some(dir)
    }

    /// Get config file path
    fn get_config_path() -> Option<PathBuf> {
        Self::config_dir().map(|dir| dir.join("config.toml"))
    }
}

/// Named console color
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Color {
    /// The terminal's default foreground
    #[default]
    Reset,
    Black,
    DarkGrey,
    Red,
    DarkRed,
    Green,
    DarkGreen,
    Yellow,
    DarkYellow,
    Blue,
    DarkBlue,
    Magenta,
    DarkMagenta,
    Cyan,
    DarkCyan,
    White,
    Grey,
}

impl Color {
    /// Convert to crossterm Color
    pub fn to_crossterm(self) -> crossterm::style::Color {
        use crossterm::style::Color as C;
        match self {
            Color::Reset => C::Reset,
            Color::Black => C::Black,
            Color::DarkGrey => C::DarkGrey,
            Color::Red => C::Red,
            Color::DarkRed => C::DarkRed,
            Color::Green => C::Green,
            Color::DarkGreen => C::DarkGreen,
            Color::Yellow => C::Yellow,
            Color::DarkYellow => C::DarkYellow,
            Color::Blue => C::Blue,
            Color::DarkBlue => C::DarkBlue,
            Color::Magenta => C::Magenta,
            Color::DarkMagenta => C::DarkMagenta,
            Color::Cyan => C::Cyan,
            Color::DarkCyan => C::DarkCyan,
            Color::White => C::White,
            Color::Grey => C::Grey,
        }
    }
}

impl FromStr for Color {
    type Err = String;

    /// Parse a config-file color name such as `dark-yellow`
    fn from_str(name: &str) -> Result<Self, Self::Err> {
        let lowered = name.trim().to_lowercase();
        let de: serde::de::value::StrDeserializer<'_, serde::de::value::Error> =
            lowered.as_str().into_deserializer();
        Color::deserialize(de).map_err(|_| format!("Unknown color: {}", name))
    }
}

// Get home directory
fn home_dir() -> Option<PathBuf> {
    std::env::var_os("USERPROFILE")
        .or_else(|| std::env::var_os("HOME"))
        .map(PathBuf::from)
}
