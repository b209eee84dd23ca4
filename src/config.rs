//! Configuration for conbuf.
//!
//! Loaded from `~/.conbuf/config.toml`:
//!
//! ```toml
//! # Console window title (optional)
//! title = "My game"
//!
//! # Keep quick-edit text selection enabled
//! highlighting = false
//!
//! [grid]
//! # Fixed grid size; omitted values follow the current window
//! width = 80
//! height = 25
//!
//! [window]
//! lock_size = true
//!
//! [text]
//! capacity = 1024
//!
//! [input]
//! foreground = 7
//! background = 0
//! ```

use std::fs;
use std::path::{Path, PathBuf};
use serde::{Deserialize, Serialize};

use crate::core::{Attribute, Color, Vector2, TEXT_BUFFER_CAPACITY};
use crate::error::{ConsoleError, Result};

/// Main configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Window title set at initialize
    pub title: Option<String>,
    /// Leave quick-edit selection enabled
    pub highlighting: bool,
    /// Grid size override
    pub grid: GridConfig,
    /// Window settings
    pub window: WindowConfig,
    /// Format buffer settings
    pub text: TextConfig,
    /// Typed input color
    pub input: InputConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            title: None,
            highlighting: true,
            grid: GridConfig::default(),
            window: WindowConfig::default(),
            text: TextConfig::default(),
            input: InputConfig::default(),
        }
    }
}

/// Grid size configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridConfig {
    pub width: Option<i32>,
    pub height: Option<i32>,
}

impl GridConfig {
    /// Requested size, falling back to `window` for unset dimensions
    pub fn resolve(&self, window: Vector2) -> Vector2 {
        Vector2::new(
            self.width.unwrap_or(window.x),
            self.height.unwrap_or(window.y),
        )
    }

    /// Check that fixed dimensions are at least one cell
    pub fn validate(&self) -> std::result::Result<(), String> {
        for (name, value) in [("width", self.width), ("height", self.height)] {
            if let Some(value) = value {
                if value < 1 {
                    return Err(format!("grid {} must be at least 1, got {}", name, value));
                }
            }
        }
        Ok(())
    }
}

/// Window configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    /// Remove resize/maximize affordances
    pub lock_size: bool,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self { lock_size: true }
    }
}

/// Text buffer configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TextConfig {
    /// Capacity in characters
    pub capacity: usize,
}

impl Default for TextConfig {
    fn default() -> Self {
        Self {
            capacity: TEXT_BUFFER_CAPACITY,
        }
    }
}

/// Input color configuration (console color numbers 0-15)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InputConfig {
    pub foreground: u8,
    pub background: u8,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            foreground: Color::WHITE.bits(),
            background: Color::BLACK.bits(),
        }
    }
}

impl InputConfig {
    pub fn attribute(&self) -> Attribute {
        Attribute::new(
            Color::from_nibble(self.foreground),
            Color::from_nibble(self.background),
        )
    }
}

impl Config {
    /// Load configuration from the default path, falling back to defaults
    pub fn load() -> Self {
        if let Some(path) = Self::get_config_path() {
            if path.exists() {
                if let Ok(config) = Self::load_from(&path) {
                    return config;
                }
            }
        }
        Self::default()
    }

    /// Load configuration from `path`, reporting read and parse errors
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| ConsoleError::Config {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        let config: Self = toml::from_str(&content).map_err(|e| ConsoleError::Config {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        config.grid.validate().map_err(|message| ConsoleError::Config {
            path: path.to_path_buf(),
            message,
        })?;
        Ok(config)
    }

    /// Directory holding the config file and log
    pub fn config_dir() -> Option<PathBuf> {
        home_dir().map(|home| home.join(".conbuf"))
    }

    /// Get config file path
    fn get_config_path() -> Option<PathBuf> {
        Self::config_dir().map(|dir| dir.join("config.toml"))
    }
}

// Get home directory
fn home_dir() -> Option<PathBuf> {
    std::env::var_os("USERPROFILE")
        .or_else(|| std::env::var_os("HOME"))
        .map(PathBuf::from)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert!(config.highlighting);
        assert!(config.window.lock_size);
        assert_eq!(config.text.capacity, 1024);
        assert_eq!(config.input.attribute(), Attribute::fg(Color::WHITE));
    }

    #[test]
    fn test_partial_toml() {
        let config: Config = toml::from_str(
            r#"
            title = "demo"

            [grid]
            width = 40

            [input]
            foreground = 14
            "#,
        )
        .unwrap();

        assert_eq!(config.title.as_deref(), Some("demo"));
        assert_eq!(config.grid.resolve(Vector2::new(80, 25)), Vector2::new(40, 25));
        assert_eq!(config.input.attribute().foreground, Color::GOLD | Color::INTENSE);
        assert!(config.window.lock_size);
    }

    #[test]
    fn test_load_from_reports_errors() {
        let dir = std::env::temp_dir().join(format!("conbuf-config-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join("config.toml");
        fs::write(&path, "grid = 3").unwrap();

        let err = Config::load_from(&path).unwrap_err();
        assert!(matches!(err, ConsoleError::Config { .. }));

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_load_from_rejects_empty_grid() {
        let dir = std::env::temp_dir().join(format!("conbuf-grid-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join("config.toml");
        fs::write(&path, "[grid]\nwidth = 0\n").unwrap();

        let err = Config::load_from(&path).unwrap_err();
        match err {
            ConsoleError::Config { message, .. } => assert!(message.contains("grid width")),
            other => panic!("unexpected error: {}", other),
        }

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_grid_validate() {
        assert!(GridConfig::default().validate().is_ok());

        let grid = GridConfig {
            width: Some(40),
            height: Some(-2),
        };
        assert_eq!(
            grid.validate().unwrap_err(),
            "grid height must be at least 1, got -2"
        );
    }
}
