use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};

/// Editor configuration
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
pub struct Config {
    /// General editor settings
    #[serde(default)]
    pub editor: EditorConfig,

    /// UI settings
    #[serde(default)]
    pub ui: UiConfig,
}

/// Editor settings
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct EditorConfig {
    /// Maximum number of undo snapshots
    #[serde(default = "default_history_limit")]
    pub history_limit: usize,

    /// Bytes requested per PTY read
    #[serde(default = "default_pty_read_chunk")]
    pub pty_read_chunk: usize,

    /// Bytes of installer output shown on failure
    #[serde(default = "default_status_output_limit")]
    pub status_output_limit: usize,
}

/// UI settings
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct UiConfig {
    /// Show line numbers
    #[serde(default = "default_show_line_numbers")]
    pub show_line_numbers: bool,

    /// Sidebar width in columns
    #[serde(default = "default_sidebar_width")]
    pub sidebar_width: u16,

    /// Lines of scrollback kept by the terminal pane
    #[serde(default = "default_terminal_scrollback")]
    pub terminal_scrollback: usize,
}

// Default values
fn default_history_limit() -> usize {
    crate::history::DEFAULT_HISTORY_LIMIT
}
fn default_pty_read_chunk() -> usize {
    crate::pty::DEFAULT_READ_CHUNK
}
fn default_status_output_limit() -> usize {
    crate::extensions::DEFAULT_OUTPUT_LIMIT
}
fn default_show_line_numbers() -> bool {
    true
}
fn default_sidebar_width() -> u16 {
    30
}
fn default_terminal_scrollback() -> usize {
    1000
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            history_limit: default_history_limit(),
            pty_read_chunk: default_pty_read_chunk(),
            status_output_limit: default_status_output_limit(),
        }
    }
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            show_line_numbers: default_show_line_numbers(),
            sidebar_width: default_sidebar_width(),
            terminal_scrollback: default_terminal_scrollback(),
        }
    }
}

/// Directory holding `config.json`: `<config_dir>/termpad`.
pub fn default_config_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("termpad")
}

/// Configuration manager. The file is optional and read-only: it is never
/// created or written by the editor.
pub struct ConfigManager {
    /// The config
    config: Config,

    /// The path to the config file
    config_path: PathBuf,
}

impl ConfigManager {
    /// Create a new config manager
    pub fn new(config_dir: &Path) -> Self {
        Self {
            config: Config::default(),
            config_path: config_dir.join("config.json"),
        }
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    /// Load the config if the file exists, otherwise keep the defaults
    pub fn load(&mut self) -> Result<()> {
        if self.config_path.exists() {
            let config_str = fs::read_to_string(&self.config_path)?;
            self.config = serde_json::from_str(&config_str)
                .map_err(|e| anyhow!("Failed to parse config: {}", e))?;
        }
        Ok(())
    }

    /// Get the config
    pub fn get_config(&self) -> &Config {
        &self.config
    }

    pub fn into_config(self) -> Config {
        self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_keeps_defaults_and_creates_nothing() {
        let dir = TempDir::new().unwrap();
        let mut manager = ConfigManager::new(dir.path());
        manager.load().unwrap();
        assert_eq!(manager.get_config(), &Config::default());
        assert!(!manager.config_path().exists());
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("config.json"),
            r#"{ "ui": { "sidebar_width": 24 } }"#,
        )
        .unwrap();

        let mut manager = ConfigManager::new(dir.path());
        manager.load().unwrap();
        let config = manager.into_config();
        assert_eq!(config.ui.sidebar_width, 24);
        assert!(config.ui.show_line_numbers);
        assert_eq!(config.editor.history_limit, 200);
    }

    #[test]
    fn test_invalid_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("config.json"), "{ not json").unwrap();
        let mut manager = ConfigManager::new(dir.path());
        assert!(manager.load().is_err());
    }
}
