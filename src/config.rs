//! Configuration management for lined
//!
//! lined reads its configuration from ~/.lined/config.toml. When the file is
//! missing it is created from a commented template and defaults are used.

use crate::pattern::RegexFlavor;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Commented template documenting every option and its default.
pub const DEFAULT_CONFIG: &str = r#"# lined configuration file

[editor]
# Prompt written before each command (default: none)
#prompt = "*"

# Explain each error after its '?' (default: false)
#verbose_errors = false

# Print line counts after reading or writing a file (default: true)
#show_counts = true

[regex]
# Pattern syntax: "pcre" (default), "ere", or "bre"
#flavor = "pcre"

[logging]
# Write a debug log to ~/.lined/lined.log (default: false)
#debug = false
"#;

/// lined configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub editor: EditorConfig,

    #[serde(default)]
    pub regex: RegexConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EditorConfig {
    /// Prompt string shown before each command
    #[serde(default)]
    pub prompt: String,

    /// Print the error message after every `?`
    #[serde(default)]
    pub verbose_errors: bool,

    /// Print line counts for file reads and writes
    #[serde(default = "default_show_counts")]
    pub show_counts: bool,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            prompt: String::new(),
            verbose_errors: false,
            show_counts: true,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RegexConfig {
    #[serde(default)]
    pub flavor: RegexFlavor,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default)]
    pub debug: bool,
}

fn default_show_counts() -> bool { true }

/// Directory holding the config file and the debug log
pub fn config_dir() -> Result<PathBuf> {
    let home_dir = dirs::home_dir()
        .ok_or_else(|| anyhow::anyhow!("Cannot determine home directory"))?;
    Ok(home_dir.join(".lined"))
}

/// Get the configuration file path
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join("config.toml"))
}

/// Parse configuration text
pub fn parse_config(text: &str) -> Result<Config> {
    toml::from_str(text).context("Failed to parse configuration")
}

/// Write the commented template to `path`, creating its directory.
pub fn save_default_config(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create config directory: {}", parent.display()))?;
    }
    fs::write(path, DEFAULT_CONFIG)
        .with_context(|| format!("Failed to write default config file: {}", path.display()))
}

/// Load and validate configuration from the config file, creating it with
/// defaults if it does not exist
pub fn load_config() -> Result<Config> {
    let config_path = config_file_path()?;
    load_config_from(&config_path)
}

fn load_config_from(config_path: &Path) -> Result<Config> {
    if !config_path.exists() {
        save_default_config(config_path)?;
        return Ok(Config::default());
    }

    let config_str = fs::read_to_string(config_path)
        .with_context(|| format!("Failed to read config file: {}", config_path.display()))?;

    let config = parse_config(&config_str)
        .with_context(|| format!("Invalid config file: {}", config_path.display()))?;
    validate_config(&config)
        .with_context(|| format!("Invalid config file: {}", config_path.display()))?;
    Ok(config)
}

/// Validate configuration values
pub fn validate_config(config: &Config) -> Result<()> {
    if config.editor.prompt.contains(['\n', '\r']) {
        anyhow::bail!("Invalid prompt: {:?} (must be a single line)", config.editor.prompt);
    }

    Ok(())
}
