//! CLI configuration file handling.

use crate::error::{CliError, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Output format preference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Human-readable tables
    Table,
    /// JSON for scripting
    Json,
    /// IDs only
    Quiet,
}

impl Default for OutputFormat {
    fn default() -> Self {
        Self::Table
    }
}

impl From<crate::cli::CliFormat> for OutputFormat {
    fn from(format: crate::cli::CliFormat) -> Self {
        match format {
            crate::cli::CliFormat::Table => Self::Table,
            crate::cli::CliFormat::Json => Self::Json,
            crate::cli::CliFormat::Quiet => Self::Quiet,
        }
    }
}

/// Persisted CLI settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Ollama endpoint
    pub endpoint: String,

    /// Default model
    pub model: String,

    /// Default database path
    pub db_path: PathBuf,

    /// Default output format
    #[serde(default)]
    pub format: OutputFormat,

    /// Colored output
    #[serde(default = "default_color")]
    pub color: bool,
}

fn default_color() -> bool {
    true
}

impl Default for Config {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:11434".to_string(),
            model: "llama3".to_string(),
            db_path: PathBuf::from("forge.db"),
            format: OutputFormat::Table,
            color: true,
        }
    }
}

impl Config {
    /// Path of the config file under the user's config directory.
    pub fn path() -> Result<PathBuf> {
        let base = dirs::config_dir()
            .ok_or_else(|| CliError::Config("cannot determine config directory".to_string()))?;
        Ok(base.join("forge").join("config.toml"))
    }

    /// Load the config file, or error if missing/unreadable.
    pub fn load() -> Result<Self> {
        let path = Self::path()?;
        let raw = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&raw)?)
    }

    /// Write the config file, creating parent directories as needed.
    pub fn save(&self) -> Result<()> {
        let path = Self::path()?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let raw = toml::to_string_pretty(self)
            .map_err(|e| CliError::Config(format!("cannot serialize config: {}", e)))?;
        std::fs::write(path, raw)?;
        Ok(())
    }
}
