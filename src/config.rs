use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{CleanerError, Result};

pub const DEFAULT_CONFIG_PATH: &str = "museum_cleaner.toml";

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub input: InputConfig,
    pub output: OutputConfig,
    pub pipeline: PipelineConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct InputConfig {
    pub artworks: PathBuf,
    pub artists: PathBuf,
    /// Field delimiter of both exports
    pub delimiter: char,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            artworks: PathBuf::from("data/Artworks.csv"),
            artists: PathBuf::from("data/Artists.csv"),
            delimiter: ',',
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub dir: PathBuf,
    pub write_csv: bool,
    /// Also load the clean tables into this SQLite database
    pub sqlite_path: Option<PathBuf>,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("output"),
            write_csv: true,
            sqlite_path: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Placeholder for missing artist nationality and gender
    pub unknown_sentinel: String,
    /// Emit a null-artist expanded row for artworks without artist ids
    /// instead of excluding them from the expanded table
    pub keep_unattributed: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            unknown_sentinel: crate::constants::UNKNOWN.to_string(),
            keep_unattributed: false,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub dir: PathBuf,
    pub file_prefix: String,
    /// EnvFilter directive used when RUST_LOG is unset
    pub default_directive: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("logs"),
            file_prefix: "museum_cleaner.log".to_string(),
            default_directive: "museum_cleaner=info".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file. A missing file at the default
    /// location falls back to defaults; an explicitly named file must exist.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let (config_path, explicit) = match path {
            Some(p) => (p.to_path_buf(), true),
            None => (PathBuf::from(DEFAULT_CONFIG_PATH), false),
        };

        if !config_path.exists() && !explicit {
            return Ok(Self::default());
        }

        let config_content = fs::read_to_string(&config_path).map_err(|e| {
            CleanerError::Config(format!(
                "Failed to read config file '{}': {}",
                config_path.display(),
                e
            ))
        })?;

        Self::from_toml(&config_content)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.pipeline.unknown_sentinel.trim().is_empty() {
            return Err(CleanerError::Config(
                "pipeline.unknown_sentinel must not be blank".to_string(),
            ));
        }
        if !self.input.delimiter.is_ascii() {
            return Err(CleanerError::Config(format!(
                "input.delimiter must be a single ASCII character, got {:?}",
                self.input.delimiter
            )));
        }
        Ok(())
    }
}
