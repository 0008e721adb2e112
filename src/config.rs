// Configuration loaded from YAML, with defaults for every field

use eyre::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

pub const DEFAULT_CONFIG_FILE: &str = "coursestore.yaml";

/// Which `RecordStore` implementation holds favorites, comments and timetable entries
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    #[default]
    Json,
    Sqlite,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EncourageConfig {
    /// External program that reads a prompt on stdin and writes the comment to stdout
    pub command: Option<String>,
    pub args: Vec<String>,
    /// Returned whenever generation is unavailable or fails
    pub fallback: String,
}

impl Default for EncourageConfig {
    fn default() -> Self {
        Self {
            command: None,
            args: Vec::new(),
            fallback: crate::encourage::DEFAULT_FALLBACK.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub data_dir: PathBuf,
    /// Bare-array class catalog, relative to `data_dir` unless absolute
    pub catalog_file: PathBuf,
    pub backend: Backend,
    /// Database file for the sqlite backend, relative to `data_dir` unless absolute
    pub sqlite_file: PathBuf,
    pub encourage: EncourageConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            catalog_file: PathBuf::from("classes.json"),
            backend: Backend::default(),
            sqlite_file: PathBuf::from("coursestore.db"),
            encourage: EncourageConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from a YAML file; a missing file yields the defaults
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!(path = ?path, "No config file, using defaults");
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path).context("Failed to read config file")?;
        let config: Config = serde_yaml::from_str(&content).context("Failed to parse config file")?;

        info!(path = ?path, backend = ?config.backend, "Loaded config");
        Ok(config)
    }

    pub fn catalog_path(&self) -> PathBuf {
        self.data_dir.join(&self.catalog_file)
    }

    pub fn sqlite_path(&self) -> PathBuf {
        self.data_dir.join(&self.sqlite_file)
    }
}

fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .map(|d| d.join("coursestore"))
        .unwrap_or_else(|| PathBuf::from("."))
}
