//! Rule table and default option configuration.
//!
//! Configuration is read-only and stored as TOML. Categories are an array of
//! tables so their order, which decides first-match-wins lookups, survives
//! parsing:
//!
//! ```toml
//! mode = "category"
//! create_subfolders = true
//!
//! [[categories]]
//! name = "Images"
//! extensions = [".jpg", "png", "GIF"]
//!
//! [[categories]]
//! name = "Documents"
//! extensions = ["pdf", "txt"]
//! ```
//!
//! Without any `[[categories]]` the built-in table is used.

use crate::file_category::{CategoryRuleTable, OrganizeMode, RuleError};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Name of the per-directory configuration file looked up in the working directory.
pub const LOCAL_CONFIG_NAME: &str = ".dirsortrc.toml";

/// Errors that can occur during configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Configuration file not found at the specified path.
    #[error("Configuration file not found: {}", .0.display())]
    ConfigNotFound(PathBuf),
    /// Invalid TOML syntax or structure.
    #[error("Invalid configuration: {0}")]
    ConfigInvalid(String),
    /// A category entry failed validation.
    #[error("Invalid category table: {0}")]
    InvalidRules(#[from] RuleError),
    /// IO error while reading configuration.
    #[error("IO error reading configuration: {0}")]
    IoError(#[from] std::io::Error),
}

/// One `[[categories]]` entry as written in the file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryEntry {
    pub name: String,
    #[serde(default)]
    pub extensions: Vec<String>,
}

/// Top-level configuration document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleConfig {
    /// Default organization mode.
    #[serde(default)]
    pub mode: OrganizeMode,

    /// Whether to move files into bucket subfolders. Defaults to true.
    #[serde(default = "default_create_subfolders")]
    pub create_subfolders: bool,

    /// Ordered buckets; empty means the built-in table.
    #[serde(default)]
    pub categories: Vec<CategoryEntry>,
}

fn default_create_subfolders() -> bool {
    true
}

impl Default for RuleConfig {
    fn default() -> Self {
        Self {
            mode: OrganizeMode::default(),
            create_subfolders: default_create_subfolders(),
            categories: Vec::new(),
        }
    }
}

impl RuleConfig {
    /// Load configuration from file or use defaults.
    ///
    /// Search order:
    /// 1. `config_path` if given (must exist)
    /// 2. `./.dirsortrc.toml`
    /// 3. `$HOME/.config/dirsort/config.toml`
    /// 4. Built-in defaults
    pub fn load(config_path: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = config_path {
            return Self::load_from_file(path);
        }

        let local_config = PathBuf::from(LOCAL_CONFIG_NAME);
        if local_config.exists() {
            return Self::load_from_file(&local_config);
        }

        if let Ok(home) = std::env::var("HOME") {
            let home_config = PathBuf::from(home)
                .join(".config")
                .join("dirsort")
                .join("config.toml");
            if home_config.exists() {
                return Self::load_from_file(&home_config);
            }
        }

        log::debug!("No configuration file found, using defaults");
        Ok(Self::default())
    }

    /// Load configuration from a specific file.
    fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::ConfigNotFound(path.to_path_buf()));
        }

        log::debug!("Loading configuration from {}", path.display());
        let content = fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Parses a configuration document.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::ConfigInvalid(e.to_string()))
    }

    /// Builds the validated rule table.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidRules`] for empty or repeated bucket names
    /// and malformed extensions.
    pub fn rule_table(&self) -> Result<CategoryRuleTable, ConfigError> {
        if self.categories.is_empty() {
            return Ok(CategoryRuleTable::default());
        }

        let mut table = CategoryRuleTable::new();
        for entry in &self.categories {
            table.add_rule(&entry.name, &entry.extensions)?;
        }
        Ok(table)
    }
}
