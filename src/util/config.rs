//! Configuration file support for headerpack.
//!
//! Two locations are read:
//! - Global: `~/.headerpack/config.toml` - user-wide defaults
//! - Project: `.headerpack/config.toml` next to the recipe
//!
//! Project config takes precedence over global config.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::ops::archive::DEFAULT_COMPRESSION;

/// Name of the per-user and per-project directory.
pub const CONFIG_DIR: &str = ".headerpack";

/// headerpack configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Packaging settings
    pub package: PackageConfig,

    /// Local index settings
    pub index: IndexConfig,
}

/// Packaging-related configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PackageConfig {
    /// Work directory, relative to the recipe directory
    pub work_dir: Option<PathBuf>,

    /// Produce an archive after packaging
    pub archive: Option<bool>,

    /// Gzip level, 0-9
    pub compression: Option<u32>,
}

/// Index-related configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexConfig {
    /// Local index directory
    pub path: Option<PathBuf>,
}

impl Config {
    /// Load configuration from a file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file: {}", path.display()))?;

        toml::from_str(&contents)
            .with_context(|| format!("failed to parse config file: {}", path.display()))
    }

    /// Load configuration with fallback to defaults if file doesn't exist.
    pub fn load_or_default(path: &Path) -> Self {
        if path.exists() {
            Self::load(path).unwrap_or_else(|e| {
                tracing::warn!("Failed to load config from {}: {:#}", path.display(), e);
                Self::default()
            })
        } else {
            Self::default()
        }
    }

    /// Merge another config into this one (other takes precedence).
    pub fn merge(&mut self, other: Config) {
        if other.package.work_dir.is_some() {
            self.package.work_dir = other.package.work_dir;
        }
        if other.package.archive.is_some() {
            self.package.archive = other.package.archive;
        }
        if other.package.compression.is_some() {
            self.package.compression = other.package.compression;
        }
        if other.index.path.is_some() {
            self.index.path = other.index.path;
        }
    }

    /// Work directory for a recipe rooted at `recipe_dir`.
    pub fn work_dir(&self, recipe_dir: &Path) -> PathBuf {
        match &self.package.work_dir {
            Some(dir) => recipe_dir.join(dir),
            None => recipe_dir.join(CONFIG_DIR),
        }
    }

    pub fn archive(&self) -> bool {
        self.package.archive.unwrap_or(true)
    }

    pub fn compression(&self) -> u32 {
        self.package.compression.unwrap_or(DEFAULT_COMPRESSION).min(9)
    }

    /// Configured index directory, or `~/.headerpack/index`.
    pub fn index_dir(&self) -> Option<PathBuf> {
        self.index
            .path
            .clone()
            .or_else(|| global_config_dir().map(|d| d.join("index")))
    }
}

/// Load merged configuration from global and project locations.
///
/// Order of precedence (highest to lowest):
/// 1. Project config (.headerpack/config.toml)
/// 2. Global config (~/.headerpack/config.toml)
/// 3. Defaults
pub fn load_config(global_path: &Path, project_path: &Path) -> Config {
    let mut config = Config::default();

    if global_path.exists() {
        config.merge(Config::load_or_default(global_path));
    }

    if project_path.exists() {
        config.merge(Config::load_or_default(project_path));
    }

    config
}

/// Get the global config directory (~/.headerpack).
pub fn global_config_dir() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|b| b.home_dir().join(CONFIG_DIR))
}

/// Get the global config path (~/.headerpack/config.toml).
pub fn global_config_path() -> Option<PathBuf> {
    global_config_dir().map(|dir| dir.join("config.toml"))
}

/// Get the project config path (.headerpack/config.toml).
pub fn project_config_path(project_root: &Path) -> PathBuf {
    project_root.join(CONFIG_DIR).join("config.toml")
}
