//! Global context for headerpack commands.
//!
//! Resolves the recipe for the current directory (or `--manifest-path`)
//! and the merged configuration that applies to it.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::core::recipe::{find_recipe, Recipe};
use crate::ops::package::PackageOptions;
use crate::util::config::{global_config_path, load_config, project_config_path, Config};

/// Global context containing configuration and paths.
#[derive(Debug, Clone)]
pub struct GlobalContext {
    /// Current working directory
    cwd: PathBuf,

    /// Explicit recipe path from `--manifest-path`
    manifest_path: Option<PathBuf>,
}

impl GlobalContext {
    /// Create a context rooted at the process working directory.
    pub fn new() -> Result<Self> {
        let cwd = std::env::current_dir().context("failed to get current directory")?;
        Ok(Self::with_cwd(cwd))
    }

    /// Create a context rooted at `cwd`.
    pub fn with_cwd(cwd: PathBuf) -> Self {
        GlobalContext {
            cwd,
            manifest_path: None,
        }
    }

    /// Use an explicit recipe instead of searching upward from the cwd.
    pub fn with_manifest_path(mut self, path: Option<PathBuf>) -> Self {
        self.manifest_path = path.map(|p| self.cwd.join(p));
        self
    }

    pub fn cwd(&self) -> &Path {
        &self.cwd
    }

    /// Locate `Headerpack.toml`.
    pub fn find_recipe(&self) -> Result<PathBuf> {
        match &self.manifest_path {
            Some(path) => Ok(path.clone()),
            None => Ok(find_recipe(&self.cwd)?),
        }
    }

    /// Locate and load the recipe.
    pub fn load_recipe(&self) -> Result<Recipe> {
        let path = self.find_recipe()?;
        Recipe::load(&path).with_context(|| format!("failed to load recipe `{}`", path.display()))
    }

    /// Merged global and project configuration for a recipe rooted at
    /// `recipe_dir`.
    pub fn config(&self, recipe_dir: &Path) -> Config {
        let project = project_config_path(recipe_dir);
        match global_config_path() {
            Some(global) => load_config(&global, &project),
            None => Config::load_or_default(&project),
        }
    }

    /// Packaging options for `recipe` from configuration.
    pub fn package_options(&self, recipe: &Recipe) -> PackageOptions {
        let config = self.config(recipe.root());
        PackageOptions::new(config.work_dir(recipe.root()))
            .with_archive(config.archive())
            .with_compression(config.compression())
    }

    /// Index directory: the explicit one, else the configured default.
    pub fn index_dir(&self, explicit: Option<&Path>, recipe_dir: Option<&Path>) -> Result<PathBuf> {
        if let Some(dir) = explicit {
            return Ok(self.cwd.join(dir));
        }
        let config = match recipe_dir {
            Some(dir) => self.config(dir),
            None => self.config(&self.cwd),
        };
        config
            .index_dir()
            .context("could not determine the home directory; pass --index")
    }
}
