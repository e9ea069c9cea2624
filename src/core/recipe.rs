//! Headerpack.toml recipe parsing.
//!
//! A recipe declares the package metadata, the export pattern selecting which
//! files of the recipe directory are bundled, and the copy actions that lay
//! them out in the package tree:
//!
//! ```toml
//! [package]
//! name = "qflags"
//! version = "0.1"
//! license = "MIT"
//! url = "https://github.com/AlErted/qflags"
//! description = "Simple cross-platform C++ command-line parsing library"
//! exports = ["include/*"]
//! generators = ["cmake"]
//!
//! [[copy]]
//! pattern = "*"
//! src = "include"
//! dst = "include"
//! ```

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::core::descriptor::{
    default_exports, CopyRule, Generator, PackageDescriptor, PackageMetadata, PackageVersion,
};
use crate::core::errors::RecipeError;

/// Recipe file name.
pub const RECIPE_FILE: &str = "Headerpack.toml";

/// A loaded recipe: the descriptor plus where it came from.
#[derive(Debug, Clone)]
pub struct Recipe {
    pub descriptor: PackageDescriptor,

    /// Path of the Headerpack.toml file
    pub path: PathBuf,
}

impl Recipe {
    /// Load and validate a recipe file.
    pub fn load(path: &Path) -> Result<Self, RecipeError> {
        let contents = std::fs::read_to_string(path).map_err(|e| RecipeError::Parse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        let descriptor = parse_recipe(&contents, path)?;

        tracing::debug!(
            "loaded recipe {} from {}",
            descriptor.metadata.reference(),
            path.display()
        );

        Ok(Recipe {
            descriptor,
            path: path.to_path_buf(),
        })
    }

    /// Directory containing the recipe; export patterns are relative to it.
    pub fn root(&self) -> &Path {
        self.path.parent().unwrap_or_else(|| Path::new("."))
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawRecipe {
    package: RawPackage,

    #[serde(default)]
    copy: Option<Vec<CopyRule>>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawPackage {
    name: String,
    version: String,
    #[serde(default)]
    license: Option<String>,
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    authors: Vec<String>,
    #[serde(default)]
    topics: Vec<String>,
    #[serde(default)]
    exports: Option<Vec<String>>,
    #[serde(default)]
    generators: Vec<String>,
}

/// Parse recipe text into a validated descriptor.
///
/// `path` is only used for error messages.
pub fn parse_recipe(contents: &str, path: &Path) -> Result<PackageDescriptor, RecipeError> {
    let raw: RawRecipe = toml::from_str(contents).map_err(|e| RecipeError::Parse {
        path: path.to_path_buf(),
        message: e.message().to_string(),
    })?;

    let pkg = raw.package;
    let version = PackageVersion::parse(&pkg.version)?;

    let generators = pkg
        .generators
        .iter()
        .map(|g| g.parse::<Generator>())
        .collect::<Result<Vec<_>, _>>()?;

    let metadata = PackageMetadata {
        name: pkg.name,
        version,
        license: pkg.license,
        url: pkg.url,
        description: pkg.description,
        authors: pkg.authors,
        topics: pkg.topics,
    };

    let descriptor = PackageDescriptor {
        metadata,
        exports: pkg.exports.unwrap_or_else(default_exports),
        copy: raw.copy.unwrap_or_else(|| vec![CopyRule::include_headers()]),
        generators,
    };

    descriptor.validate()?;

    if descriptor.metadata.license.is_none() {
        tracing::warn!("recipe {} has no `license` field", path.display());
    }

    Ok(descriptor)
}

/// Find `Headerpack.toml` in `dir` or any of its ancestors.
pub fn find_recipe(dir: &Path) -> Result<PathBuf, RecipeError> {
    let mut current = dir.to_path_buf();
    loop {
        let candidate = current.join(RECIPE_FILE);
        if candidate.is_file() {
            return Ok(candidate);
        }
        if !current.pop() {
            return Err(RecipeError::NotFound {
                dir: dir.to_path_buf(),
            });
        }
    }
}

/// Template recipe written by `headerpack init`.
pub fn generate_recipe(name: &str) -> String {
    format!(
        r#"[package]
name = "{name}"
version = "0.1"
license = "MIT"
description = "Header-only C/C++ library"
exports = ["include/*"]

[[copy]]
pattern = "*"
src = "include"
dst = "include"
"#
    )
}
