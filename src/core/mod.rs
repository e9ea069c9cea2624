//! Core data structures for headerpack.
//!
//! - Package descriptors and their metadata
//! - `Headerpack.toml` recipes
//! - `headerpack.json` package manifests
//! - Error types

pub mod descriptor;
pub mod errors;
pub mod manifest;
pub mod recipe;

pub use descriptor::{CopyRule, Generator, PackageDescriptor, PackageMetadata, PackageVersion};
pub use errors::{PackError, RecipeError};
pub use manifest::{FileEntry, PackageManifest, MANIFEST_FILE};
pub use recipe::{find_recipe, Recipe, RECIPE_FILE};
