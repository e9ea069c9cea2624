//! headerpack - packages header-only C/C++ libraries.
//!
//! A `Headerpack.toml` recipe names the package and describes which files
//! are exported and how they are laid out in the package tree. The library
//! stages the exported sources, copies them into the package tree, writes
//! consumer integration files and a `headerpack.json` manifest, and
//! produces a reproducible archive that can be published to a local index.

pub mod core;
pub mod ops;
pub mod util;

/// Fixtures for unit tests.
#[cfg(test)]
pub mod test_support;

pub use crate::core::{
    descriptor::PackageDescriptor, errors::PackError, manifest::PackageManifest, recipe::Recipe,
};

pub use crate::ops::copy::package;
pub use crate::util::context::GlobalContext;
