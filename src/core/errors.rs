//! Error types for recipe loading and packaging.

use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

/// Error raised while staging or copying a package tree.
///
/// Every filesystem failure collapses into the single `Filesystem` kind;
/// the message always names the path that failed.
#[derive(Debug, Error)]
pub enum PackError {
    #[error("failed to {action} `{}`", path.display())]
    Filesystem {
        action: &'static str,
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("invalid glob pattern `{pattern}`: {message}")]
    InvalidPattern { pattern: String, message: String },

    #[error("failed to serialize {what}: {message}")]
    Serialize { what: &'static str, message: String },
}

impl PackError {
    /// Build a Filesystem error for `path`.
    pub fn fs(action: &'static str, path: impl AsRef<Path>, source: io::Error) -> Self {
        PackError::Filesystem {
            action,
            path: path.as_ref().to_path_buf(),
            source,
        }
    }

    /// Build a Filesystem error for a path that must exist but doesn't.
    pub fn not_found(action: &'static str, path: impl AsRef<Path>) -> Self {
        Self::fs(
            action,
            path,
            io::Error::new(io::ErrorKind::NotFound, "no such file or directory"),
        )
    }

    /// The path named by a Filesystem error.
    pub fn path(&self) -> Option<&Path> {
        match self {
            PackError::Filesystem { path, .. } => Some(path),
            _ => None,
        }
    }

    /// Whether this is the Filesystem kind.
    pub fn is_filesystem(&self) -> bool {
        matches!(self, PackError::Filesystem { .. })
    }
}

/// Error raised while loading or validating a `Headerpack.toml` recipe.
#[derive(Debug, Error)]
pub enum RecipeError {
    #[error("could not find `Headerpack.toml` in `{}` or any parent directory", dir.display())]
    NotFound { dir: PathBuf },

    #[error("failed to parse `{}`: {message}", path.display())]
    Parse { path: PathBuf, message: String },

    #[error("invalid package name `{name}`: {reason}")]
    InvalidName { name: String, reason: String },

    #[error("invalid package version `{version}`: {reason}")]
    InvalidVersion { version: String, reason: String },

    #[error("invalid url `{url}`: {message}")]
    InvalidUrl { url: String, message: String },

    #[error("invalid glob pattern `{pattern}`: {message}")]
    InvalidPattern { pattern: String, message: String },

    #[error("unknown generator `{name}` (expected `cmake` or `pkg_config`)")]
    UnknownGenerator { name: String },

    #[error("copy source `{src}` is not covered by any export pattern ({})", exports.join(", "))]
    UncoveredCopySource { src: String, exports: Vec<String> },

    #[error("copy path `{path}` must be relative and must not contain `..`")]
    InvalidCopyPath { path: String },
}
