//! Filesystem utilities.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::core::errors::PackError;

/// Remove a directory and all its contents, if it exists.
pub fn remove_dir_all_if_exists(path: &Path) -> Result<(), PackError> {
    if path.exists() {
        fs::remove_dir_all(path).map_err(|e| PackError::fs("remove directory", path, e))?;
    }
    Ok(())
}

/// Ensure a directory exists, creating it if necessary.
pub fn ensure_dir(path: &Path) -> Result<(), PackError> {
    if !path.is_dir() {
        fs::create_dir_all(path).map_err(|e| PackError::fs("create directory", path, e))?;
    }
    Ok(())
}

/// Write a string to a file, creating parent directories if needed.
pub fn write_string(path: &Path, contents: &str) -> Result<(), PackError> {
    if let Some(parent) = path.parent() {
        ensure_dir(parent)?;
    }
    fs::write(path, contents).map_err(|e| PackError::fs("write file", path, e))
}

/// Check that `path` is an existing, readable directory.
///
/// Nothing is created or modified.
pub fn check_readable_dir(path: &Path) -> Result<(), PackError> {
    const ACTION: &str = "read source directory";

    let meta = fs::metadata(path).map_err(|e| PackError::fs(ACTION, path, e))?;
    if !meta.is_dir() {
        return Err(PackError::fs(
            ACTION,
            path,
            io::Error::new(io::ErrorKind::InvalidInput, "not a directory"),
        ));
    }
    fs::read_dir(path).map_err(|e| PackError::fs(ACTION, path, e))?;
    Ok(())
}

/// All regular files under `root`, following symlinks, in sorted order.
///
/// Returned paths start with `root`. Directories under any of `skip` are
/// not descended into.
pub fn walk_files(root: &Path, skip: &[PathBuf]) -> Result<Vec<PathBuf>, PackError> {
    let mut files = Vec::new();

    let walker = WalkDir::new(root)
        .follow_links(true)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| !skip.iter().any(|s| e.path().starts_with(s)));

    for entry in walker {
        let entry = entry.map_err(|e| walk_error(e, root))?;

        if entry.file_type().is_file() {
            files.push(entry.into_path());
        }
    }

    Ok(files)
}

/// Convert a `walkdir` failure into a Filesystem error naming the failing path.
pub fn walk_error(e: walkdir::Error, root: &Path) -> PackError {
    let path = e.path().unwrap_or(root).to_path_buf();
    let source = match e.into_io_error() {
        Some(io) => io,
        None => io::Error::new(io::ErrorKind::InvalidData, "filesystem loop detected"),
    };
    PackError::fs("walk directory", path, source)
}

/// Whether two files have identical contents.
pub fn same_contents(a: &Path, b: &Path) -> Result<bool, PackError> {
    let (Ok(ma), Ok(mb)) = (fs::metadata(a), fs::metadata(b)) else {
        return Ok(false);
    };
    if !ma.is_file() || !mb.is_file() || ma.len() != mb.len() {
        return Ok(false);
    }
    let da = fs::read(a).map_err(|e| PackError::fs("read file", a, e))?;
    let db = fs::read(b).map_err(|e| PackError::fs("read file", b, e))?;
    Ok(da == db)
}

/// Canonicalize a path, but don't fail if it doesn't exist yet.
/// Returns the path as-is if canonicalization fails.
pub fn normalize_path(path: &Path) -> PathBuf {
    path.canonicalize().unwrap_or_else(|_| path.to_path_buf())
}

/// Get the relative path from `base` to `path`.
pub fn relative_path(base: &Path, path: &Path) -> PathBuf {
    pathdiff::diff_paths(path, base).unwrap_or_else(|| path.to_path_buf())
}

/// Render a relative path with `/` separators on every platform.
pub fn to_slash(path: &Path) -> String {
    path.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}
