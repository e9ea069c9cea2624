//! The package operation: relocate a source tree into a destination tree.
//!
//! Content is copied byte for byte. The whole source is walked before the
//! destination is touched, so a missing or unreadable source leaves the
//! destination unmodified. Re-running with an unchanged source yields an
//! identical destination, and files deleted from the source are deleted from
//! the destination.

use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};

use glob::{MatchOptions, Pattern};
use walkdir::WalkDir;

use crate::core::descriptor::CopyRule;
use crate::core::errors::PackError;
use crate::util::fs::{
    check_readable_dir, ensure_dir, normalize_path, same_contents, walk_error, walk_files,
};

/// `*` crosses directory separators, so a bare `*` selects a whole tree.
const MATCH_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: true,
    require_literal_separator: false,
    require_literal_leading_dot: false,
};

/// Which files of a source tree to copy and where they land.
#[derive(Debug, Clone)]
pub struct CopyFilter {
    /// `None` selects every file
    pattern: Option<Pattern>,
    keep_path: bool,
}

impl CopyFilter {
    /// Copy every file, keeping relative paths.
    pub fn all() -> Self {
        CopyFilter {
            pattern: None,
            keep_path: true,
        }
    }

    pub fn new(pattern: &str, keep_path: bool) -> Result<Self, PackError> {
        let pattern = Pattern::new(pattern).map_err(|e| PackError::InvalidPattern {
            pattern: pattern.to_string(),
            message: e.msg.to_string(),
        })?;
        Ok(CopyFilter {
            pattern: Some(pattern),
            keep_path,
        })
    }

    pub fn from_rule(rule: &CopyRule) -> Result<Self, PackError> {
        Self::new(&rule.pattern, rule.keep_path)
    }

    /// Whether a source-relative path is selected.
    pub fn matches(&self, rel: &Path) -> bool {
        match &self.pattern {
            Some(pattern) => pattern.matches_path_with(rel, MATCH_OPTIONS),
            None => true,
        }
    }

    /// Destination-relative path for a source-relative path.
    pub fn target(&self, rel: &Path) -> PathBuf {
        if self.keep_path {
            rel.to_path_buf()
        } else {
            rel.file_name().map(PathBuf::from).unwrap_or_default()
        }
    }
}

/// One file to copy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CopyEntry {
    pub source: PathBuf,

    /// Path relative to the destination root
    pub relative: PathBuf,
}

/// The resolved set of copies for one source/destination pair.
#[derive(Debug, Clone)]
pub struct CopyPlan {
    pub source_root: PathBuf,
    pub dest_root: PathBuf,
    pub entries: Vec<CopyEntry>,
}

/// Outcome of executing a copy plan.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CopyReport {
    /// Destination-relative paths of every file now present, in plan order
    pub files: Vec<PathBuf>,

    /// Files written on this run
    pub copied: usize,

    /// Files already present with identical contents
    pub unchanged: usize,

    /// Stale destination files deleted
    pub removed: usize,

    pub bytes: u64,
}

impl CopyReport {
    pub fn merge(&mut self, other: CopyReport) {
        self.files.extend(other.files);
        self.copied += other.copied;
        self.unchanged += other.unchanged;
        self.removed += other.removed;
        self.bytes += other.bytes;
    }
}

/// Resolve which files `package_filtered` would copy, without writing.
pub fn plan_copy(
    source_root: &Path,
    dest_root: &Path,
    filter: &CopyFilter,
) -> Result<CopyPlan, PackError> {
    check_readable_dir(source_root)?;

    let source_canon = normalize_path(source_root);
    // A destination nested in the source must not be copied into itself.
    let dest_canon = normalize_path(dest_root);
    let skip: Vec<PathBuf> = if dest_root.exists()
        && dest_canon != source_canon
        && dest_canon.starts_with(&source_canon)
    {
        vec![dest_canon]
    } else {
        Vec::new()
    };

    let mut entries: Vec<CopyEntry> = Vec::new();
    let mut seen: HashMap<PathBuf, PathBuf> = HashMap::new();
    for path in walk_files(&source_canon, &skip)? {
        let Ok(rel) = path.strip_prefix(&source_canon) else {
            continue;
        };
        if !filter.matches(rel) {
            continue;
        }
        fs::File::open(&path).map_err(|e| PackError::fs("read file", &path, e))?;
        let relative = filter.target(rel);
        if let Some(prev) = seen.insert(relative.clone(), path.clone()) {
            tracing::warn!(
                "{} and {} both map to {}; the latter wins",
                prev.display(),
                path.display(),
                relative.display()
            );
            entries.retain(|e| e.relative != relative);
        }
        entries.push(CopyEntry {
            source: path,
            relative,
        });
    }

    Ok(CopyPlan {
        source_root: source_root.to_path_buf(),
        dest_root: dest_root.to_path_buf(),
        entries,
    })
}

impl CopyPlan {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Perform the copies, calling `on_file` after each one.
    ///
    /// The destination root is created even when the plan is empty.
    pub fn execute(&self, mut on_file: impl FnMut(&Path)) -> Result<CopyReport, PackError> {
        ensure_dir(&self.dest_root)?;

        let mut report = CopyReport::default();
        for entry in &self.entries {
            let dest = self.dest_root.join(&entry.relative);
            if let Some(parent) = dest.parent() {
                ensure_dir(parent)?;
            }

            let size = if same_contents(&entry.source, &dest)? {
                report.unchanged += 1;
                fs::metadata(&dest)
                    .map_err(|e| PackError::fs("read metadata of", &dest, e))?
                    .len()
            } else {
                // A read-only copy from a previous run would reject the overwrite.
                if dest.exists() {
                    fs::remove_file(&dest).map_err(|e| PackError::fs("replace file", &dest, e))?;
                }
                let n = fs::copy(&entry.source, &dest)
                    .map_err(|e| PackError::fs("write file", &dest, e))?;
                tracing::debug!("copied {} -> {}", entry.source.display(), dest.display());
                report.copied += 1;
                n
            };

            report.bytes += size;
            report.files.push(entry.relative.clone());
            on_file(&entry.relative);
        }

        Ok(report)
    }

    /// Delete destination files the plan does not produce, then any
    /// directories that leaves empty. Returns the number of files deleted.
    ///
    /// A source root nested in the destination is left alone. Symlinks in the
    /// destination are removed as links, never followed.
    pub fn prune(&self) -> Result<usize, PackError> {
        if !self.dest_root.is_dir() {
            return Ok(0);
        }

        let keep: HashSet<&Path> = self.entries.iter().map(|e| e.relative.as_path()).collect();
        let source_in_dest = normalize_path(&self.source_root)
            .strip_prefix(normalize_path(&self.dest_root))
            .ok()
            .map(Path::to_path_buf);

        let walker = WalkDir::new(&self.dest_root)
            .min_depth(1)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| match (&source_in_dest, e.path().strip_prefix(&self.dest_root)) {
                (Some(nested), Ok(rel)) => rel != nested.as_path(),
                _ => true,
            });

        let mut stale = Vec::new();
        for entry in walker {
            let entry = entry.map_err(|e| walk_error(e, &self.dest_root))?;
            if entry.file_type().is_dir() {
                continue;
            }
            let Ok(rel) = entry.path().strip_prefix(&self.dest_root) else {
                continue;
            };
            if !keep.contains(rel) {
                stale.push(entry.into_path());
            }
        }

        for path in &stale {
            fs::remove_file(path).map_err(|e| PackError::fs("remove file", path, e))?;
            tracing::debug!("removed stale {}", path.display());

            let mut dir = path.parent();
            while let Some(d) = dir {
                if d == self.dest_root || !d.starts_with(&self.dest_root) {
                    break;
                }
                let mut contents =
                    fs::read_dir(d).map_err(|e| PackError::fs("read directory", d, e))?;
                if contents.next().is_some() {
                    break;
                }
                fs::remove_dir(d).map_err(|e| PackError::fs("remove directory", d, e))?;
                dir = d.parent();
            }
        }

        Ok(stale.len())
    }
}

/// Copy every file under `source_root` to the same relative path under `dest_root`.
///
/// Afterwards `dest_root` holds exactly the source's files: anything else
/// already under it is deleted once every copy has succeeded.
///
/// Fails with a Filesystem error naming the path when the source is missing or
/// unreadable, or when the destination cannot be created or written.
pub fn package(source_root: &Path, dest_root: &Path) -> Result<CopyReport, PackError> {
    let plan = plan_copy(source_root, dest_root, &CopyFilter::all())?;
    let mut report = plan.execute(|_| {})?;
    report.removed = plan.prune()?;
    Ok(report)
}

/// `package` restricted to files selected by `filter`.
///
/// Other files already in `dest_root` are kept, so several filtered copies
/// can share one destination.
pub fn package_filtered(
    source_root: &Path,
    dest_root: &Path,
    filter: &CopyFilter,
) -> Result<CopyReport, PackError> {
    plan_copy(source_root, dest_root, filter)?.execute(|_| {})
}
