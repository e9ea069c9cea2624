//! Local package index: a directory of archives plus `index.json`.
//!
//! Layout:
//! ```text
//! <index>/index.json
//! <index>/<name>/<version>/<name>-<version>.tar.gz
//! ```

use std::cmp::Ordering;
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::core::descriptor::{PackageMetadata, PackageVersion};
use crate::core::errors::PackError;
use crate::core::manifest::PackageManifest;
use crate::util::fs::{ensure_dir, to_slash};
use crate::util::hash::digest_file;

pub const INDEX_FILE: &str = "index.json";

const INDEX_FORMAT: u32 = 1;

/// One published package.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexEntry {
    #[serde(flatten)]
    pub metadata: PackageMetadata,

    pub package_id: String,

    /// Archive path relative to the index root
    pub archive: String,

    pub archive_sha256: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageIndex {
    pub format: u32,

    #[serde(default)]
    pub packages: Vec<IndexEntry>,
}

impl Default for PackageIndex {
    fn default() -> Self {
        PackageIndex {
            format: INDEX_FORMAT,
            packages: Vec::new(),
        }
    }
}

impl PackageIndex {
    /// Load the index in `index_dir`; a missing index is empty.
    pub fn load(index_dir: &Path) -> Result<Self, PackError> {
        let path = index_dir.join(INDEX_FILE);
        if !path.exists() {
            return Ok(PackageIndex::default());
        }
        let contents = std::fs::read_to_string(&path)
            .map_err(|e| PackError::fs("read package index", &path, e))?;
        serde_json::from_str(&contents).map_err(|e| {
            PackError::fs(
                "parse package index",
                &path,
                std::io::Error::new(std::io::ErrorKind::InvalidData, e),
            )
        })
    }

    /// Write `index.json`, replacing the previous one atomically.
    pub fn save(&self, index_dir: &Path) -> Result<(), PackError> {
        ensure_dir(index_dir)?;
        let path = index_dir.join(INDEX_FILE);
        let json = serde_json::to_string_pretty(self).map_err(|e| PackError::Serialize {
            what: "package index",
            message: e.to_string(),
        })?;

        let mut tmp = tempfile::NamedTempFile::new_in(index_dir)
            .map_err(|e| PackError::fs("write package index", &path, e))?;
        tmp.write_all(json.as_bytes())
            .map_err(|e| PackError::fs("write package index", &path, e))?;
        tmp.persist(&path)
            .map_err(|e| PackError::fs("write package index", &path, e.error))?;
        Ok(())
    }

    /// Insert or replace the entry with the same name and version.
    ///
    /// Returns true when an existing entry was replaced.
    pub fn upsert(&mut self, entry: IndexEntry) -> bool {
        let existing = self.packages.iter_mut().find(|e| {
            e.metadata.name == entry.metadata.name && e.metadata.version == entry.metadata.version
        });
        let replaced = match existing {
            Some(slot) => {
                *slot = entry;
                true
            }
            None => {
                self.packages.push(entry);
                false
            }
        };
        self.packages.sort_by(compare_entries);
        replaced
    }

    /// Entries sorted by name, then version; optionally filtered by name.
    pub fn entries(&self, name: Option<&str>) -> Vec<&IndexEntry> {
        let mut entries: Vec<&IndexEntry> = self
            .packages
            .iter()
            .filter(|e| name.map_or(true, |n| e.metadata.name == n))
            .collect();
        entries.sort_by(|a, b| compare_entries(a, b));
        entries
    }

    /// Find `name` at `version`.
    ///
    /// An exact version string always wins. Asking for a moving marker
    /// (`latest`/`last`) falls back to any marker entry, then to the highest
    /// fixed version.
    pub fn lookup(&self, name: &str, version: &str) -> Option<&IndexEntry> {
        let candidates = self.entries(Some(name));

        if let Some(exact) = candidates.iter().find(|e| e.metadata.version.as_str() == version) {
            return Some(*exact);
        }

        let wanted = PackageVersion::parse(version).ok()?;
        if !wanted.is_latest() {
            return None;
        }

        candidates
            .iter()
            .find(|e| e.metadata.version.is_latest())
            .or_else(|| {
                candidates
                    .iter()
                    .filter(|e| e.metadata.version.to_semver().is_some())
                    .max_by(|a, b| compare_versions(&a.metadata.version, &b.metadata.version))
            })
            .copied()
    }
}

fn compare_entries(a: &IndexEntry, b: &IndexEntry) -> Ordering {
    a.metadata
        .name
        .cmp(&b.metadata.name)
        .then_with(|| compare_versions(&a.metadata.version, &b.metadata.version))
}

/// Fixed versions by lenient semver, unparsable ones by string, markers last.
fn compare_versions(a: &PackageVersion, b: &PackageVersion) -> Ordering {
    match (a.is_latest(), b.is_latest()) {
        (true, true) => a.as_str().cmp(b.as_str()),
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => match (a.to_semver(), b.to_semver()) {
            (Some(va), Some(vb)) => va.cmp(&vb).then_with(|| a.as_str().cmp(b.as_str())),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => a.as_str().cmp(b.as_str()),
        },
    }
}

/// Entries of the index in `index_dir`, sorted by name then version.
pub fn list(index_dir: &Path, name: Option<&str>) -> Result<Vec<IndexEntry>, PackError> {
    let index = PackageIndex::load(index_dir)?;
    Ok(index.entries(name).into_iter().cloned().collect())
}

/// Resolve `name` at `version` in the index in `index_dir`.
pub fn lookup(index_dir: &Path, name: &str, version: &str) -> Result<Option<IndexEntry>, PackError> {
    let index = PackageIndex::load(index_dir)?;
    Ok(index.lookup(name, version).cloned())
}

/// Outcome of publishing into an index.
#[derive(Debug, Clone)]
pub struct PublishResult {
    pub entry: IndexEntry,

    /// Absolute path of the stored archive
    pub stored: PathBuf,

    /// An entry with the same name and version was replaced
    pub replaced: bool,
}

/// Copy `archive` into `index_dir` and record it.
///
/// Publishing the same package twice leaves the index unchanged.
pub fn publish(
    index_dir: &Path,
    manifest: &PackageManifest,
    archive: &Path,
) -> Result<PublishResult, PackError> {
    if !archive.is_file() {
        return Err(PackError::not_found("read archive", archive));
    }

    let meta = &manifest.metadata;
    let rel = Path::new(&meta.name)
        .join(meta.version.as_str())
        .join(meta.archive_name());
    let stored = index_dir.join(&rel);
    if let Some(parent) = stored.parent() {
        ensure_dir(parent)?;
    }
    std::fs::copy(archive, &stored).map_err(|e| PackError::fs("write archive", &stored, e))?;

    let entry = IndexEntry {
        metadata: meta.clone(),
        package_id: manifest.package_id.clone(),
        archive: to_slash(&rel),
        archive_sha256: digest_file(&stored)?.sha256,
    };

    let mut index = PackageIndex::load(index_dir)?;
    let replaced = index.upsert(entry.clone());
    index.save(index_dir)?;

    tracing::info!(
        "published {} to {}{}",
        meta.reference(),
        index_dir.display(),
        if replaced { " (replaced)" } else { "" }
    );

    Ok(PublishResult {
        entry,
        stored,
        replaced,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn entry(name: &str, version: &str) -> IndexEntry {
        IndexEntry {
            metadata: PackageMetadata::new(name, PackageVersion::parse(version).unwrap())
                .with_license("MIT"),
            package_id: format!("{}-{}", name, version),
            archive: format!("{}/{}/{}-{}.tar.gz", name, version, name, version),
            archive_sha256: String::new(),
        }
    }

    fn index(entries: &[(&str, &str)]) -> PackageIndex {
        let mut idx = PackageIndex::default();
        for (n, v) in entries {
            idx.upsert(entry(n, v));
        }
        idx
    }

    #[test]
    fn test_entries_sorted() {
        let idx = index(&[("qflags", "last"), ("qflags", "0.10"), ("qflags", "0.2"), ("argh", "1.0")]);
        let listed: Vec<String> = idx
            .entries(None)
            .iter()
            .map(|e| e.metadata.reference())
            .collect();
        assert_eq!(listed, vec!["argh/1.0", "qflags/0.2", "qflags/0.10", "qflags/last"]);
        assert_eq!(idx.entries(Some("argh")).len(), 1);
    }

    #[test]
    fn test_upsert_replaces_same_version() {
        let mut idx = index(&[("qflags", "0.1")]);
        let mut updated = entry("qflags", "0.1");
        updated.package_id = "new".into();

        assert!(idx.upsert(updated));
        assert_eq!(idx.packages.len(), 1);
        assert_eq!(idx.packages[0].package_id, "new");
    }

    #[test]
    fn test_lookup_exact() {
        let idx = index(&[("qflags", "0.1"), ("qflags", "last")]);
        assert_eq!(idx.lookup("qflags", "0.1").unwrap().metadata.version.as_str(), "0.1");
        assert_eq!(idx.lookup("qflags", "last").unwrap().metadata.version.as_str(), "last");
        assert!(idx.lookup("qflags", "0.2").is_none());
        assert!(idx.lookup("argh", "0.1").is_none());
    }

    #[test]
    fn test_lookup_latest_prefers_marker() {
        let idx = index(&[("qflags", "0.1"), ("qflags", "0.3"), ("qflags", "last")]);
        assert_eq!(idx.lookup("qflags", "latest").unwrap().metadata.version.as_str(), "last");
    }

    #[test]
    fn test_lookup_latest_falls_back_to_highest() {
        let idx = index(&[("qflags", "0.9"), ("qflags", "0.10"), ("qflags", "nightly")]);
        assert_eq!(idx.lookup("qflags", "latest").unwrap().metadata.version.as_str(), "0.10");
    }

    #[test]
    fn test_save_and_load() {
        let tmp = TempDir::new().unwrap();
        let idx = index(&[("qflags", "0.1")]);
        idx.save(tmp.path()).unwrap();

        let loaded = PackageIndex::load(tmp.path()).unwrap();
        assert_eq!(loaded, idx);
        assert_eq!(PackageIndex::load(&tmp.path().join("empty")).unwrap().packages.len(), 0);
    }

    #[test]
    fn test_index_entry_metadata_round_trip() {
        let json = serde_json::to_string(&entry("qflags", "0.1")).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["name"], "qflags");
        assert_eq!(value["version"], "0.1");
        assert_eq!(value["license"], "MIT");
    }

    #[test]
    fn test_publish_is_idempotent() {
        use crate::core::recipe::Recipe;
        use crate::ops::package::{create_package, PackageOptions};
        use crate::test_support::qflags_project;

        let tmp = TempDir::new().unwrap();
        let recipe = Recipe::load(&qflags_project(tmp.path())).unwrap();
        let opts = PackageOptions::new(tmp.path().join(".headerpack"));
        let result = create_package(&recipe.descriptor, recipe.root(), &opts).unwrap();
        let archive = result.archive.unwrap().path;
        let index_dir = tmp.path().join("index");

        let first = publish(&index_dir, &result.manifest, &archive).unwrap();
        let before = std::fs::read(index_dir.join(INDEX_FILE)).unwrap();
        let second = publish(&index_dir, &result.manifest, &archive).unwrap();

        assert!(!first.replaced);
        assert!(second.replaced);
        assert_eq!(before, std::fs::read(index_dir.join(INDEX_FILE)).unwrap());
        assert!(index_dir.join("qflags/0.1/qflags-0.1.tar.gz").is_file());
        assert_eq!(first.entry.archive, "qflags/0.1/qflags-0.1.tar.gz");

        let entries = list(&index_dir, Some("qflags")).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].package_id, result.manifest.package_id);
        assert!(lookup(&index_dir, "qflags", "latest").unwrap().is_some());
    }

    #[test]
    fn test_publish_missing_archive() {
        let tmp = TempDir::new().unwrap();
        let manifest = PackageManifest {
            format: 1,
            metadata: entry("qflags", "0.1").metadata,
            generators: vec![],
            package_id: "id".into(),
            files: vec![],
        };
        let err = publish(tmp.path(), &manifest, &tmp.path().join("missing.tar.gz")).unwrap_err();
        assert!(err.is_filesystem());
        assert!(!tmp.path().join(INDEX_FILE).exists());
    }
}
