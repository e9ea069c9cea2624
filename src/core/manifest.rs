//! `headerpack.json`: the manifest written into every package tree.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::core::descriptor::{Generator, PackageDescriptor, PackageMetadata};
use crate::core::errors::PackError;
use crate::util::hash::Fingerprint;

/// Manifest file name, at the root of the package tree.
pub const MANIFEST_FILE: &str = "headerpack.json";

/// Current manifest format version.
pub const MANIFEST_FORMAT: u32 = 1;

/// A file recorded in the manifest.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FileEntry {
    /// Path relative to the package root, `/`-separated
    pub path: String,

    pub size: u64,

    pub sha256: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageManifest {
    pub format: u32,

    #[serde(flatten)]
    pub metadata: PackageMetadata,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub generators: Vec<Generator>,

    pub package_id: String,

    pub files: Vec<FileEntry>,
}

impl PackageManifest {
    /// Build a manifest for `descriptor` over the given file entries.
    pub fn new(descriptor: &PackageDescriptor, mut files: Vec<FileEntry>) -> Self {
        files.sort();
        let package_id = compute_package_id(&descriptor.metadata, &files);
        PackageManifest {
            format: MANIFEST_FORMAT,
            metadata: descriptor.metadata.clone(),
            generators: descriptor.generators.clone(),
            package_id,
            files,
        }
    }

    /// Recompute the package id from the recorded metadata and files.
    pub fn expected_package_id(&self) -> String {
        compute_package_id(&self.metadata, &self.files)
    }

    pub fn total_size(&self) -> u64 {
        self.files.iter().map(|f| f.size).sum()
    }

    pub fn to_json(&self) -> Result<String, PackError> {
        serde_json::to_string_pretty(self).map_err(|e| PackError::Serialize {
            what: "package manifest",
            message: e.to_string(),
        })
    }

    pub fn from_json(s: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(s)
    }

    /// Load `headerpack.json` from a package tree.
    pub fn load(package_dir: &Path) -> Result<Self, PackError> {
        let path = package_dir.join(MANIFEST_FILE);
        let contents = std::fs::read_to_string(&path)
            .map_err(|e| PackError::fs("read package manifest", &path, e))?;
        Self::from_json(&contents).map_err(|e| {
            PackError::fs(
                "parse package manifest",
                &path,
                std::io::Error::new(std::io::ErrorKind::InvalidData, e),
            )
        })
    }
}

/// Fingerprint over name, version and the sorted file digests.
fn compute_package_id(metadata: &PackageMetadata, files: &[FileEntry]) -> String {
    let mut fp = Fingerprint::new();
    fp.update_str(&metadata.name)
        .update_str(metadata.version.as_str());
    for file in files {
        fp.update_str(&file.path).update_str(&file.sha256);
    }
    fp.finish_short()
}
