//! Integrity check of a package tree against its `headerpack.json`.

use std::collections::BTreeMap;
use std::path::Path;

use crate::core::errors::PackError;
use crate::core::manifest::{PackageManifest, MANIFEST_FILE};
use crate::util::fs::{to_slash, walk_files};
use crate::util::hash::digest_file;

/// Outcome of verifying a package tree.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize)]
pub struct VerifyReport {
    pub reference: String,

    pub package_id: String,

    /// Files checked against the manifest
    pub checked: usize,

    /// Recorded in the manifest but absent on disk
    pub missing: Vec<String>,

    /// Present on disk with a different digest or size
    pub modified: Vec<String>,

    /// Present on disk but not recorded
    pub unexpected: Vec<String>,

    /// The recorded package id doesn't match the recorded files
    pub package_id_mismatch: bool,
}

impl VerifyReport {
    pub fn is_ok(&self) -> bool {
        self.missing.is_empty()
            && self.modified.is_empty()
            && self.unexpected.is_empty()
            && !self.package_id_mismatch
    }

    /// Human-readable summary, one problem per line.
    pub fn format(&self) -> String {
        let mut out = String::new();
        if self.is_ok() {
            out.push_str(&format!(
                "{} ({}): {} file(s) verified\n",
                self.reference, self.package_id, self.checked
            ));
            return out;
        }

        out.push_str(&format!("{} ({}): verification failed\n", self.reference, self.package_id));
        for path in &self.missing {
            out.push_str(&format!("  missing:    {}\n", path));
        }
        for path in &self.modified {
            out.push_str(&format!("  modified:   {}\n", path));
        }
        for path in &self.unexpected {
            out.push_str(&format!("  unexpected: {}\n", path));
        }
        if self.package_id_mismatch {
            out.push_str("  package id does not match the recorded files\n");
        }
        out
    }
}

/// Check every file under `package_dir` against the recorded manifest.
pub fn verify_package(package_dir: &Path) -> Result<VerifyReport, PackError> {
    let manifest = PackageManifest::load(package_dir)?;

    let on_disk: BTreeMap<String, std::path::PathBuf> = walk_files(package_dir, &[])?
        .into_iter()
        .filter_map(|p| {
            let rel = to_slash(p.strip_prefix(package_dir).ok()?);
            (rel != MANIFEST_FILE).then_some((rel, p))
        })
        .collect();

    let mut report = VerifyReport {
        reference: manifest.metadata.reference(),
        package_id: manifest.package_id.clone(),
        package_id_mismatch: manifest.expected_package_id() != manifest.package_id,
        ..Default::default()
    };

    for entry in &manifest.files {
        match on_disk.get(&entry.path) {
            None => report.missing.push(entry.path.clone()),
            Some(path) => {
                let digest = digest_file(path)?;
                report.checked += 1;
                if digest.sha256 != entry.sha256 || digest.size != entry.size {
                    report.modified.push(entry.path.clone());
                }
            }
        }
    }

    for rel in on_disk.keys() {
        if !manifest.files.iter().any(|f| &f.path == rel) {
            report.unexpected.push(rel.clone());
        }
    }

    if report.is_ok() {
        tracing::debug!("verified {} file(s) in {}", report.checked, package_dir.display());
    } else {
        tracing::warn!("package {} failed verification", package_dir.display());
    }

    Ok(report)
}
