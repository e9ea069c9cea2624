//! Export step: stage the files selected by the export pattern.

use std::path::{Path, PathBuf};

use crate::core::descriptor::PackageDescriptor;
use crate::core::errors::PackError;
use crate::ops::copy::{CopyEntry, CopyFilter, CopyPlan, CopyReport};
use crate::util::fs::{check_readable_dir, normalize_path, remove_dir_all_if_exists, walk_files};

/// Resolve which recipe files the export pattern selects.
///
/// Paths under any of `skip` (the work directory) are never exported.
pub fn plan_export(
    descriptor: &PackageDescriptor,
    recipe_dir: &Path,
    staging_source: &Path,
    skip: &[PathBuf],
) -> Result<CopyPlan, PackError> {
    check_readable_dir(recipe_dir)?;

    let filters = descriptor
        .exports
        .iter()
        .map(|p| CopyFilter::new(p, true))
        .collect::<Result<Vec<_>, _>>()?;

    let root = normalize_path(recipe_dir);
    let skip: Vec<PathBuf> = skip.iter().map(|p| normalize_path(p)).collect();

    let mut entries = Vec::new();
    for path in walk_files(&root, &skip)? {
        let Ok(rel) = path.strip_prefix(&root) else {
            continue;
        };
        if filters.iter().any(|f| f.matches(rel)) {
            entries.push(CopyEntry {
                relative: rel.to_path_buf(),
                source: path,
            });
        }
    }

    if entries.is_empty() {
        tracing::warn!(
            "export pattern ({}) matched no files in {}",
            descriptor.exports.join(", "),
            recipe_dir.display()
        );
    }

    Ok(CopyPlan {
        source_root: recipe_dir.to_path_buf(),
        dest_root: staging_source.to_path_buf(),
        entries,
    })
}

/// Recreate `staging_source` holding exactly the exported files.
pub fn export_sources(
    descriptor: &PackageDescriptor,
    recipe_dir: &Path,
    staging_source: &Path,
    skip: &[PathBuf],
) -> Result<CopyReport, PackError> {
    let plan = plan_export(descriptor, recipe_dir, staging_source, skip)?;

    remove_dir_all_if_exists(staging_source)?;
    let report = plan.execute(|_| {})?;

    tracing::info!(
        "exported {} file(s) of {} to {}",
        report.files.len(),
        descriptor.metadata.reference(),
        staging_source.display()
    );
    Ok(report)
}
