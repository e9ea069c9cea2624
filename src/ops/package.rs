//! The packaging pipeline: export, copy actions, generators, manifest, archive.

use std::path::{Component, Path, PathBuf};

use crate::core::descriptor::PackageDescriptor;
use crate::core::errors::PackError;
use crate::core::manifest::{FileEntry, PackageManifest, MANIFEST_FILE};
use crate::ops::archive::{create_archive, ArchiveInfo, DEFAULT_COMPRESSION};
use crate::ops::copy::{package_filtered, CopyFilter, CopyReport};
use crate::ops::export::{export_sources, plan_export};
use crate::ops::generators::{render, write_generators};
use crate::util::fs::{ensure_dir, remove_dir_all_if_exists, to_slash, walk_files, write_string};
use crate::util::hash::{digest_file, sha256_bytes};

/// Options for a packaging run.
#[derive(Debug, Clone)]
pub struct PackageOptions {
    /// Work directory holding `source/`, `package/` and `dist/`
    pub work_dir: PathBuf,

    /// Produce the `.tar.gz` artifact
    pub archive: bool,

    /// Gzip level, 0-9
    pub compression: u32,

    /// Remove earlier outputs first, including archives
    pub clean: bool,

    /// Compute the manifest without writing anything
    pub dry_run: bool,
}

impl PackageOptions {
    pub fn new(work_dir: impl Into<PathBuf>) -> Self {
        PackageOptions {
            work_dir: work_dir.into(),
            archive: true,
            compression: DEFAULT_COMPRESSION,
            clean: false,
            dry_run: false,
        }
    }

    pub fn with_archive(mut self, archive: bool) -> Self {
        self.archive = archive;
        self
    }

    pub fn with_compression(mut self, level: u32) -> Self {
        self.compression = level;
        self
    }

    pub fn with_clean(mut self, clean: bool) -> Self {
        self.clean = clean;
        self
    }

    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Staging tree for exported sources.
    pub fn source_dir(&self) -> PathBuf {
        self.work_dir.join("source")
    }

    /// The package tree.
    pub fn package_dir(&self) -> PathBuf {
        self.work_dir.join("package")
    }

    /// Where archives are written.
    pub fn dist_dir(&self) -> PathBuf {
        self.work_dir.join("dist")
    }

    /// Delete `source/`, `package/` and `dist/`, leaving anything else in the
    /// work directory (such as `config.toml`) alone.
    ///
    /// Returns whether anything was removed.
    pub fn remove_outputs(&self) -> Result<bool, PackError> {
        let mut removed = false;
        for dir in [self.source_dir(), self.package_dir(), self.dist_dir()] {
            if dir.exists() {
                remove_dir_all_if_exists(&dir)?;
                removed = true;
            }
        }
        Ok(removed)
    }
}

/// Result of a packaging run.
#[derive(Debug, Clone)]
pub struct PackageResult {
    pub package_dir: PathBuf,

    pub manifest: PackageManifest,

    /// Files selected by the export pattern
    pub exported: usize,

    /// Combined report of every copy action
    pub copy: CopyReport,

    /// Package-relative paths of generator output
    pub generated: Vec<PathBuf>,

    pub archive: Option<ArchiveInfo>,

    pub dry_run: bool,
}

/// Run the whole pipeline for `descriptor`, whose export patterns are
/// relative to `recipe_dir`.
pub fn create_package(
    descriptor: &PackageDescriptor,
    recipe_dir: &Path,
    opts: &PackageOptions,
) -> Result<PackageResult, PackError> {
    if opts.dry_run {
        return plan_package(descriptor, recipe_dir, opts);
    }

    if opts.clean {
        opts.remove_outputs()?;
    }

    let source_dir = opts.source_dir();
    let package_dir = opts.package_dir();
    let skip = [opts.work_dir.clone()];

    let exported = export_sources(descriptor, recipe_dir, &source_dir, &skip)?;

    // Rebuilt every run so files dropped from the recipe don't linger.
    remove_dir_all_if_exists(&package_dir)?;
    ensure_dir(&package_dir)?;

    let mut copy = CopyReport::default();
    for rule in &descriptor.copy {
        let src = source_dir.join(clean_rel(&rule.src));
        let dst = package_dir.join(clean_rel(&rule.dst));

        if !src.exists() {
            // Exported nothing from an existing but empty directory.
            let recipe_src = recipe_dir.join(clean_rel(&rule.src));
            if recipe_src.is_dir() {
                ensure_dir(&dst)?;
                continue;
            }
            return Err(PackError::not_found("read copy source", recipe_src));
        }

        let filter = CopyFilter::from_rule(rule)?;
        let mut report = package_filtered(&src, &dst, &filter)?;
        let prefix = clean_rel(&rule.dst);
        report.files = report.files.into_iter().map(|f| prefix.join(f)).collect();
        copy.merge(report);
    }

    let generated = write_generators(descriptor, &package_dir)?;

    let mut files = Vec::new();
    for path in walk_files(&package_dir, &[])? {
        let rel = to_slash(path.strip_prefix(&package_dir).unwrap_or(&path));
        if rel == MANIFEST_FILE {
            continue;
        }
        let digest = digest_file(&path)?;
        files.push(FileEntry {
            path: rel,
            size: digest.size,
            sha256: digest.sha256,
        });
    }

    let manifest = PackageManifest::new(descriptor, files);
    write_string(&package_dir.join(MANIFEST_FILE), &manifest.to_json()?)?;

    let archive = if opts.archive {
        let output = opts.dist_dir().join(descriptor.metadata.archive_name());
        Some(create_archive(&package_dir, &output, opts.compression)?)
    } else {
        None
    };

    tracing::info!(
        "packaged {} ({}) with {} file(s)",
        descriptor.metadata.reference(),
        manifest.package_id,
        manifest.files.len()
    );

    Ok(PackageResult {
        package_dir,
        manifest,
        exported: exported.files.len(),
        copy,
        generated,
        archive,
        dry_run: false,
    })
}

/// Compute the manifest a real run would produce, reading only the recipe tree.
fn plan_package(
    descriptor: &PackageDescriptor,
    recipe_dir: &Path,
    opts: &PackageOptions,
) -> Result<PackageResult, PackError> {
    let export = plan_export(descriptor, recipe_dir, &opts.source_dir(), &[opts.work_dir.clone()])?;

    // package-relative path -> source file; later rules overwrite earlier ones
    let mut layout: Vec<(PathBuf, PathBuf)> = Vec::new();
    let mut copy = CopyReport::default();

    for rule in &descriptor.copy {
        let filter = CopyFilter::from_rule(rule)?;
        let src = clean_rel(&rule.src);
        let dst = clean_rel(&rule.dst);

        let selected: Vec<_> = export
            .entries
            .iter()
            .filter_map(|e| {
                let rel = e.relative.strip_prefix(&src).ok()?;
                filter.matches(rel).then(|| (dst.join(filter.target(rel)), e.source.clone()))
            })
            .collect();

        if selected.is_empty() && !recipe_dir.join(&src).is_dir() {
            return Err(PackError::not_found("read copy source", recipe_dir.join(&src)));
        }

        for (target, source) in selected {
            layout.retain(|(t, _)| t != &target);
            copy.files.push(target.clone());
            layout.push((target, source));
        }
    }

    let mut files = Vec::new();
    for (target, source) in &layout {
        let digest = digest_file(source)?;
        copy.bytes += digest.size;
        files.push(FileEntry {
            path: to_slash(target),
            size: digest.size,
            sha256: digest.sha256,
        });
    }

    let mut generated = Vec::new();
    for generator in &descriptor.generators {
        let file = render(*generator, descriptor);
        files.push(FileEntry {
            path: to_slash(&file.path),
            size: file.contents.len() as u64,
            sha256: sha256_bytes(file.contents.as_bytes()),
        });
        generated.push(file.path);
    }

    let manifest = PackageManifest::new(descriptor, files);
    tracing::info!(
        "[dry-run] would package {} with {} file(s)",
        descriptor.metadata.reference(),
        manifest.files.len()
    );

    Ok(PackageResult {
        package_dir: opts.package_dir(),
        manifest,
        exported: export.entries.len(),
        copy,
        generated,
        archive: None,
        dry_run: true,
    })
}

/// Relative path with `.` components dropped.
fn clean_rel(path: &str) -> PathBuf {
    Path::new(path)
        .components()
        .filter(|c| matches!(c, Component::Normal(_)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::descriptor::CopyRule;
    use crate::core::recipe::Recipe;
    use crate::ops::archive::list_archive;
    use crate::test_support::{qflags_project, read_tree};
    use std::fs;
    use tempfile::TempDir;

    fn setup() -> (TempDir, Recipe, PackageOptions) {
        let tmp = TempDir::new().unwrap();
        let recipe = Recipe::load(&qflags_project(tmp.path())).unwrap();
        let opts = PackageOptions::new(tmp.path().join(".headerpack"));
        (tmp, recipe, opts)
    }

    #[test]
    fn test_full_pipeline() {
        let (tmp, recipe, opts) = setup();

        let result = create_package(&recipe.descriptor, recipe.root(), &opts).unwrap();

        let pkg = &result.package_dir;
        assert_eq!(result.exported, 3);
        assert_eq!(result.copy.files.len(), 3);
        assert!(pkg.join("include/qflags/qflags.h").is_file());
        assert!(pkg.join("cmake/qflags-config.cmake").is_file());
        assert!(pkg.join(MANIFEST_FILE).is_file());
        assert!(!pkg.join("test_package").exists());
        assert!(!pkg.join("README.md").exists());

        assert_eq!(
            fs::read(pkg.join("include/qflags/qflags.h")).unwrap(),
            fs::read(tmp.path().join("include/qflags/qflags.h")).unwrap()
        );

        let archive = result.archive.unwrap();
        assert_eq!(archive.path, opts.dist_dir().join("qflags-0.1.tar.gz"));
        let entries = list_archive(&archive.path).unwrap();
        assert!(entries.contains(&"include/qflags/qflags.h".to_string()));
        assert!(entries.contains(&MANIFEST_FILE.to_string()));
    }

    #[test]
    fn test_manifest_lists_package_files() {
        let (_tmp, recipe, opts) = setup();
        let result = create_package(&recipe.descriptor, recipe.root(), &opts.with_archive(false))
            .unwrap();

        let paths: Vec<&str> = result.manifest.files.iter().map(|f| f.path.as_str()).collect();
        assert_eq!(
            paths,
            vec![
                "cmake/qflags-config.cmake",
                "include/qflags/detail/impl.hpp",
                "include/qflags/qflags.h",
                "include/qflags/version.h",
            ]
        );
        let on_disk = PackageManifest::load(&result.package_dir).unwrap();
        assert_eq!(on_disk, result.manifest);
    }

    #[test]
    fn test_rerun_is_identical() {
        let (_tmp, recipe, opts) = setup();

        let first = create_package(&recipe.descriptor, recipe.root(), &opts).unwrap();
        let tree = read_tree(&first.package_dir);
        let archive = fs::read(first.archive.as_ref().unwrap().path.clone()).unwrap();

        let second = create_package(&recipe.descriptor, recipe.root(), &opts).unwrap();

        assert_eq!(read_tree(&second.package_dir), tree);
        assert_eq!(second.manifest.package_id, first.manifest.package_id);
        assert_eq!(fs::read(second.archive.unwrap().path).unwrap(), archive);
    }

    #[test]
    fn test_removed_header_does_not_linger() {
        let (tmp, recipe, opts) = setup();
        create_package(&recipe.descriptor, recipe.root(), &opts).unwrap();

        fs::remove_file(tmp.path().join("include/qflags/version.h")).unwrap();
        let result = create_package(&recipe.descriptor, recipe.root(), &opts).unwrap();

        assert!(!result.package_dir.join("include/qflags/version.h").exists());
        assert!(result
            .manifest
            .files
            .iter()
            .all(|f| f.path != "include/qflags/version.h"));
    }

    #[test]
    fn test_dry_run_matches_real_run_and_writes_nothing() {
        let (_tmp, recipe, opts) = setup();

        let planned = create_package(
            &recipe.descriptor,
            recipe.root(),
            &opts.clone().with_dry_run(true),
        )
        .unwrap();
        assert!(planned.dry_run);
        assert!(!opts.work_dir.exists());

        let real = create_package(&recipe.descriptor, recipe.root(), &opts).unwrap();
        assert_eq!(planned.manifest, real.manifest);
    }

    #[test]
    fn test_flattened_copy_rule() {
        let (_tmp, mut recipe, opts) = setup();
        recipe.descriptor.copy.push(
            CopyRule::new("include", "detail")
                .with_pattern("*.hpp")
                .with_keep_path(false),
        );

        let planned = create_package(
            &recipe.descriptor,
            recipe.root(),
            &opts.clone().with_dry_run(true),
        )
        .unwrap();
        let result = create_package(&recipe.descriptor, recipe.root(), &opts).unwrap();

        assert!(result.package_dir.join("detail/impl.hpp").is_file());
        assert!(!result.package_dir.join("detail/qflags.h").exists());
        assert!(result.package_dir.join("include/qflags/detail/impl.hpp").is_file());
        assert_eq!(planned.manifest, result.manifest);
    }

    #[test]
    fn test_empty_include_dir_packages_empty_tree() {
        let tmp = TempDir::new().unwrap();
        fs::create_dir_all(tmp.path().join("include")).unwrap();
        let path = tmp.path().join("Headerpack.toml");
        fs::write(&path, "[package]\nname = \"empty\"\nversion = \"0.1\"\n").unwrap();
        let recipe = Recipe::load(&path).unwrap();
        let opts = PackageOptions::new(tmp.path().join(".headerpack")).with_archive(false);

        let result = create_package(&recipe.descriptor, recipe.root(), &opts).unwrap();

        assert!(result.package_dir.join("include").is_dir());
        assert!(result.manifest.files.is_empty());
    }

    #[test]
    fn test_missing_copy_source_fails() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("Headerpack.toml");
        fs::write(&path, "[package]\nname = \"nohdrs\"\nversion = \"0.1\"\n").unwrap();
        let recipe = Recipe::load(&path).unwrap();
        let opts = PackageOptions::new(tmp.path().join(".headerpack")).with_archive(false);

        let err = create_package(&recipe.descriptor, recipe.root(), &opts).unwrap_err();

        assert!(err.is_filesystem());
        assert_eq!(err.path(), Some(tmp.path().join("include").as_path()));
    }

    #[test]
    fn test_clean_removes_old_archives() {
        let (_tmp, mut recipe, opts) = setup();
        create_package(&recipe.descriptor, recipe.root(), &opts).unwrap();
        let old = opts.dist_dir().join("qflags-0.1.tar.gz");
        assert!(old.exists());

        recipe.descriptor.metadata.version = "last".parse().unwrap();
        create_package(&recipe.descriptor, recipe.root(), &opts.clone().with_clean(true)).unwrap();

        assert!(!old.exists());
        assert!(opts.dist_dir().join("qflags-last.tar.gz").exists());
    }

    #[test]
    fn test_remove_outputs_keeps_config() {
        let (_tmp, recipe, opts) = setup();
        let config = opts.work_dir.join("config.toml");
        std::fs::create_dir_all(&opts.work_dir).unwrap();
        std::fs::write(&config, "[package]\narchive = true\n").unwrap();
        create_package(&recipe.descriptor, recipe.root(), &opts).unwrap();

        assert!(opts.remove_outputs().unwrap());
        assert!(config.is_file());
        assert!(!opts.package_dir().exists());
        assert!(!opts.remove_outputs().unwrap());
    }
}
