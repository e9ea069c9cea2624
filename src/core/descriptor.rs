//! The package descriptor: metadata plus the export and copy actions.

use std::fmt;
use std::path::{Component, Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::core::errors::RecipeError;

/// Version markers that denote a moving "latest" channel instead of a release.
pub const LATEST_MARKERS: &[&str] = &["last", "latest"];

/// A package version, kept exactly as written in the recipe.
///
/// Either a fixed release (`"0.1"`) or a moving marker (`"last"`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PackageVersion(String);

impl PackageVersion {
    /// Parse and validate a version string.
    pub fn parse(s: &str) -> Result<Self, RecipeError> {
        let invalid = |reason: &str| RecipeError::InvalidVersion {
            version: s.to_string(),
            reason: reason.to_string(),
        };

        if s.is_empty() {
            return Err(invalid("version must not be empty"));
        }
        if s.chars().any(|c| c.is_whitespace() || c == '/' || c == '\\') {
            return Err(invalid("version must not contain whitespace or path separators"));
        }
        if s == "." || s == ".." {
            return Err(invalid("version must not be a relative path component"));
        }

        Ok(PackageVersion(s.to_string()))
    }

    /// The version exactly as written.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether this is a moving marker rather than a fixed release.
    pub fn is_latest(&self) -> bool {
        LATEST_MARKERS.contains(&self.0.as_str())
    }

    /// Lenient semver interpretation used for ordering.
    ///
    /// Partial versions are padded (`0.1` -> `0.1.0`), a leading `v` is
    /// dropped. Returns `None` for markers and non-numeric versions.
    pub fn to_semver(&self) -> Option<semver::Version> {
        if self.is_latest() {
            return None;
        }

        let trimmed = self.0.strip_prefix('v').unwrap_or(&self.0);
        if let Ok(v) = semver::Version::parse(trimmed) {
            return Some(v);
        }

        let (core, rest) = match trimmed.find(['-', '+']) {
            Some(idx) => trimmed.split_at(idx),
            None => (trimmed, ""),
        };
        let parts: Vec<&str> = core.split('.').collect();
        if parts.is_empty() || parts.len() > 3 {
            return None;
        }
        let mut padded = parts.join(".");
        for _ in parts.len()..3 {
            padded.push_str(".0");
        }
        semver::Version::parse(&format!("{}{}", padded, rest)).ok()
    }
}

impl fmt::Display for PackageVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for PackageVersion {
    type Err = RecipeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PackageVersion::parse(s)
    }
}

/// Descriptive metadata published for a package.
///
/// This is what lands in `headerpack.json` and in index entries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageMetadata {
    pub name: String,

    pub version: PackageVersion,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub license: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub authors: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub topics: Vec<String>,
}

impl PackageMetadata {
    /// Create metadata with only the required fields set.
    pub fn new(name: impl Into<String>, version: PackageVersion) -> Self {
        PackageMetadata {
            name: name.into(),
            version,
            license: None,
            url: None,
            description: None,
            authors: Vec::new(),
            topics: Vec::new(),
        }
    }

    pub fn with_license(mut self, license: impl Into<String>) -> Self {
        self.license = Some(license.into());
        self
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// `name/version` reference string.
    pub fn reference(&self) -> String {
        format!("{}/{}", self.name, self.version)
    }

    /// File name of the archive artifact.
    pub fn archive_name(&self) -> String {
        format!("{}-{}.tar.gz", self.name, self.version)
    }
}

/// Validate a package name.
///
/// 2 to 100 characters, ASCII alphanumerics plus `_ + . -`, starting with an
/// alphanumeric or `_`.
pub fn validate_name(name: &str) -> Result<(), RecipeError> {
    let invalid = |reason: &str| RecipeError::InvalidName {
        name: name.to_string(),
        reason: reason.to_string(),
    };

    let len = name.chars().count();
    if !(2..=100).contains(&len) {
        return Err(invalid("name must be between 2 and 100 characters"));
    }

    let first = name.chars().next().unwrap_or_default();
    if !(first.is_ascii_alphanumeric() || first == '_') {
        return Err(invalid("name must start with a letter, digit or `_`"));
    }

    if let Some(bad) = name
        .chars()
        .find(|c| !(c.is_ascii_alphanumeric() || matches!(c, '_' | '+' | '.' | '-')))
    {
        return Err(invalid(&format!("character `{}` is not allowed", bad)));
    }

    Ok(())
}

/// Consumer integration files emitted next to the headers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Generator {
    /// `cmake/<name>-config.cmake`
    Cmake,
    /// `lib/pkgconfig/<name>.pc`
    PkgConfig,
}

impl Generator {
    pub fn as_str(&self) -> &'static str {
        match self {
            Generator::Cmake => "cmake",
            Generator::PkgConfig => "pkg_config",
        }
    }
}

impl fmt::Display for Generator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Generator {
    type Err = RecipeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "cmake" => Ok(Generator::Cmake),
            "pkg_config" | "pkg-config" | "pkgconfig" => Ok(Generator::PkgConfig),
            _ => Err(RecipeError::UnknownGenerator { name: s.to_string() }),
        }
    }
}

/// A package action: copy files matching `pattern` from `src` to `dst`.
///
/// Both paths are relative to their staging roots.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CopyRule {
    #[serde(default = "default_pattern")]
    pub pattern: String,

    pub src: String,

    pub dst: String,

    /// Keep the path relative to `src`; when false, files land flat in `dst`.
    #[serde(default = "default_true")]
    pub keep_path: bool,
}

fn default_pattern() -> String {
    "*".to_string()
}

fn default_true() -> bool {
    true
}

impl CopyRule {
    /// Copy everything under `src` to `dst`.
    pub fn new(src: impl Into<String>, dst: impl Into<String>) -> Self {
        CopyRule {
            pattern: default_pattern(),
            src: src.into(),
            dst: dst.into(),
            keep_path: true,
        }
    }

    pub fn with_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.pattern = pattern.into();
        self
    }

    pub fn with_keep_path(mut self, keep_path: bool) -> Self {
        self.keep_path = keep_path;
        self
    }

    /// Copy `include/` to `include/`, the usual header layout.
    pub fn include_headers() -> Self {
        CopyRule::new("include", "include")
    }

    pub fn src_path(&self) -> &Path {
        Path::new(&self.src)
    }

    /// Check that `src`, `dst` and `pattern` are usable.
    pub fn validate(&self) -> Result<(), RecipeError> {
        check_relative(&self.src)?;
        check_relative(&self.dst)?;
        glob::Pattern::new(&self.pattern).map_err(|e| RecipeError::InvalidPattern {
            pattern: self.pattern.clone(),
            message: e.msg.to_string(),
        })?;
        Ok(())
    }
}

fn check_relative(path: &str) -> Result<(), RecipeError> {
    let p = Path::new(path);
    let ok = !p.is_absolute()
        && p.components()
            .all(|c| matches!(c, Component::Normal(_) | Component::CurDir));
    if ok {
        Ok(())
    } else {
        Err(RecipeError::InvalidCopyPath {
            path: path.to_string(),
        })
    }
}

/// Leading components of a glob pattern that contain no glob syntax.
///
/// `include/*` -> `include`, `*` -> empty.
pub fn literal_prefix(pattern: &str) -> PathBuf {
    Path::new(pattern)
        .components()
        .take_while(|c| {
            let s = c.as_os_str().to_string_lossy();
            !s.contains(['*', '?', '[', ']'])
        })
        .filter(|c| matches!(c, Component::Normal(_)))
        .collect()
}

/// Everything needed to stage one package.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PackageDescriptor {
    #[serde(flatten)]
    pub metadata: PackageMetadata,

    /// Export pattern: recipe-relative globs of files to bundle.
    pub exports: Vec<String>,

    /// Package actions, applied in order.
    pub copy: Vec<CopyRule>,

    pub generators: Vec<Generator>,
}

impl PackageDescriptor {
    /// Create a descriptor using the default export pattern and copy action.
    pub fn new(metadata: PackageMetadata) -> Self {
        PackageDescriptor {
            metadata,
            exports: default_exports(),
            copy: vec![CopyRule::include_headers()],
            generators: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.metadata.name
    }

    pub fn version(&self) -> &PackageVersion {
        &self.metadata.version
    }

    /// Distinct destination directories, in rule order.
    ///
    /// These are the include directories consumers add to their search path.
    pub fn include_dirs(&self) -> Vec<String> {
        let mut dirs: Vec<String> = Vec::new();
        for rule in &self.copy {
            let dst = normalize_rel(&rule.dst);
            if !dirs.contains(&dst) {
                dirs.push(dst);
            }
        }
        dirs
    }

    /// Validate every field and the export/copy coverage invariant.
    pub fn validate(&self) -> Result<(), RecipeError> {
        validate_name(&self.metadata.name)?;
        PackageVersion::parse(self.metadata.version.as_str())?;

        if let Some(url) = &self.metadata.url {
            url::Url::parse(url).map_err(|e| RecipeError::InvalidUrl {
                url: url.clone(),
                message: e.to_string(),
            })?;
        }

        for pattern in &self.exports {
            glob::Pattern::new(pattern).map_err(|e| RecipeError::InvalidPattern {
                pattern: pattern.clone(),
                message: e.msg.to_string(),
            })?;
        }

        for rule in &self.copy {
            rule.validate()?;
            if !self.is_covered(rule.src_path()) {
                return Err(RecipeError::UncoveredCopySource {
                    src: rule.src.clone(),
                    exports: self.exports.clone(),
                });
            }
        }

        Ok(())
    }

    /// Whether `src` falls inside the tree selected by some export pattern.
    fn is_covered(&self, src: &Path) -> bool {
        let src: PathBuf = src
            .components()
            .filter(|c| matches!(c, Component::Normal(_)))
            .collect();
        self.exports.iter().any(|pattern| {
            let prefix = literal_prefix(pattern);
            src.starts_with(&prefix) || prefix.starts_with(&src)
        })
    }
}

/// The export pattern used when a recipe doesn't declare one.
pub fn default_exports() -> Vec<String> {
    vec!["include/*".to_string()]
}

fn normalize_rel(path: &str) -> String {
    let normalized: PathBuf = Path::new(path)
        .components()
        .filter(|c| matches!(c, Component::Normal(_)))
        .collect();
    normalized.to_string_lossy().replace('\\', "/")
}
