//! Consumer smoke test: build the recipe's `test_package/` sources against
//! the package tree, the way a downstream project would use it.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Command;

use anyhow::{bail, Context, Result};

use crate::core::descriptor::PackageDescriptor;
use crate::core::manifest::MANIFEST_FILE;

/// Directory next to the recipe holding the consumer sources.
pub const TEST_PACKAGE_DIR: &str = "test_package";

const CXX_CANDIDATES: [&str; 3] = ["c++", "g++", "clang++"];

const SOURCE_EXTENSIONS: [&str; 3] = ["cpp", "cc", "cxx"];

/// Options for a test_package run.
#[derive(Debug, Clone)]
pub struct TestOptions {
    /// Compiler to use; searched for when unset
    pub compiler: Option<PathBuf>,

    /// Run the built program after compiling it
    pub run: bool,
}

impl Default for TestOptions {
    fn default() -> Self {
        TestOptions {
            compiler: None,
            run: true,
        }
    }
}

impl TestOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_compiler(mut self, compiler: Option<PathBuf>) -> Self {
        self.compiler = compiler;
        self
    }

    pub fn with_run(mut self, run: bool) -> Self {
        self.run = run;
        self
    }
}

/// How a test_package run ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TestOutcome {
    /// Nothing to build, or no compiler available
    Skipped { reason: String },

    Passed {
        compiler: PathBuf,
        sources: Vec<PathBuf>,
        ran: bool,
    },
}

/// Locate a C++ compiler from `$CXX` or the usual names on `$PATH`.
pub fn find_cxx_compiler() -> Option<PathBuf> {
    find_cxx_compiler_in(std::env::var_os("CXX"), std::env::var_os("PATH"))
}

/// `cxx` wins when set; otherwise the first of `c++`, `g++`, `clang++`
/// found on `path`.
pub fn find_cxx_compiler_in(cxx: Option<OsString>, path: Option<OsString>) -> Option<PathBuf> {
    if let Some(cxx) = cxx.filter(|c| !c.is_empty()) {
        return Some(PathBuf::from(cxx));
    }

    let path = path?;
    let cwd = std::env::current_dir().ok()?;
    CXX_CANDIDATES
        .iter()
        .find_map(|name| which::which_in(name, Some(&path), &cwd).ok())
}

/// C++ sources directly under `test_dir`, sorted.
pub fn test_sources(test_dir: &Path) -> Result<Vec<PathBuf>> {
    let entries = std::fs::read_dir(test_dir)
        .with_context(|| format!("failed to read {}", test_dir.display()))?;

    let mut sources = Vec::new();
    for entry in entries {
        let path = entry
            .with_context(|| format!("failed to read {}", test_dir.display()))?
            .path();
        let is_source = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| SOURCE_EXTENSIONS.contains(&e));
        if is_source && path.is_file() {
            sources.push(path);
        }
    }
    sources.sort();
    Ok(sources)
}

/// The compiler invocation: every source, one `-I` per package include dir.
pub fn compile_command(
    compiler: &Path,
    sources: &[PathBuf],
    package_dir: &Path,
    include_dirs: &[String],
    output: &Path,
) -> Command {
    let mut cmd = Command::new(compiler);
    for dir in include_dirs {
        let mut flag = OsString::from("-I");
        flag.push(package_dir.join(dir));
        cmd.arg(flag);
    }
    cmd.args(sources).arg("-o").arg(output);
    cmd
}

/// Build `<recipe_dir>/test_package/*.cpp` against `package_dir` and run it.
///
/// Skips, rather than fails, when there is nothing to build or no compiler
/// can be found. A missing package tree, a failed compile and a failing
/// program are errors.
pub fn test_package(
    descriptor: &PackageDescriptor,
    recipe_dir: &Path,
    package_dir: &Path,
    opts: &TestOptions,
) -> Result<TestOutcome> {
    let test_dir = recipe_dir.join(TEST_PACKAGE_DIR);
    if !test_dir.is_dir() {
        return Ok(TestOutcome::Skipped {
            reason: format!("no {}/ directory in {}", TEST_PACKAGE_DIR, recipe_dir.display()),
        });
    }

    let sources = test_sources(&test_dir)?;
    if sources.is_empty() {
        return Ok(TestOutcome::Skipped {
            reason: format!("no C++ sources in {}", test_dir.display()),
        });
    }

    if !package_dir.join(MANIFEST_FILE).is_file() {
        bail!(
            "no package tree at `{}`; run `headerpack package` first",
            package_dir.display()
        );
    }

    let Some(compiler) = opts.compiler.clone().or_else(find_cxx_compiler) else {
        return Ok(TestOutcome::Skipped {
            reason: "no C++ compiler found (set CXX or install c++, g++ or clang++)".to_string(),
        });
    };

    let build_dir = tempfile::TempDir::new().context("failed to create build directory")?;
    let program = build_dir.path().join(if cfg!(windows) {
        "test_package.exe"
    } else {
        "test_package"
    });

    let mut cmd = compile_command(
        &compiler,
        &sources,
        package_dir,
        &descriptor.include_dirs(),
        &program,
    );
    tracing::debug!("running test_package compile: {:?}", cmd);

    let output = cmd
        .output()
        .with_context(|| format!("failed to run compiler `{}`", compiler.display()))?;
    if !output.status.success() {
        bail!(
            "test_package compilation failed:\n{}\n{}",
            String::from_utf8_lossy(&output.stdout),
            String::from_utf8_lossy(&output.stderr)
        );
    }

    if opts.run {
        let output = Command::new(&program)
            .current_dir(&test_dir)
            .output()
            .context("failed to run test_package program")?;
        if !output.status.success() {
            bail!(
                "test_package program failed (exit code {:?}):\n{}\n{}",
                output.status.code(),
                String::from_utf8_lossy(&output.stdout),
                String::from_utf8_lossy(&output.stderr)
            );
        }
        tracing::debug!("test_package output:\n{}", String::from_utf8_lossy(&output.stdout));
    }

    tracing::info!(
        "test_package passed for {} ({} source(s))",
        descriptor.metadata.reference(),
        sources.len()
    );

    Ok(TestOutcome::Passed {
        compiler,
        sources,
        ran: opts.run,
    })
}
