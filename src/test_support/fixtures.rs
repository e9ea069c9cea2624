//! Fixtures for header trees and recipe projects.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

/// Recipe for the qflags header-only library.
pub const QFLAGS_RECIPE: &str = r#"[package]
name = "qflags"
version = "0.1"
license = "MIT"
url = "https://github.com/AlErted/qflags"
description = "Simple cross-platform C++ command-line parsing library"
exports = ["include/*"]
generators = ["cmake"]

[[copy]]
pattern = "*"
src = "include"
dst = "include"
"#;

const QFLAGS_H: &str = r#"#pragma once

#include "detail/impl.hpp"

namespace qflags {
class command_line;
class parser;
}
"#;

/// Create `<root>/include` holding three qflags headers and return its path.
pub fn header_tree(root: &Path) -> PathBuf {
    let include = root.join("include");
    let detail = include.join("qflags").join("detail");
    fs::create_dir_all(&detail).unwrap();
    fs::write(include.join("qflags").join("qflags.h"), QFLAGS_H).unwrap();
    fs::write(
        include.join("qflags").join("version.h"),
        "#define QFLAGS_VERSION \"0.1\"\n",
    )
    .unwrap();
    fs::write(detail.join("impl.hpp"), "#pragma once\n// parser internals\n").unwrap();
    include
}

/// Create a qflags recipe project under `root` and return the recipe path.
///
/// Besides the headers, the project holds files outside the export pattern
/// that must never reach the package.
pub fn qflags_project(root: &Path) -> PathBuf {
    header_tree(root);
    let test_package = root.join("test_package");
    fs::create_dir_all(&test_package).unwrap();
    fs::write(
        test_package.join("example.cpp"),
        "#include <qflags/qflags.h>\nint main() { return 0; }\n",
    )
    .unwrap();
    fs::write(root.join("README.md"), "# qflags\n").unwrap();

    let recipe = root.join("Headerpack.toml");
    fs::write(&recipe, QFLAGS_RECIPE).unwrap();
    recipe
}

/// Every file under `root` keyed by `/`-separated relative path.
pub fn read_tree(root: &Path) -> BTreeMap<String, Vec<u8>> {
    let mut tree = BTreeMap::new();
    for entry in WalkDir::new(root) {
        let entry = entry.unwrap();
        if entry.file_type().is_file() {
            let rel = entry.path().strip_prefix(root).unwrap();
            let key = rel
                .components()
                .map(|c| c.as_os_str().to_string_lossy().into_owned())
                .collect::<Vec<_>>()
                .join("/");
            tree.insert(key, fs::read(entry.path()).unwrap());
        }
    }
    tree
}
