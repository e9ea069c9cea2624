//! Consumer integration files written into the package tree.

use std::path::{Path, PathBuf};

use crate::core::descriptor::{Generator, PackageDescriptor};
use crate::core::errors::PackError;
use crate::util::fs::write_string;

/// A generated file: package-relative path and contents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedFile {
    pub path: PathBuf,
    pub contents: String,
}

/// Render the files for one generator.
pub fn render(generator: Generator, descriptor: &PackageDescriptor) -> GeneratedFile {
    match generator {
        Generator::Cmake => render_cmake(descriptor),
        Generator::PkgConfig => render_pkg_config(descriptor),
    }
}

fn render_cmake(descriptor: &PackageDescriptor) -> GeneratedFile {
    let name = descriptor.name();
    let var = cmake_var(name);
    let include_dirs = descriptor
        .include_dirs()
        .iter()
        .map(|d| format!("${{_{var}_PREFIX}}/{d}"))
        .collect::<Vec<_>>()
        .join(";");

    let contents = format!(
        r#"# Generated by headerpack for {reference}
get_filename_component(_{var}_PREFIX "${{CMAKE_CURRENT_LIST_DIR}}/.." ABSOLUTE)

if(NOT TARGET {name}::{name})
  add_library({name}::{name} INTERFACE IMPORTED)
  set_target_properties({name}::{name} PROPERTIES
    INTERFACE_INCLUDE_DIRECTORIES "{include_dirs}")
endif()

set({name}_VERSION "{version}")
set({name}_FOUND TRUE)
unset(_{var}_PREFIX)
"#,
        reference = descriptor.metadata.reference(),
        version = descriptor.version(),
    );

    GeneratedFile {
        path: Path::new("cmake").join(format!("{}-config.cmake", name)),
        contents,
    }
}

fn render_pkg_config(descriptor: &PackageDescriptor) -> GeneratedFile {
    let meta = &descriptor.metadata;
    let mut contents = String::from("prefix=${pcfiledir}/../..\n");
    let include_dirs = descriptor.include_dirs();
    for (i, dir) in include_dirs.iter().enumerate() {
        contents.push_str(&format!("includedir{}=${{prefix}}/{}\n", i, dir));
    }
    contents.push('\n');
    contents.push_str(&format!("Name: {}\n", meta.name));
    contents.push_str(&format!(
        "Description: {}\n",
        meta.description.as_deref().unwrap_or(&meta.name)
    ));
    contents.push_str(&format!("Version: {}\n", meta.version));
    if let Some(url) = &meta.url {
        contents.push_str(&format!("URL: {}\n", url));
    }
    let cflags = (0..include_dirs.len())
        .map(|i| format!("-I${{includedir{}}}", i))
        .collect::<Vec<_>>()
        .join(" ");
    contents.push_str(&format!("Cflags: {}\n", cflags));

    GeneratedFile {
        path: Path::new("lib")
            .join("pkgconfig")
            .join(format!("{}.pc", meta.name)),
        contents,
    }
}

/// CMake-safe variable fragment: uppercase, non-alphanumerics replaced by `_`.
fn cmake_var(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_uppercase()
            } else {
                '_'
            }
        })
        .collect()
}

/// Write every generator's output under `package_dir`.
///
/// Returns the package-relative paths written.
pub fn write_generators(
    descriptor: &PackageDescriptor,
    package_dir: &Path,
) -> Result<Vec<PathBuf>, PackError> {
    let mut written = Vec::new();
    for generator in &descriptor.generators {
        let file = render(*generator, descriptor);
        write_string(&package_dir.join(&file.path), &file.contents)?;
        tracing::debug!("generator {} wrote {}", generator, file.path.display());
        written.push(file.path);
    }
    Ok(written)
}
