//! Implementation of `headerpack init`.

use std::fs;
use std::path::Path;

use anyhow::{bail, Context, Result};

use crate::core::descriptor::validate_name;
use crate::core::recipe::{generate_recipe, RECIPE_FILE};

/// Options for initializing a recipe.
#[derive(Debug, Clone)]
pub struct InitOptions {
    /// Package name
    pub name: String,

    /// Write a starter header under `include/<name>/`
    pub sample_header: bool,
}

impl InitOptions {
    pub fn new(name: impl Into<String>) -> Self {
        InitOptions {
            name: name.into(),
            sample_header: true,
        }
    }

    pub fn with_sample_header(mut self, sample_header: bool) -> Self {
        self.sample_header = sample_header;
        self
    }
}

/// Write a starter `Headerpack.toml` into `path`, creating it if needed.
///
/// Existing headers are left alone.
pub fn init_recipe(path: &Path, opts: &InitOptions) -> Result<()> {
    validate_name(&opts.name)?;

    let recipe_path = path.join(RECIPE_FILE);
    if recipe_path.exists() {
        bail!("`{}` already exists in `{}`", RECIPE_FILE, path.display());
    }

    fs::create_dir_all(path)
        .with_context(|| format!("failed to create directory: {}", path.display()))?;
    fs::write(&recipe_path, generate_recipe(&opts.name))
        .with_context(|| format!("failed to write {}", RECIPE_FILE))?;

    let include_dir = path.join("include").join(&opts.name);
    fs::create_dir_all(&include_dir).with_context(|| "failed to create include directory")?;

    let header = include_dir.join(format!("{}.h", opts.name));
    if opts.sample_header && !header.exists() {
        let guard = format!("{}_H", opts.name.to_uppercase().replace(['-', '.', '+'], "_"));
        fs::write(
            &header,
            format!("#ifndef {guard}\n#define {guard}\n\n#endif /* {guard} */\n"),
        )
        .with_context(|| format!("failed to write {}", header.display()))?;
    }

    let gitignore = path.join(".gitignore");
    if !gitignore.exists() {
        fs::write(&gitignore, "# headerpack work directory\n.headerpack/\n")?;
    }

    tracing::debug!("initialized recipe at {}", recipe_path.display());
    Ok(())
}
