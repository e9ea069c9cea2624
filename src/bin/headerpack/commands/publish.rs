//! `headerpack publish` command

use std::sync::Arc;

use anyhow::{bail, Result};

use crate::cli::PublishArgs;
use headerpack::core::PackageManifest;
use headerpack::ops::publish;
use headerpack::util::shell::{Shell, Status};
use headerpack::util::GlobalContext;

pub fn execute(args: PublishArgs, shell: &Arc<Shell>) -> Result<()> {
    let ctx = GlobalContext::new()?.with_manifest_path(args.recipe.manifest_path);
    let recipe = ctx.load_recipe()?;
    let opts = ctx.package_options(&recipe);
    let index_dir = ctx.index_dir(args.index.as_deref(), Some(recipe.root()))?;

    let manifest = PackageManifest::load(&opts.package_dir())?;
    if manifest.metadata != recipe.descriptor.metadata {
        bail!(
            "package tree holds {} but the recipe describes {}; run `headerpack package` first",
            manifest.metadata.reference(),
            recipe.descriptor.metadata.reference()
        );
    }

    let archive = opts.dist_dir().join(manifest.metadata.archive_name());
    if !archive.is_file() {
        bail!(
            "archive `{}` not found; run `headerpack package` first",
            archive.display()
        );
    }

    let result = publish(&index_dir, &manifest, &archive)?;

    shell.status(
        Status::Published,
        format!(
            "{} to {}{}",
            manifest.metadata.reference(),
            index_dir.display(),
            if result.replaced { " (replaced)" } else { "" }
        ),
    );
    shell.json_event(&serde_json::json!({
        "reason": "published",
        "index": index_dir,
        "replaced": result.replaced,
        "entry": result.entry,
    }));

    Ok(())
}
