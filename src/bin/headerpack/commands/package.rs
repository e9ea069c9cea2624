//! `headerpack package` command

use std::sync::Arc;

use anyhow::Result;

use crate::cli::PackageArgs;
use headerpack::ops::create_package;
use headerpack::util::fs::relative_path;
use headerpack::util::shell::{Shell, Status};
use headerpack::util::GlobalContext;

pub fn execute(args: PackageArgs, shell: &Arc<Shell>) -> Result<()> {
    let ctx = GlobalContext::new()?.with_manifest_path(args.recipe.manifest_path);
    let recipe = ctx.load_recipe()?;
    let mut opts = ctx
        .package_options(&recipe)
        .with_clean(args.clean)
        .with_dry_run(args.dry_run);
    if args.no_archive {
        opts = opts.with_archive(false);
    }

    let reference = recipe.descriptor.metadata.reference();
    let span = shell.span(Status::Packaging, &reference);
    let result = create_package(&recipe.descriptor, recipe.root(), &opts)?;
    let manifest = &result.manifest;

    if result.dry_run {
        for file in &manifest.files {
            shell.print(format!("{}  {}", file.path, file.size));
        }
        shell.note(format!(
            "dry run: {} file(s), package id {}",
            manifest.files.len(),
            manifest.package_id
        ));
    } else {
        shell.status(
            Status::Packaged,
            format!(
                "{} file(s) into {} ({} copied, {} unchanged)",
                manifest.files.len(),
                relative_path(ctx.cwd(), &result.package_dir).display(),
                result.copy.copied,
                result.copy.unchanged
            ),
        );
        if let Some(archive) = &result.archive {
            shell.status(
                Status::Archived,
                format!(
                    "{} ({} bytes)",
                    relative_path(ctx.cwd(), &archive.path).display(),
                    archive.size
                ),
            );
        }
    }

    shell.json_event(&serde_json::json!({
        "reason": "package-finished",
        "package": reference,
        "package_id": manifest.package_id,
        "package_dir": result.package_dir,
        "files": manifest.files,
        "generated": result.generated,
        "archive": result.archive.as_ref().map(|a| &a.path),
        "dry_run": result.dry_run,
    }));

    span.finish_with_message(format!("{} ({})", reference, manifest.package_id));
    Ok(())
}
