//! `headerpack export` command

use std::sync::Arc;

use anyhow::Result;

use crate::cli::ExportArgs;
use headerpack::ops::export_sources;
use headerpack::util::shell::{Shell, Status};
use headerpack::util::GlobalContext;

pub fn execute(args: ExportArgs, shell: &Arc<Shell>) -> Result<()> {
    let ctx = GlobalContext::new()?.with_manifest_path(args.recipe.manifest_path);
    let recipe = ctx.load_recipe()?;
    let opts = ctx.package_options(&recipe);
    let desc = &recipe.descriptor;

    shell.status(Status::Exporting, desc.metadata.reference());
    let staging = opts.source_dir();
    let report = export_sources(desc, recipe.root(), &staging, &[opts.work_dir.clone()])?;

    shell.status(
        Status::Finished,
        format!("{} file(s) staged in {}", report.files.len(), staging.display()),
    );
    shell.json_event(&serde_json::json!({
        "reason": "export-finished",
        "package": desc.metadata.reference(),
        "staging": staging,
        "files": report.files,
    }));

    Ok(())
}
