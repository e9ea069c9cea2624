//! `headerpack clean` command

use std::sync::Arc;

use anyhow::Result;

use crate::cli::CleanArgs;
use headerpack::util::shell::{Shell, Status};
use headerpack::util::GlobalContext;

pub fn execute(args: CleanArgs, shell: &Arc<Shell>) -> Result<()> {
    let ctx = GlobalContext::new()?.with_manifest_path(args.recipe.manifest_path);
    let recipe = ctx.load_recipe()?;
    let opts = ctx.package_options(&recipe);

    if opts.remove_outputs()? {
        shell.status(Status::Removed, format!("outputs in {}", opts.work_dir.display()));
    } else {
        shell.status(Status::Skipped, format!("nothing to clean in {}", opts.work_dir.display()));
    }

    Ok(())
}
