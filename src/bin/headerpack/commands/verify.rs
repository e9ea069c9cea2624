//! `headerpack verify` command

use std::sync::Arc;

use anyhow::{bail, Result};

use crate::cli::VerifyArgs;
use headerpack::ops::verify_package;
use headerpack::util::shell::{Shell, Status};
use headerpack::util::GlobalContext;

pub fn execute(args: VerifyArgs, shell: &Arc<Shell>) -> Result<()> {
    let ctx = GlobalContext::new()?.with_manifest_path(args.recipe.manifest_path);
    let package_dir = match args.package_dir {
        Some(dir) => ctx.cwd().join(dir),
        None => {
            let recipe = ctx.load_recipe()?;
            ctx.package_options(&recipe).package_dir()
        }
    };

    let report = verify_package(&package_dir)?;

    shell.json_event(&serde_json::json!({
        "reason": "verify-finished",
        "ok": report.is_ok(),
        "report": report,
    }));

    if report.is_ok() {
        shell.status(
            Status::Verified,
            format!("{} ({} file(s))", report.reference, report.checked),
        );
        Ok(())
    } else {
        if !shell.is_json() {
            eprint!("{}", report.format());
        }
        bail!("package `{}` failed verification", package_dir.display())
    }
}
