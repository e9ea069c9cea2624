//! `headerpack copy` command: copy one tree into another.

use std::sync::Arc;

use anyhow::Result;

use crate::cli::CopyArgs;
use headerpack::ops::copy::{plan_copy, CopyFilter};
use headerpack::util::shell::{Shell, Status};
use headerpack::util::GlobalContext;

pub fn execute(args: CopyArgs, shell: &Arc<Shell>) -> Result<()> {
    let ctx = GlobalContext::new()?;
    let src = ctx.cwd().join(&args.src);
    let dst = ctx.cwd().join(&args.dst);

    // Without a pattern DST mirrors SRC; filtered copies only add files.
    let mirror = args.pattern.is_none() && !args.flatten;
    let filter = match (&args.pattern, args.flatten) {
        (None, false) => CopyFilter::all(),
        (pattern, flatten) => CopyFilter::new(pattern.as_deref().unwrap_or("*"), !flatten)?,
    };

    let plan = plan_copy(&src, &dst, &filter)?;

    let mut progress = shell.progress(plan.len() as u64, "Copying");
    let mut report = plan.execute(|rel| progress.tick(rel.display()))?;
    progress.finish();
    if mirror {
        report.removed = plan.prune()?;
    }

    shell.status(
        Status::Copied,
        format!(
            "{} file(s) to {} ({} unchanged, {} removed)",
            report.files.len(),
            dst.display(),
            report.unchanged,
            report.removed
        ),
    );
    shell.json_event(&serde_json::json!({
        "reason": "copy-finished",
        "source": src,
        "destination": dst,
        "files": report.files.len(),
        "copied": report.copied,
        "unchanged": report.unchanged,
        "removed": report.removed,
        "bytes": report.bytes,
    }));

    Ok(())
}
