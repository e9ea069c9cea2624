//! `headerpack init` command

use std::sync::Arc;

use anyhow::{Context, Result};

use crate::cli::InitArgs;
use headerpack::ops::{init_recipe, InitOptions};
use headerpack::util::shell::{Shell, Status};
use headerpack::util::GlobalContext;

pub fn execute(args: InitArgs, shell: &Arc<Shell>) -> Result<()> {
    let ctx = GlobalContext::new()?;
    let path = match args.path {
        Some(p) => ctx.cwd().join(p),
        None => ctx.cwd().to_path_buf(),
    };

    let name = match args.name {
        Some(name) => name,
        None => path
            .file_name()
            .and_then(|n| n.to_str())
            .map(str::to_string)
            .context("cannot infer a package name from the directory; pass --name")?,
    };

    let opts = InitOptions::new(&name).with_sample_header(!args.no_header);
    init_recipe(&path, &opts)?;

    shell.status(Status::Created, format!("recipe `{}` in {}", name, path.display()));
    shell.json_event(&serde_json::json!({
        "reason": "recipe-created",
        "name": name,
        "path": path,
    }));

    Ok(())
}
