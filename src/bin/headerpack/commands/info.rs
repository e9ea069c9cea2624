//! `headerpack info` command

use std::sync::Arc;

use anyhow::Result;

use crate::cli::InfoArgs;
use headerpack::util::shell::Shell;
use headerpack::util::GlobalContext;

pub fn execute(args: InfoArgs, shell: &Arc<Shell>) -> Result<()> {
    let ctx = GlobalContext::new()?.with_manifest_path(args.recipe.manifest_path);
    let recipe = ctx.load_recipe()?;
    let desc = &recipe.descriptor;
    let meta = &desc.metadata;

    if shell.is_json() {
        shell.json_event(&serde_json::to_value(desc)?);
        return Ok(());
    }

    shell.print(format!("name:        {}", meta.name));
    shell.print(format!("version:     {}", meta.version));
    if let Some(license) = &meta.license {
        shell.print(format!("license:     {}", license));
    }
    if let Some(url) = &meta.url {
        shell.print(format!("url:         {}", url));
    }
    if let Some(description) = &meta.description {
        shell.print(format!("description: {}", description));
    }
    shell.print(format!("exports:     {}", desc.exports.join(", ")));
    for rule in &desc.copy {
        shell.print(format!(
            "copy:        {} from {} to {}{}",
            rule.pattern,
            rule.src,
            rule.dst,
            if rule.keep_path { "" } else { " (flattened)" }
        ));
    }
    if !desc.generators.is_empty() {
        let names: Vec<&str> = desc.generators.iter().map(|g| g.as_str()).collect();
        shell.print(format!("generators:  {}", names.join(", ")));
    }
    shell.print(format!("recipe:      {}", recipe.path.display()));

    Ok(())
}
