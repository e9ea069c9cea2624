//! `headerpack list` command

use std::sync::Arc;

use anyhow::{bail, Result};

use crate::cli::ListArgs;
use headerpack::ops::index::{list, lookup, IndexEntry};
use headerpack::util::shell::Shell;
use headerpack::util::GlobalContext;

pub fn execute(args: ListArgs, shell: &Arc<Shell>) -> Result<()> {
    let ctx = GlobalContext::new()?;
    let index_dir = ctx.index_dir(args.index.as_deref(), None)?;

    let entries = match (&args.name, &args.version) {
        (Some(name), Some(version)) => match lookup(&index_dir, name, version)? {
            Some(entry) => vec![entry],
            None => bail!("`{}/{}` not found in {}", name, version, index_dir.display()),
        },
        (name, _) => list(&index_dir, name.as_deref())?,
    };

    if shell.is_json() {
        shell.json_event(&serde_json::to_value(&entries)?);
        return Ok(());
    }

    if entries.is_empty() {
        shell.note(format!("no packages in {}", index_dir.display()));
    }
    for entry in &entries {
        shell.print(format_entry(entry));
    }

    Ok(())
}

fn format_entry(entry: &IndexEntry) -> String {
    let meta = &entry.metadata;
    let mut line = format!("{} {}", meta.reference(), entry.package_id);
    if let Some(license) = &meta.license {
        line.push_str(&format!(" [{}]", license));
    }
    if let Some(description) = &meta.description {
        line.push_str(&format!(" - {}", description));
    }
    line
}
