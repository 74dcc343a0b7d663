//! Handler for `modplan plan`.

use std::io::Write;
use std::path::Path;

use miette::Result;
use serde::Serialize;

use modplan_resolver::{Action, Item};

use crate::error::CliError;
use crate::output;
use crate::plan_file::PlanFile;

/// One chain entry as printed by `--json`.
#[derive(Debug, Serialize)]
struct ChainEntry<'a> {
    name: &'a str,
    action: Action,
    from: Option<&'a str>,
    to: Option<&'a str>,
}

impl<'a> From<&'a Item> for ChainEntry<'a> {
    fn from(item: &'a Item) -> Self {
        Self {
            name: item.name(),
            action: item.action(),
            from: item.installed_version().map(|v| v.as_str()),
            to: match item.action() {
                Action::Remove => None,
                action => item.effective_version(action).map(|v| v.as_str()),
            },
        }
    }
}

pub fn exec(file: &Path, only_new_items: bool, json: bool) -> Result<()> {
    let resolver = PlanFile::load(file)?.into_resolver()?;
    tracing::debug!(path = %file.display(), items = resolver.len(), "loaded plan file");

    let chain = resolver.dependencies_chain_for_installation(only_new_items)?;
    let entries: Vec<ChainEntry<'_>> = chain.iter().map(ChainEntry::from).collect();

    let mut out = std::io::stdout().lock();

    if json {
        let rendered = serde_json::to_string_pretty(&entries)
            .map_err(|e| miette::miette!("Failed to render chain: {e}"))?;
        writeln!(out, "{rendered}").map_err(CliError::Io)?;
        return Ok(());
    }

    if entries.is_empty() {
        output::status("Resolved", "nothing to do");
        return Ok(());
    }

    for entry in &entries {
        let versions = match (entry.from, entry.to) {
            (Some(from), Some(to)) if from != to => format!("{from} -> {to}"),
            (_, Some(to)) => to.to_string(),
            (Some(from), None) => from.to_string(),
            (None, None) => String::new(),
        };
        writeln!(
            out,
            "{:>8} {} {versions}",
            output::action_style(entry.action).apply_to(entry.action),
            entry.name,
        )
        .map_err(CliError::Io)?;
    }
    output::status("Resolved", &format!("{} item(s) to process", entries.len()));
    Ok(())
}
