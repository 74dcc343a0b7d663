//! Command dispatch and handler modules.

mod check;
mod plan;

use miette::Result;

use crate::cli::{Cli, Command};

/// Route a parsed CLI invocation to the appropriate command handler.
pub fn dispatch(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Plan {
            file,
            no_upgrades,
            json,
        } => plan::exec(&file, no_upgrades, json),
        Command::Check { file, no_upgrades } => check::exec(&file, no_upgrades),
    }
}
