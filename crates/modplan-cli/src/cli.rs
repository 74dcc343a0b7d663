//! CLI argument definitions for modplan.
//!
//! Uses `clap` derive macros to define the command surface. Each command
//! corresponds to a handler in the [`super::commands`] module.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(
    name = "modplan",
    version,
    about = "Plan module install, upgrade and removal order",
    long_about = "modplan reads the components of an application and the actions requested \
                  on them from a TOML plan file, checks dependencies, versions and conflicts, \
                  and prints the order in which the installer should act."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Print the ordered chain of actions
    Plan {
        /// Plan file
        file: PathBuf,
        /// Only plan components that are not installed yet
        #[arg(long)]
        no_upgrades: bool,
        /// Print the chain as JSON
        #[arg(long)]
        json: bool,
    },

    /// Report every problem in a plan without stopping at the first one
    Check {
        /// Plan file
        file: PathBuf,
        /// Only plan components that are not installed yet
        #[arg(long)]
        no_upgrades: bool,
    },
}

pub fn parse() -> Cli {
    Cli::parse()
}
