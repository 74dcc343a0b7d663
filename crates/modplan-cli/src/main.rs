//! modplan CLI binary.
//!
//! Entry point for the `modplan` command-line tool. It initializes logging
//! via `tracing`, parses arguments with `clap`, and dispatches to the
//! appropriate command handler.

mod cli;
mod commands;
mod error;
mod output;
mod plan_file;

use miette::Result;
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    let args = cli::parse();

    let default_level = if args.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    commands::dispatch(args)
}
