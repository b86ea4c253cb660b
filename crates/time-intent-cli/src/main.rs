//! Binary crate for the `time-intent` command-line tool.
//!
//! Parses a phrase like "week of May 12" or "Jun–Sep" and prints the
//! normalized time window, the concrete query range it implies, and the
//! climatology history window.

use std::process::ExitCode;

use clap::Parser;

mod cli;

fn main() -> anyhow::Result<ExitCode> {
    let cmd = cli::Cli::parse();
    cmd.init_tracing();
    cmd.run()
}
