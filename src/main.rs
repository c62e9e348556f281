//! purpose: CLI entry point for tsdocify. Parses arguments with clap, sets up logging,
//!     determines the project root and hands off to the convert command.
//!
//! when-editing:
//!     - !The root directory defaults to current working directory if not specified
//!     - Error messages are printed to stderr and exit with code 1
//!
//! invariants:
//!     - The process exits with 0 on success, 1 on any error
//!     - RUST_LOG overrides the filter chosen from --verbose
//!
//! do-not:
//!     - Never add business logic here - delegate to command modules
//!     - Never panic - always use proper error handling

use anyhow::Context;
use clap::Parser;
use std::env;
use tsdocify::cli::Cli;
use tsdocify::commands::run_convert;

fn main() {
    if let Err(e) = run() {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let root = match cli.root {
        Some(root) => root,
        None => env::current_dir().context("Failed to get current directory")?,
    };

    run_convert(&cli.convert, &root, cli.verbose)
}

fn init_logging(verbose: bool) {
    let default_filter = if verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .format_timestamp(None)
        .format_target(false)
        .init();
}
