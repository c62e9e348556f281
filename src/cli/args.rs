//! purpose: Command-line interface for tsdocify using the clap derive macros. There are no
//!     subcommands; the flags and up to two positionals describe one conversion run.
//!
//! when-editing:
//!     - !Positionals are collected raw; commands::convert::plan maps them onto input/output
//!     - !Global flags (root, verbose) live on Cli, conversion flags on ConvertArgs
//!
//! invariants:
//!     - PathBuf is used for all file path arguments, which also rejects empty values
//!     - --glob rejects an empty pattern at parse time
//!
//! gotchas:
//!     - "-" as input reads stdin
//!     - A third positional is a plan error ("Too many arguments"), not a clap error, so the
//!       message matches the other usage errors

use crate::exclusion::ExclusionConfig;
use clap::builder::NonEmptyStringValueParser;
use clap::{Args, Parser};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "tsdocify")]
#[command(author, version, about = "Rewrite JSDoc comments into TSDoc")]
pub struct Cli {
    /// Path to project root (defaults to current directory)
    #[arg(short, long)]
    pub root: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long)]
    pub verbose: bool,

    #[command(flatten)]
    pub convert: ConvertArgs,
}

#[derive(Args, Default, Clone)]
pub struct ConvertArgs {
    /// Input file, then output file
    #[arg(value_name = "PATH")]
    pub paths: Vec<PathBuf>,

    /// Rewrite files in place
    #[arg(short, long)]
    pub update_in_place: bool,

    /// Convert every file matching the pattern (requires --update-in-place)
    #[arg(short, long, value_name = "PATTERN", value_parser = NonEmptyStringValueParser::new())]
    pub glob: Option<String>,

    /// Input file, or a directory to walk ("-" reads stdin)
    #[arg(short = 'i', long = "in", value_name = "FILE")]
    pub input: Option<PathBuf>,

    /// Output file
    #[arg(short = 'o', long = "out", value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Exclude files matching glob pattern in batch mode (can be repeated)
    #[arg(long, value_name = "PATTERN")]
    pub exclude: Vec<String>,

    /// Don't respect .gitignore files
    #[arg(long)]
    pub no_gitignore: bool,

    /// Report what would change without writing anything
    #[arg(long)]
    pub dry_run: bool,
}

impl ConvertArgs {
    /// Create an ExclusionConfig from these options, merging with config file patterns
    pub fn exclusion_config(&self, config_patterns: &[String]) -> ExclusionConfig {
        let mut patterns = config_patterns.to_vec();
        patterns.extend(self.exclude.iter().cloned());
        ExclusionConfig {
            patterns,
            respect_gitignore: !self.no_gitignore,
        }
    }
}
