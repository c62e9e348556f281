//! purpose: Library crate root for tsdocify, usable both as the CLI's backend and as a library
//!     that rewrites JSDoc comments into TSDoc.
//!
//! when-editing:
//!     - !All public modules must be declared here with pub mod
//!     - Keep the re-export list organized by module
//!
//! invariants:
//!     - The conversion core (parser, rewrite, formatter, types) never touches the filesystem
//!
//! gotchas:
//!     - lib.rs is separate from main.rs - library consumers get lib, CLI gets main

pub mod cli;
pub mod commands;
pub mod config;
pub mod exclusion;
pub mod formatter;
pub mod parser;
pub mod rewrite;
pub mod types;

pub use cli::{Cli, ConvertArgs};
pub use config::Config;
pub use parser::ParseError;
pub use rewrite::rules::{RewriteRule, RuleTable, TagRule};
pub use rewrite::{replace_jsdoc_with_tsdoc, Conversion, ConversionStats, Converter};
pub use types::{DocBlock, Tag, TagKind};
