//! purpose: Parses tsdocify.toml. Holds batch exclusion patterns and the `[[tag]]` rows that
//!     extend or override the standard rewrite rule table.
//!
//! when-editing:
//!     - !Config is loaded once at startup and passed through the call chain
//!     - !Tag kinds and rules are kebab-case in TOML ("drop-type", "free-form")
//!
//! invariants:
//!     - Config::load returns the default config if tsdocify.toml doesn't exist
//!     - A broken config file is a warning, never a failure
//!     - Later `[[tag]]` rows win over earlier ones and over the standard table
//!
//! gotchas:
//!     - Tag names may be written with or without the leading `@`
//!     - A row with only `kind` gets that kind's default rule; a row with only `rule`
//!       keeps the kind the name already had (Unknown for new names). A non-keep rule
//!       makes the parser read the `{type}` slot whatever the kind

use crate::rewrite::rules::{RewriteRule, RuleTable, TagRule};
use crate::types::TagKind;
use serde::Deserialize;
use std::fs;
use std::path::Path;

pub const CONFIG_FILE: &str = "tsdocify.toml";

/// Main configuration structure matching tsdocify.toml
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    /// Exclusion patterns applied in batch mode
    pub exclude: Vec<String>,

    /// Rule table additions and overrides
    #[serde(rename = "tag")]
    pub tags: Vec<TagOverride>,
}

/// One `[[tag]]` row
#[derive(Debug, Deserialize, Clone)]
pub struct TagOverride {
    pub name: String,
    #[serde(default)]
    pub kind: Option<TagKind>,
    #[serde(default)]
    pub rule: Option<RewriteRule>,
}

impl Config {
    /// Load configuration from tsdocify.toml in the given root directory
    pub fn load(root: &Path) -> Self {
        let config_path = root.join(CONFIG_FILE);

        if !config_path.exists() {
            return Self::default();
        }

        match fs::read_to_string(&config_path) {
            Ok(content) => match toml::from_str(&content) {
                Ok(config) => config,
                Err(e) => {
                    log::warn!("Failed to parse {}: {}", config_path.display(), e);
                    Self::default()
                }
            },
            Err(e) => {
                log::warn!("Failed to read {}: {}", config_path.display(), e);
                Self::default()
            }
        }
    }

    /// Standard rule table with this config's `[[tag]]` rows applied in order
    pub fn rule_table(&self) -> RuleTable {
        let mut table = RuleTable::standard();
        for row in &self.tags {
            let name = row.name.trim_start_matches('@');
            if name.is_empty() {
                log::warn!("Ignoring [[tag]] entry with an empty name");
                continue;
            }
            let kind = row.kind.unwrap_or_else(|| table.lookup(name).kind);
            let rule = row.rule.unwrap_or_else(|| kind.default_rule());
            table.insert(name, TagRule { kind, rule });
        }
        table
    }
}
