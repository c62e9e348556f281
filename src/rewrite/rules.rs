//! purpose: The data-driven rule table that decides, per tag name, which kind a tag is and
//!     what happens to its JSDoc type expression in the TSDoc output.
//!
//! when-editing:
//!     - !New tag names are table rows in STANDARD_RULES, not new code paths
//!     - !A new TagKind needs a default_rule arm; the compiler points at every other match
//!     - Configuration overrides go through RuleTable::insert
//!
//! invariants:
//!     - A tag without a type expression is always passed through, which makes rewriting
//!       idempotent
//!     - Rules never reorder tags
//!     - Unknown tag names resolve to Unknown/Keep
//!
//! gotchas:
//!     - @throws keeps its type: the thrown type is not visible in the code
//!     - @template drops its constraint by default because TypeScript expresses it as
//!       `<T extends ...>`; a config row with rule = "keep" restores it

use crate::types::{DocBlock, Tag, TagKind};
use serde::Deserialize;
use std::collections::HashMap;

/// What happens to a tag's type expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RewriteRule {
    /// Pass the tag through untouched.
    Keep,
    /// Remove `{type}` and keep name and description.
    DropType,
    /// Remove the whole tag when the type was all it had, otherwise act like DropType.
    DropTag,
}

impl RewriteRule {
    /// Maps one source tag to the tags that replace it.
    pub fn apply(self, mut tag: Tag) -> Vec<Tag> {
        if tag.type_expr().is_none() {
            return vec![tag];
        }
        match self {
            RewriteRule::Keep => vec![tag],
            RewriteRule::DropTag if tag.is_bare() => Vec::new(),
            RewriteRule::DropType | RewriteRule::DropTag => {
                tag.remove_type_expr();
                vec![tag]
            }
        }
    }
}

impl TagKind {
    pub fn default_rule(self) -> RewriteRule {
        match self {
            TagKind::Param
            | TagKind::Property
            | TagKind::Returns
            | TagKind::Typedef
            | TagKind::Template
            | TagKind::Yields => RewriteRule::DropType,
            TagKind::Type | TagKind::Enum | TagKind::This => RewriteRule::DropTag,
            TagKind::Throws | TagKind::Callback | TagKind::FreeForm | TagKind::Unknown => {
                RewriteRule::Keep
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TagRule {
    pub kind: TagKind,
    pub rule: RewriteRule,
}

impl TagRule {
    pub fn for_kind(kind: TagKind) -> Self {
        Self {
            kind,
            rule: kind.default_rule(),
        }
    }

    /// Whether the parser should look for a `{type}` slot after the tag name.
    /// A rule that drops types needs one even when the kind alone would not.
    pub fn reads_type(self) -> bool {
        self.kind.carries_type() || self.rule != RewriteRule::Keep
    }
}

const STANDARD_RULES: &[(&str, TagKind)] = &[
    ("param", TagKind::Param),
    ("arg", TagKind::Param),
    ("argument", TagKind::Param),
    ("property", TagKind::Property),
    ("prop", TagKind::Property),
    ("returns", TagKind::Returns),
    ("return", TagKind::Returns),
    ("yields", TagKind::Yields),
    ("yield", TagKind::Yields),
    ("template", TagKind::Template),
    ("typedef", TagKind::Typedef),
    ("type", TagKind::Type),
    ("enum", TagKind::Enum),
    ("this", TagKind::This),
    ("throws", TagKind::Throws),
    ("exception", TagKind::Throws),
    ("callback", TagKind::Callback),
    ("example", TagKind::FreeForm),
    ("remarks", TagKind::FreeForm),
    ("privateRemarks", TagKind::FreeForm),
    ("deprecated", TagKind::FreeForm),
    ("see", TagKind::FreeForm),
    ("since", TagKind::FreeForm),
    ("link", TagKind::FreeForm),
    ("default", TagKind::FreeForm),
    ("defaultValue", TagKind::FreeForm),
    ("internal", TagKind::FreeForm),
    ("public", TagKind::FreeForm),
    ("private", TagKind::FreeForm),
    ("protected", TagKind::FreeForm),
    ("readonly", TagKind::FreeForm),
    ("override", TagKind::FreeForm),
    ("virtual", TagKind::FreeForm),
    ("sealed", TagKind::FreeForm),
    ("alpha", TagKind::FreeForm),
    ("beta", TagKind::FreeForm),
    ("experimental", TagKind::FreeForm),
    ("packageDocumentation", TagKind::FreeForm),
    ("eventProperty", TagKind::FreeForm),
    ("inheritDoc", TagKind::FreeForm),
    ("label", TagKind::FreeForm),
    ("typeParam", TagKind::FreeForm),
    ("module", TagKind::FreeForm),
    ("author", TagKind::FreeForm),
    ("version", TagKind::FreeForm),
    ("license", TagKind::FreeForm),
    ("todo", TagKind::FreeForm),
    ("async", TagKind::FreeForm),
    ("abstract", TagKind::FreeForm),
    ("static", TagKind::FreeForm),
    ("const", TagKind::FreeForm),
    ("function", TagKind::FreeForm),
    ("class", TagKind::FreeForm),
    ("constructor", TagKind::FreeForm),
    ("namespace", TagKind::FreeForm),
    ("memberof", TagKind::FreeForm),
];

/// Tag name (without `@`) to rule lookup.
#[derive(Debug, Clone)]
pub struct RuleTable {
    entries: HashMap<String, TagRule>,
}

impl RuleTable {
    pub fn standard() -> Self {
        let entries = STANDARD_RULES
            .iter()
            .map(|(name, kind)| (name.to_string(), TagRule::for_kind(*kind)))
            .collect();
        Self { entries }
    }

    /// Add or replace the rule for a tag name.
    pub fn insert(&mut self, name: impl Into<String>, rule: TagRule) {
        self.entries.insert(name.into(), rule);
    }

    pub fn lookup(&self, name: &str) -> TagRule {
        self.entries
            .get(name)
            .copied()
            .unwrap_or_else(|| TagRule::for_kind(TagKind::Unknown))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for RuleTable {
    fn default() -> Self {
        Self::standard()
    }
}

/// Apply the table to every tag of a block, keeping tag order.
///
/// When the tag that shared a line with `*/` is dropped, its indentation becomes the
/// block tail so the closing delimiter stays aligned with the rest of the block.
pub fn rewrite_block(block: DocBlock, rules: &RuleTable) -> DocBlock {
    let DocBlock {
        lead,
        intro,
        tags,
        mut tail,
    } = block;
    let closing_indent = tags
        .last()
        .and_then(|tag| tag.lines.last())
        .filter(|line| line.eol.is_empty())
        .map(|line| {
            let indent = line.margin.len() - line.margin.trim_start().len();
            line.margin[..indent].to_string()
        });

    let tags: Vec<Tag> = tags
        .into_iter()
        .flat_map(|tag| rules.lookup(&tag.name).rule.apply(tag))
        .collect();

    let last_line = tags
        .last()
        .and_then(|tag| tag.lines.last())
        .or_else(|| intro.last());
    let ends_with_break = match last_line {
        Some(line) => !line.eol.is_empty(),
        None => lead.ends_with('\n'),
    };
    if let Some(indent) = closing_indent {
        if tail.is_empty() && ends_with_break {
            tail = indent;
        }
    }

    DocBlock {
        lead,
        intro,
        tags,
        tail,
    }
}
