//! purpose: Value types shared by the comment locator, the tag parser, the rewriter and the
//!     reassembler. Everything here is plain data derived from one file's text and dropped
//!     once that file has been converted.
//!
//! when-editing:
//!     - !DocLine fields must concatenate back to the exact physical line
//!     - !TagKind is a closed enum; adding a variant forces every match to be revisited
//!     - Tag stores its physical lines as the source of truth for output
//!
//! invariants:
//!     - CommentSpan.raw == text[start..end] and spans never overlap
//!     - type_expr is only set when the tag's rule reads_type()
//!     - param_name is only set for kinds where names_member() is true
//!
//! gotchas:
//!     - TypeExpr.range indexes into the tag's first line content, braces included
//!     - Opaque tags have no structured fields; description() is empty for them

use serde::Deserialize;
use std::ops::Range;

/// Text of one file plus the identifier used in diagnostics.
#[derive(Debug, Clone, Copy)]
pub struct SourceText<'a> {
    pub text: &'a str,
    pub id: &'a str,
}

impl<'a> SourceText<'a> {
    pub fn new(text: &'a str, id: &'a str) -> Self {
        Self { text, id }
    }

    /// 1-based line and column (in chars) of a byte offset.
    pub fn line_col(&self, offset: usize) -> (usize, usize) {
        let offset = offset.min(self.text.len());
        let before = &self.text[..offset];
        let line = before.matches('\n').count() + 1;
        let line_start = before.rfind('\n').map_or(0, |p| p + 1);
        let column = before[line_start..].chars().count() + 1;
        (line, column)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommentKind {
    /// `// ...`
    Line,
    /// `/* ... */`
    Block,
    /// `/** ... */`
    Doc,
}

/// One comment found in the source, in document order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommentSpan<'a> {
    pub start: usize,
    pub end: usize,
    pub raw: &'a str,
    pub kind: CommentKind,
}

impl CommentSpan<'_> {
    pub fn is_doc(&self) -> bool {
        self.kind == CommentKind::Doc
    }

    pub fn range(&self) -> Range<usize> {
        self.start..self.end
    }
}

/// One physical line of a documentation block body.
///
/// `margin` holds the leading whitespace, the `*` marker and one space after it;
/// `trailing` holds whitespace after the content; `eol` is the exact line terminator.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DocLine {
    pub margin: String,
    pub content: String,
    pub trailing: String,
    pub eol: String,
}

impl DocLine {
    pub fn write_to(&self, out: &mut String) {
        out.push_str(&self.margin);
        out.push_str(&self.content);
        out.push_str(&self.trailing);
        out.push_str(&self.eol);
    }
}

/// Tag kinds the rewriter knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TagKind {
    Param,
    Property,
    Returns,
    Type,
    Typedef,
    Template,
    Throws,
    Yields,
    Enum,
    This,
    Callback,
    FreeForm,
    Unknown,
}

impl TagKind {
    /// Whether the JSDoc form of this tag can carry a `{type}` right after the tag name.
    pub fn carries_type(self) -> bool {
        match self {
            TagKind::Param
            | TagKind::Property
            | TagKind::Returns
            | TagKind::Type
            | TagKind::Typedef
            | TagKind::Template
            | TagKind::Throws
            | TagKind::Yields
            | TagKind::Enum
            | TagKind::This => true,
            TagKind::Callback | TagKind::FreeForm | TagKind::Unknown => false,
        }
    }

    /// Whether the tag names a parameter, member or type parameter after the type.
    pub fn names_member(self) -> bool {
        match self {
            TagKind::Param
            | TagKind::Property
            | TagKind::Typedef
            | TagKind::Template
            | TagKind::Callback => true,
            TagKind::Returns
            | TagKind::Type
            | TagKind::Throws
            | TagKind::Yields
            | TagKind::Enum
            | TagKind::This
            | TagKind::FreeForm
            | TagKind::Unknown => false,
        }
    }
}

/// A `{...}` type expression found in a tag's first line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeExpr {
    /// Text between the braces.
    pub text: String,
    /// Byte range of the braced group within the first line's content.
    pub range: Range<usize>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TagBody {
    Structured {
        type_expr: Option<TypeExpr>,
        param_name: Option<String>,
        description: String,
    },
    /// Syntax we could not make sense of, kept verbatim.
    Opaque { raw: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tag {
    /// Tag name without the `@`.
    pub name: String,
    pub kind: TagKind,
    pub body: TagBody,
    /// Physical lines; the first one starts with `@name`.
    pub lines: Vec<DocLine>,
}

impl Tag {
    pub fn type_expr(&self) -> Option<&str> {
        match &self.body {
            TagBody::Structured {
                type_expr: Some(expr),
                ..
            } => Some(&expr.text),
            _ => None,
        }
    }

    pub fn param_name(&self) -> Option<&str> {
        match &self.body {
            TagBody::Structured { param_name, .. } => param_name.as_deref(),
            TagBody::Opaque { .. } => None,
        }
    }

    pub fn description(&self) -> &str {
        match &self.body {
            TagBody::Structured { description, .. } => description,
            TagBody::Opaque { .. } => "",
        }
    }

    pub fn is_opaque(&self) -> bool {
        matches!(self.body, TagBody::Opaque { .. })
    }

    /// True when the type expression is the only thing the tag says.
    pub fn is_bare(&self) -> bool {
        match &self.body {
            TagBody::Structured {
                param_name,
                description,
                ..
            } => param_name.is_none() && description.trim().is_empty(),
            TagBody::Opaque { .. } => false,
        }
    }

    /// Removes the `{type}` group from the first line, keeping one space between the
    /// tag name and whatever followed the type. Returns false when there was no type.
    pub fn remove_type_expr(&mut self) -> bool {
        let TagBody::Structured { type_expr, .. } = &mut self.body else {
            return false;
        };
        let Some(expr) = type_expr.take() else {
            return false;
        };
        let Some(first) = self.lines.first_mut() else {
            return true;
        };

        let before = &first.content[..expr.range.start];
        let after = first.content[expr.range.end..].trim_start();
        let content = if after.is_empty() {
            before.trim_end().to_string()
        } else if before.ends_with(char::is_whitespace) {
            format!("{}{}", before, after)
        } else {
            format!("{} {}", before, after)
        };
        first.content = content;
        true
    }
}

/// Parsed documentation comment.
///
/// `lead` is the rest of the `/**` line when that line carries no text (usually just the
/// line break); `tail` is the whitespace in front of `*/` when the closing line carries no
/// text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DocBlock {
    pub lead: String,
    pub intro: Vec<DocLine>,
    pub tags: Vec<Tag>,
    pub tail: String,
}

impl DocBlock {
    /// Free text in front of the first tag.
    pub fn description(&self) -> String {
        let lines: Vec<&str> = self.intro.iter().map(|l| l.content.as_str()).collect();
        lines.join("\n").trim().to_string()
    }

    /// Number of physical lines before the first tag, counting the `/**` line.
    pub fn lines_before_tags(&self) -> usize {
        usize::from(!self.lead.is_empty()) + self.intro.len()
    }
}
