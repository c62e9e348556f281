//! purpose: Splits one raw documentation comment into an intro and an ordered list of tags,
//!     recognising the JSDoc `{type}` and name slots for tag kinds that have them.
//!
//! when-editing:
//!     - !Every physical line must be kept exactly (margin, content, trailing, eol) so an
//!       unmodified block serialises back to the same bytes
//!     - !Malformed slots turn a single tag opaque; never fail the block
//!     - Tag rules come from the RuleTable, so parsing and rewriting agree on slots
//!
//! invariants:
//!     - Text before the first tag line is the intro; every later line belongs to a tag
//!     - Lines inside ``` fences never start a tag
//!     - `{@link ...}` directly after a tag name is inline markup, not a type
//!
//! gotchas:
//!     - A type expression that continues on the next line has no closing brace on the
//!       first line and therefore makes the tag opaque
//!     - The margin swallows one `*` and one space; deeper indentation stays in content

use crate::rewrite::rules::{RuleTable, TagRule};
use crate::types::{DocBlock, DocLine, Tag, TagBody, TypeExpr};

/// Unbalanced or mismatched brackets in a tag slot.
struct Malformed;

/// Parse a raw `/** ... */` comment.
pub fn parse_doc_block(raw: &str, rules: &RuleTable) -> DocBlock {
    let body = raw
        .strip_prefix("/**")
        .and_then(|b| b.strip_suffix("*/"))
        .unwrap_or(raw);

    let pieces: Vec<&str> = body.split_inclusive('\n').collect();
    let mut first = 0;
    let mut last = pieces.len();
    let mut block = DocBlock::default();

    if pieces.len() > 1 && pieces[0].trim().is_empty() {
        block.lead = pieces[0].to_string();
        first = 1;
    }
    if last > first && pieces[last - 1].trim().is_empty() && !pieces[last - 1].ends_with('\n') {
        block.tail = pieces[last - 1].to_string();
        last -= 1;
    }

    let mut in_fence = false;
    let mut current: Option<Vec<DocLine>> = None;

    for piece in &pieces[first..last] {
        let line = split_line(piece);
        let trimmed = line.content.trim_start();
        let starts_tag = !in_fence && is_tag_start(trimmed);
        if trimmed.starts_with("```") {
            in_fence = !in_fence;
        }

        if starts_tag {
            if let Some(lines) = current.take() {
                block.tags.push(parse_tag(lines, rules));
            }
            current = Some(vec![line]);
        } else if let Some(lines) = current.as_mut() {
            lines.push(line);
        } else {
            block.intro.push(line);
        }
    }
    if let Some(lines) = current {
        block.tags.push(parse_tag(lines, rules));
    }

    block
}

fn is_tag_start(trimmed: &str) -> bool {
    let mut chars = trimmed.chars();
    chars.next() == Some('@') && chars.next().is_some_and(|c| c.is_ascii_alphabetic())
}

fn split_line(piece: &str) -> DocLine {
    let (text, eol) = if let Some(text) = piece.strip_suffix("\r\n") {
        (text, "\r\n")
    } else if let Some(text) = piece.strip_suffix('\n') {
        (text, "\n")
    } else {
        (piece, "")
    };

    let mut margin_end = text.len() - text.trim_start_matches([' ', '\t']).len();
    if text[margin_end..].starts_with('*') {
        margin_end += 1;
        if text[margin_end..].starts_with(' ') {
            margin_end += 1;
        }
    }

    let rest = &text[margin_end..];
    let content = rest.trim_end_matches([' ', '\t']);
    DocLine {
        margin: text[..margin_end].to_string(),
        content: content.to_string(),
        trailing: rest[content.len()..].to_string(),
        eol: eol.to_string(),
    }
}

fn parse_tag(lines: Vec<DocLine>, rules: &RuleTable) -> Tag {
    let first = lines[0].content.as_str();
    let at = first.len() - first.trim_start().len();
    let name_start = at + 1;
    let name_len = first[name_start..]
        .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
        .unwrap_or(first.len() - name_start);
    let name_end = name_start + name_len;
    let name = first[name_start..name_end].to_string();
    let rule = rules.lookup(&name);

    let continuation = lines[1..]
        .iter()
        .map(|l| l.content.as_str())
        .collect::<Vec<_>>();

    let body = match parse_slots(first, name_end, rule) {
        Ok((type_expr, param_name, rest)) => {
            let mut description = rest.to_string();
            for line in &continuation {
                description.push('\n');
                description.push_str(line);
            }
            TagBody::Structured {
                type_expr,
                param_name,
                description,
            }
        }
        Err(Malformed) => {
            let mut raw = first[name_end..].to_string();
            for line in &continuation {
                raw.push('\n');
                raw.push_str(line);
            }
            TagBody::Opaque { raw }
        }
    };

    Tag {
        name,
        kind: rule.kind,
        body,
        lines,
    }
}

type Slots<'a> = (Option<TypeExpr>, Option<String>, &'a str);

/// Reads the optional type and name slots after the tag name and returns the rest of the line.
fn parse_slots(line: &str, mut cursor: usize, rule: TagRule) -> Result<Slots<'_>, Malformed> {
    let mut type_expr = None;
    if rule.reads_type() {
        let at = skip_whitespace(line, cursor);
        let rest = &line[at..];
        if rest.starts_with('{') && !rest[1..].starts_with('@') {
            let end = match_brackets(line, at)?;
            type_expr = Some(TypeExpr {
                text: line[at + 1..end - 1].to_string(),
                range: at..end,
            });
            cursor = end;
        }
    }

    let mut param_name = None;
    if rule.kind.names_member() {
        let at = skip_whitespace(line, cursor);
        let rest = &line[at..];
        let len = if rest.starts_with('[') {
            match_brackets(line, at)? - at
        } else {
            rest.find(|c: char| !is_name_char(c)).unwrap_or(rest.len())
        };
        if len > 0 {
            param_name = Some(line[at..at + len].to_string());
            cursor = at + len;
        }
    }

    Ok((type_expr, param_name, line[cursor..].trim_start()))
}

fn skip_whitespace(line: &str, from: usize) -> usize {
    from + (line[from..].len() - line[from..].trim_start().len())
}

fn is_name_char(c: char) -> bool {
    c.is_alphanumeric() || matches!(c, '_' | '$' | '.' | '[' | ']')
}

/// Returns the offset just past the bracket that closes the one at `open`.
fn match_brackets(line: &str, open: usize) -> Result<usize, Malformed> {
    let bytes = line.as_bytes();
    let mut stack: Vec<u8> = Vec::new();
    let mut i = open;
    while i < bytes.len() {
        match bytes[i] {
            b'{' => stack.push(b'}'),
            b'[' => stack.push(b']'),
            b'(' => stack.push(b')'),
            close @ (b'}' | b']' | b')') => {
                if stack.pop() != Some(close) {
                    return Err(Malformed);
                }
                if stack.is_empty() {
                    return Ok(i + 1);
                }
            }
            quote @ (b'\'' | b'"' | b'`') => {
                i += 1;
                while i < bytes.len() && bytes[i] != quote {
                    if bytes[i] == b'\\' {
                        i += 1;
                    }
                    i += 1;
                }
                if i >= bytes.len() {
                    return Err(Malformed);
                }
            }
            _ => {}
        }
        i += 1;
    }
    Err(Malformed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formatter::serialize;
    use crate::types::TagKind;
    use pretty_assertions::assert_eq;

    fn parse(raw: &str) -> DocBlock {
        parse_doc_block(raw, &RuleTable::standard())
    }

    #[test]
    fn test_single_line_param() {
        let block = parse("/** @param {string} name the value */");
        assert!(block.intro.is_empty());
        assert_eq!(block.tags.len(), 1);
        let tag = &block.tags[0];
        assert_eq!(tag.name, "param");
        assert_eq!(tag.kind, TagKind::Param);
        assert_eq!(tag.type_expr(), Some("string"));
        assert_eq!(tag.param_name(), Some("name"));
        assert_eq!(tag.description(), "the value");
        assert_eq!(tag.lines[0].margin, " ");
        assert_eq!(tag.lines[0].trailing, " ");
    }

    #[test]
    fn test_multiline_block() {
        let raw = "/**\n * Adds numbers.\n *\n * @param {number} a first\n *   operand\n * @returns {number} the sum\n */";
        let block = parse(raw);
        assert_eq!(block.lead, "\n");
        assert_eq!(block.tail, " ");
        assert_eq!(block.description(), "Adds numbers.");
        assert_eq!(block.intro.len(), 2);
        assert_eq!(block.tags.len(), 2);
        assert_eq!(block.tags[0].description(), "first\n  operand");
        assert_eq!(block.tags[0].lines.len(), 2);
        assert_eq!(block.tags[1].name, "returns");
        assert_eq!(block.tags[1].type_expr(), Some("number"));
        assert_eq!(block.tags[1].param_name(), None);
        assert_eq!(block.tags[1].description(), "the sum");
    }

    #[test]
    fn test_nested_type_expression() {
        let block = parse("/** @param {Array<{a: string, b: [number]}>} items the items */");
        let tag = &block.tags[0];
        assert_eq!(tag.type_expr(), Some("Array<{a: string, b: [number]}>"));
        assert_eq!(tag.param_name(), Some("items"));
    }

    #[test]
    fn test_type_with_braces_in_string_literal() {
        let block = parse("/** @param {'}' | '{'} brace which brace */");
        assert_eq!(block.tags[0].type_expr(), Some("'}' | '{'"));
        assert_eq!(block.tags[0].param_name(), Some("brace"));
    }

    #[test]
    fn test_optional_param_name() {
        let block = parse("/** @param {number} [count=1] how many */");
        let tag = &block.tags[0];
        assert_eq!(tag.param_name(), Some("[count=1]"));
        assert_eq!(tag.description(), "how many");
    }

    #[test]
    fn test_dotted_and_rest_names() {
        let block = parse("/**\n * @param {Object} opts\n * @param {string} opts.name n\n * @param {...number} nums rest\n */");
        assert_eq!(block.tags[1].param_name(), Some("opts.name"));
        assert_eq!(block.tags[2].type_expr(), Some("...number"));
        assert_eq!(block.tags[2].param_name(), Some("nums"));
    }

    #[test]
    fn test_unterminated_type_is_opaque() {
        let block = parse("/**\n * Intro.\n * @param {string name broken\n * @returns {number} ok\n */");
        assert_eq!(block.description(), "Intro.");
        assert!(block.tags[0].is_opaque());
        assert_eq!(
            block.tags[0].body,
            TagBody::Opaque {
                raw: " {string name broken".to_string()
            }
        );
        assert_eq!(block.tags[1].type_expr(), Some("number"));
    }

    #[test]
    fn test_mismatched_brackets_are_opaque() {
        let block = parse("/** @param {Array<string]} x */");
        assert!(block.tags[0].is_opaque());
    }

    #[test]
    fn test_inline_link_is_not_a_type() {
        let block = parse("/** @returns {@link Foo} the foo */");
        let tag = &block.tags[0];
        assert_eq!(tag.type_expr(), None);
        assert_eq!(tag.description(), "{@link Foo} the foo");
    }

    #[test]
    fn test_free_form_tags_have_no_slots() {
        let block = parse("/** @see {Foo} for details */");
        let tag = &block.tags[0];
        assert_eq!(tag.kind, TagKind::FreeForm);
        assert_eq!(tag.type_expr(), None);
        assert_eq!(tag.description(), "{Foo} for details");
    }

    #[test]
    fn test_template_without_type() {
        let block = parse("/** @template T the element type */");
        let tag = &block.tags[0];
        assert_eq!(tag.type_expr(), None);
        assert_eq!(tag.param_name(), Some("T"));
        assert_eq!(tag.description(), "the element type");
    }

    #[test]
    fn test_fenced_example_keeps_decorators() {
        let raw = "/**\n * @example\n * ```ts\n * @Component({})\n * class A {}\n * ```\n * @param {string} a x\n */";
        let block = parse(raw);
        let names: Vec<_> = block.tags.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["example", "param"]);
        assert_eq!(block.tags[0].lines.len(), 5);
    }

    #[test]
    fn test_email_like_text_is_not_a_tag() {
        let block = parse("/**\n * Contact me @ home or a@b.c\n * @1 not a tag\n */");
        assert!(block.tags.is_empty());
        assert_eq!(block.intro.len(), 2);
    }

    #[test]
    fn test_crlf_and_tabs_round_trip() {
        let raw = "/**\r\n\t * Desc  \r\n\t * @param {string} a\tthe a\r\n\t */";
        let block = parse(raw);
        assert_eq!(block.lead, "\r\n");
        assert_eq!(block.tail, "\t ");
        assert_eq!(block.intro[0].margin, "\t * ");
        assert_eq!(block.intro[0].trailing, "  ");
        assert_eq!(block.intro[0].eol, "\r\n");
        assert_eq!(serialize(&block), raw);
    }

    #[test]
    fn test_unmodified_blocks_serialize_verbatim() {
        let samples = [
            "/** */",
            "/** plain */",
            "/**\n * a\n*/",
            "/**\n   no stars here\n     indented\n*/",
            "/** @param {x} y z\n   continued */",
            "/**\n *\n * @deprecated\n *\n */",
            "/**\n\n */",
        ];
        for raw in samples {
            assert_eq!(serialize(&parse(raw)), raw);
        }
    }
}
