//! purpose: The core entry point. Converter wires locator, tag parser, rule table, serializer
//!     and reassembler into one `(text, source_id) -> text` transform.
//!
//! when-editing:
//!     - !No process-wide state here; a Converter is shared by reference across threads
//!     - Blocks the rules leave unchanged keep their raw text and are not re-serialized
//!
//! invariants:
//!     - convert(convert(t)) == convert(t), unless a description left after a dropped type
//!       itself starts with `{`
//!     - Bytes outside documentation comments are never modified
//!     - On error no text is produced
//!
//! gotchas:
//!     - `@returns {Object} {x, y} pair` loses `{Object}` on the first pass and `{x, y}` on
//!       the second; a brace right after the tag name always reads as a type
//!
//! flows:
//!     - locate -> parse_doc_block -> rewrite_block -> serialize -> reassemble

pub mod reassemble;
pub mod rules;

use crate::formatter::serialize;
use crate::parser::{locate, parse_doc_block, ParseError};
use crate::types::{DocBlock, SourceText};
use reassemble::reassemble;
use rules::{rewrite_block, RuleTable};
use std::collections::HashMap;

/// Counters for one converted file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConversionStats {
    pub doc_blocks: usize,
    pub blocks_rewritten: usize,
    pub types_dropped: usize,
    pub tags_dropped: usize,
    pub opaque_tags: usize,
}

impl ConversionStats {
    pub fn changed(&self) -> bool {
        self.blocks_rewritten > 0
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Conversion {
    pub text: String,
    pub stats: ConversionStats,
}

#[derive(Debug, Clone, Default)]
pub struct Converter {
    rules: RuleTable,
}

impl Converter {
    pub fn new(rules: RuleTable) -> Self {
        Self { rules }
    }

    pub fn rules(&self) -> &RuleTable {
        &self.rules
    }

    /// Rewrite every JSDoc comment in `text` into TSDoc form.
    pub fn convert(&self, text: &str, source_id: &str) -> Result<Conversion, ParseError> {
        let source = SourceText::new(text, source_id);
        let spans = locate(&source)?;

        let mut stats = ConversionStats::default();
        let mut rewritten = HashMap::new();

        for span in spans.iter().filter(|s| s.is_doc()) {
            stats.doc_blocks += 1;
            let block = parse_doc_block(span.raw, &self.rules);
            report_opaque(&source, span.start, &block);
            stats.opaque_tags += block.tags.iter().filter(|t| t.is_opaque()).count();

            let output = rewrite_block(block.clone(), &self.rules);
            if output == block {
                continue;
            }

            stats.blocks_rewritten += 1;
            stats.types_dropped += typed_tags(&block).saturating_sub(typed_tags(&output));
            stats.tags_dropped += block.tags.len().saturating_sub(output.tags.len());
            rewritten.insert(span.start, serialize(&output));
        }

        let text = if rewritten.is_empty() {
            text.to_string()
        } else {
            reassemble(text, &spans, &rewritten).text
        };
        Ok(Conversion { text, stats })
    }
}

fn typed_tags(block: &DocBlock) -> usize {
    block
        .tags
        .iter()
        .filter(|t| t.type_expr().is_some())
        .count()
}

fn report_opaque(source: &SourceText<'_>, span_start: usize, block: &DocBlock) {
    let (first_line, _) = source.line_col(span_start);
    let mut line = first_line + block.lines_before_tags();
    for tag in &block.tags {
        if tag.is_opaque() {
            log::debug!(
                "{}:{}: kept @{} unchanged, its type or name could not be parsed",
                source.id,
                line,
                tag.name
            );
        }
        line += tag.lines.len();
    }
}

/// Convert with the standard rule table.
pub fn replace_jsdoc_with_tsdoc(text: &str, source_id: &str) -> Result<String, ParseError> {
    Converter::default()
        .convert(text, source_id)
        .map(|conversion| conversion.text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rewrite::rules::{RewriteRule, TagRule};
    use crate::types::TagKind;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    fn convert(text: &str) -> String {
        replace_jsdoc_with_tsdoc(text, "test.ts").unwrap()
    }

    #[test]
    fn test_param_scenario() {
        assert_eq!(
            convert("/** @param {string} name the value */\nfunction f(name) {}\n"),
            "/** @param name the value */\nfunction f(name) {}\n"
        );
    }

    #[test]
    fn test_returns_scenario() {
        let src = "/**\n * Counts things.\n * @returns {number} the count\n */\nexport function count(): number { return 0; }\n";
        let expected = "/**\n * Counts things.\n * @returns the count\n */\nexport function count(): number { return 0; }\n";
        assert_eq!(convert(src), expected);
    }

    #[test]
    fn test_type_only_block_collapses() {
        let src = "// note\n/** @type {Foo} */\nlet foo;\n";
        assert_eq!(convert(src), "// note\n/** */\nlet foo;\n");
    }

    #[test]
    fn test_comment_openers_in_code_are_ignored() {
        let src = concat!(
            "const s = '/** @param {x} y */';\n",
            "const t = `${a /** @param {q} r */}`;\n",
            "const r = /\\/\\*\\* @param {z} w/;\n",
            "/** @param {number} n count */\n",
        );
        let expected = concat!(
            "const s = '/** @param {x} y */';\n",
            "const t = `${a /** @param r */}`;\n",
            "const r = /\\/\\*\\* @param {z} w/;\n",
            "/** @param n count */\n",
        );
        assert_eq!(convert(src), expected);
    }

    #[test]
    fn test_unterminated_comment_is_an_error() {
        let err = Converter::default()
            .convert("let a;\n  /** @param {x} y", "broken.js")
            .unwrap_err();
        assert_eq!(
            err,
            ParseError::UnterminatedComment {
                source_id: "broken.js".to_string(),
                offset: 9,
                line: 2,
                column: 3,
            }
        );
    }

    #[test]
    fn test_stats() {
        let src = concat!(
            "/**\n * Sum.\n * @param {number} a first\n * @param {number} b second\n * @returns {number}\n */\n",
            "/** Nothing to do. */\n",
            "/** @type {Foo} */\n",
            "/** @param {string oops */\n",
            "/* @param {x} y */\n",
        );
        let conversion = Converter::default().convert(src, "stats.ts").unwrap();
        assert_eq!(
            conversion.stats,
            ConversionStats {
                doc_blocks: 4,
                blocks_rewritten: 2,
                types_dropped: 4,
                tags_dropped: 1,
                opaque_tags: 1,
            }
        );
        assert!(conversion.stats.changed());
        assert!(conversion.text.ends_with("/** */\n/** @param {string oops */\n/* @param {x} y */\n"));
    }

    #[test]
    fn test_unchanged_file_is_returned_as_is() {
        let src = "/**\r\n * Already TSDoc.\r\n * @param name the value\r\n */\r\nfoo();";
        let conversion = Converter::default().convert(src, "a.ts").unwrap();
        assert_eq!(conversion.text, src);
        assert!(!conversion.stats.changed());
    }

    #[test]
    fn test_custom_rules() {
        let mut rules = RuleTable::standard();
        rules.insert(
            "template",
            TagRule {
                kind: TagKind::Template,
                rule: RewriteRule::Keep,
            },
        );
        rules.insert("input", TagRule::for_kind(TagKind::Param));
        let converter = Converter::new(rules);
        let src = "/**\n * @template {object} T\n * @input {T} value the value\n */";
        let out = converter.convert(src, "c.ts").unwrap().text;
        assert_eq!(out, "/**\n * @template {object} T\n * @input value the value\n */");
        assert_eq!(converter.rules().lookup("input").kind, TagKind::Param);
    }

    #[test]
    fn test_converter_is_shareable() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Converter>();
    }

    #[test]
    fn test_brace_led_description_is_read_as_type_again() {
        let once = convert("/** @returns {Object} {x, y} pair */");
        assert_eq!(once, "/** @returns {x, y} pair */");
        assert_eq!(convert(&once), "/** @returns pair */");
    }

    fn fragment() -> impl Strategy<Value = String> {
        prop_oneof![
            Just("let x = a / b / c;".to_string()),
            Just("const re = /[/*]+/g;".to_string()),
            Just("const s = \"/** @param {a} b */\";".to_string()),
            Just("const t = `x ${ {a: 1}.a } /* y */`;".to_string()),
            Just("// @param {string} line comment".to_string()),
            Just("/* @returns {number} block */".to_string()),
            Just("/**/".to_string()),
            Just("/***** banner *****/".to_string()),
            Just("/** @see {@link Foo} */".to_string()),
            Just("/** @param {string name broken */".to_string()),
            Just("/**\r\n * @param {Array<{a: number}>} items list\r\n */".to_string()),
            Just("/** @type {Foo} */".to_string()),
            "[a-z]{1,8}".prop_map(|id| format!("function {id}() {{ return {id}; }}")),
            ("[a-z]{1,6}", "[A-Z][a-z]{0,5}", "[a-z ]{0,12}").prop_map(|(name, ty, desc)| {
                format!("/**\n * Doc.\n * @param {{{ty}}} {name} {desc}\n * @returns {{{ty}}} {desc}\n */")
            }),
        ]
    }

    fn is_doc_fragment(fragment: &str) -> bool {
        fragment.starts_with("/**") && !fragment.starts_with("/**/") && !fragment.starts_with("/***")
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        #[test]
        fn prop_idempotent(fragments in prop::collection::vec(fragment(), 0..12)) {
            let src = fragments.join("\n");
            let once = convert(&src);
            let twice = convert(&once);
            prop_assert_eq!(once, twice);
        }

        #[test]
        fn prop_non_doc_text_preserved(fragments in prop::collection::vec(fragment(), 0..12)) {
            let src = fragments.join("\n");
            let expected: Vec<String> = fragments
                .iter()
                .map(|f| if is_doc_fragment(f) { convert(f) } else { f.clone() })
                .collect();
            prop_assert_eq!(convert(&src), expected.join("\n"));
        }
    }
}
