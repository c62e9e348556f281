//! purpose: Finds every comment in JavaScript/TypeScript source text in one left-to-right
//!     pass and classifies it as a line comment, a plain block comment or a documentation
//!     comment.
//!
//! when-editing:
//!     - !Every construct that can hide a comment opener must be skipped: strings, template
//!       literals (including nested ${} code), and regular expression literals
//!     - !Comments are transparent for the regex heuristic; never update `prev` for them
//!     - All delimiters are ASCII so byte indexing never splits a UTF-8 sequence
//!
//! invariants:
//!     - Spans come out sorted, non-overlapping and non-empty
//!     - Only an unclosed block comment is an error; unterminated strings end at the line
//!       break and unterminated templates at the end of the text
//!
//! gotchas:
//!     - `/**/` and `/***` banners are plain block comments, not documentation
//!     - Whether `/` starts a regex depends on the previous significant token; after `)`,
//!       `]`, `}`, a literal or an identifier it is division unless the identifier is a
//!       keyword such as `return`
//!     - JSX text is scanned as code; an apostrophe there only swallows the rest of its line
//!
//! flows:
//!     - Code: dispatch on the current byte
//!     - Template: scan to the closing backtick or into a `${` interpolation frame
//!     - Interpolation: code again until the matching `}` pops back into the template

use crate::parser::ParseError;
use crate::types::{CommentKind, CommentSpan, SourceText};

/// Keywords after which a `/` starts a regular expression.
const REGEX_KEYWORDS: &[&str] = &[
    "return",
    "typeof",
    "instanceof",
    "in",
    "of",
    "new",
    "delete",
    "void",
    "throw",
    "case",
    "do",
    "else",
    "yield",
    "await",
];

/// Find all comments in `source`, in document order.
pub fn locate<'a>(source: &SourceText<'a>) -> Result<Vec<CommentSpan<'a>>, ParseError> {
    Scanner::new(*source).run()
}

enum Frame {
    Template,
    Interpolation { depth: usize },
}

struct Scanner<'a> {
    source: SourceText<'a>,
    bytes: &'a [u8],
    pos: usize,
    /// Index of the last significant code byte.
    prev: Option<usize>,
    frames: Vec<Frame>,
    spans: Vec<CommentSpan<'a>>,
}

impl<'a> Scanner<'a> {
    fn new(source: SourceText<'a>) -> Self {
        Self {
            source,
            bytes: source.text.as_bytes(),
            pos: 0,
            prev: None,
            frames: Vec::new(),
            spans: Vec::new(),
        }
    }

    fn run(mut self) -> Result<Vec<CommentSpan<'a>>, ParseError> {
        if self.source.text.starts_with("#!") {
            self.pos = self.line_end(0);
        }

        while self.pos < self.bytes.len() {
            if matches!(self.frames.last(), Some(Frame::Template)) {
                self.template_chunk();
                continue;
            }

            let b = self.bytes[self.pos];
            match b {
                b'/' => match self.peek(1) {
                    Some(b'/') => self.line_comment(),
                    Some(b'*') => self.block_comment()?,
                    _ if self.regex_allowed() => self.regex_literal(),
                    _ => self.significant(),
                },
                b'\'' | b'"' => self.string_literal(b),
                b'`' => {
                    self.frames.push(Frame::Template);
                    self.pos += 1;
                }
                b'{' => {
                    if let Some(Frame::Interpolation { depth }) = self.frames.last_mut() {
                        *depth += 1;
                    }
                    self.significant();
                }
                b'}' => match self.frames.last_mut() {
                    Some(Frame::Interpolation { depth: 0 }) => {
                        self.frames.pop();
                        self.pos += 1;
                    }
                    Some(Frame::Interpolation { depth }) => {
                        *depth -= 1;
                        self.significant();
                    }
                    _ => self.significant(),
                },
                b if b.is_ascii_whitespace() => self.pos += 1,
                _ => self.significant(),
            }
        }

        Ok(self.spans)
    }

    fn peek(&self, ahead: usize) -> Option<u8> {
        self.bytes.get(self.pos + ahead).copied()
    }

    fn significant(&mut self) {
        self.prev = Some(self.pos);
        self.pos += 1;
    }

    /// Offset of the first line terminator at or after `from`, or the end of the text.
    fn line_end(&self, from: usize) -> usize {
        self.bytes[from..]
            .iter()
            .position(|&b| b == b'\n' || b == b'\r')
            .map_or(self.bytes.len(), |p| from + p)
    }

    fn push_span(&mut self, start: usize, end: usize, kind: CommentKind) {
        let text = self.source.text;
        self.spans.push(CommentSpan {
            start,
            end,
            raw: &text[start..end],
            kind,
        });
    }

    fn line_comment(&mut self) {
        let start = self.pos;
        let end = self.line_end(start);
        self.push_span(start, end, CommentKind::Line);
        self.pos = end;
    }

    fn block_comment(&mut self) -> Result<(), ParseError> {
        let start = self.pos;
        let Some(close) = self.source.text[start + 2..].find("*/") else {
            let (line, column) = self.source.line_col(start);
            return Err(ParseError::UnterminatedComment {
                source_id: self.source.id.to_string(),
                offset: start,
                line,
                column,
            });
        };
        let end = start + 2 + close + 2;

        let is_doc = self.peek(2) == Some(b'*') && !matches!(self.peek(3), Some(b'*' | b'/'));
        let kind = if is_doc {
            CommentKind::Doc
        } else {
            CommentKind::Block
        };
        self.push_span(start, end, kind);
        self.pos = end;
        Ok(())
    }

    fn string_literal(&mut self, quote: u8) {
        let start = self.pos;
        self.pos += 1;
        while self.pos < self.bytes.len() {
            match self.bytes[self.pos] {
                b'\\' => self.pos += 2,
                b'\n' | b'\r' => break,
                b if b == quote => {
                    self.pos += 1;
                    break;
                }
                _ => self.pos += 1,
            }
        }
        self.pos = self.pos.min(self.bytes.len());
        self.prev = Some(start);
    }

    fn template_chunk(&mut self) {
        while self.pos < self.bytes.len() {
            match self.bytes[self.pos] {
                b'\\' => self.pos += 2,
                b'`' => {
                    self.frames.pop();
                    self.prev = Some(self.pos);
                    self.pos += 1;
                    return;
                }
                b'$' if self.peek(1) == Some(b'{') => {
                    self.frames.push(Frame::Interpolation { depth: 0 });
                    self.prev = Some(self.pos + 1);
                    self.pos += 2;
                    return;
                }
                _ => self.pos += 1,
            }
        }
        self.pos = self.pos.min(self.bytes.len());
    }

    fn regex_allowed(&self) -> bool {
        let Some(prev) = self.prev else {
            return true;
        };
        let b = self.bytes[prev];
        if is_word_byte(b) {
            let text = &self.source.text[..=prev];
            let word_start = text
                .bytes()
                .rposition(|c| !is_word_byte(c))
                .map_or(0, |p| p + 1);
            return REGEX_KEYWORDS.contains(&&text[word_start..]);
        }
        if matches!(b, b'+' | b'-') && prev > 0 && self.bytes[prev - 1] == b {
            // postfix `i++ /` or `i-- /` ends an expression
            return false;
        }
        !matches!(b, b')' | b']' | b'}' | b'"' | b'\'' | b'`')
    }

    /// Skips a regex literal, or a lone `/` when no closing slash is found on the line.
    fn regex_literal(&mut self) {
        let start = self.pos;
        let mut i = start + 1;
        let mut in_class = false;
        loop {
            match self.bytes.get(i) {
                None | Some(b'\n' | b'\r') => {
                    self.significant();
                    return;
                }
                Some(b'\\') => i += 2,
                Some(b'[') => {
                    in_class = true;
                    i += 1;
                }
                Some(b']') => {
                    in_class = false;
                    i += 1;
                }
                Some(b'/') if !in_class => break,
                Some(_) => i += 1,
            }
        }
        i += 1;
        while i < self.bytes.len() && self.bytes[i].is_ascii_alphabetic() {
            i += 1;
        }
        self.prev = Some(i - 1);
        self.pos = i;
    }
}

/// Non-ASCII bytes count as word bytes so Unicode identifiers end an expression.
fn is_word_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_' || b == b'$' || b >= 0x80
}
