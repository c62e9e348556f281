//! purpose: Splices rewritten comments back into the source text and records where each
//!     replacement landed in the output.
//!
//! invariants:
//!     - Text between spans, and every span without a replacement, is copied unchanged
//!     - Splice.output indexes the returned text; the running delta tracks the shift
//!
//! gotchas:
//!     - Spans must be sorted and disjoint; the fold slices `original[cursor..span.start]`
//!     - Replacements are keyed by the span's original start offset

use crate::types::CommentSpan;
use std::collections::HashMap;
use std::ops::Range;

/// Where one replaced span ended up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Splice {
    pub original: Range<usize>,
    pub output: Range<usize>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reassembled {
    pub text: String,
    pub splices: Vec<Splice>,
}

/// Rebuild `original`, replacing each span whose start offset is a key of `rewritten`.
///
/// Spans must be sorted and disjoint, as produced by the locator.
pub fn reassemble(
    original: &str,
    spans: &[CommentSpan<'_>],
    rewritten: &HashMap<usize, String>,
) -> Reassembled {
    let init = (String::with_capacity(original.len()), 0usize, 0isize, Vec::new());

    let (mut text, cursor, _delta, splices) =
        spans
            .iter()
            .fold(init, |(mut text, cursor, delta, mut splices), span| {
                text.push_str(&original[cursor..span.start]);
                let Some(replacement) = rewritten.get(&span.start) else {
                    text.push_str(span.raw);
                    return (text, span.end, delta, splices);
                };

                let output_start = span.start.saturating_add_signed(delta);
                debug_assert_eq!(output_start, text.len());
                text.push_str(replacement);
                splices.push(Splice {
                    original: span.range(),
                    output: output_start..output_start + replacement.len(),
                });

                let delta = delta + replacement.len() as isize - span.raw.len() as isize;
                (text, span.end, delta, splices)
            });

    text.push_str(&original[cursor..]);
    Reassembled { text, splices }
}
