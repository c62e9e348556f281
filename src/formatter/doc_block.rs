//! purpose: Turns a DocBlock back into comment text. Lines are written exactly as they were
//!     parsed, so the only differences from the source are the edits the rewriter made.
//!
//! invariants:
//!     - serialize(parse(raw)) == raw for every documentation comment
//!     - The output always opens with `/**` followed by something other than `*` or `/`,
//!       so it stays a documentation comment
//!
//! gotchas:
//!     - A block whose every line was removed becomes `/** */`
//!     - The rewriter, not this module, restores the closing indent when the tag sharing
//!       the `*/` line is dropped

use crate::types::DocBlock;

pub fn serialize(block: &DocBlock) -> String {
    let mut body = String::new();
    body.push_str(&block.lead);
    for line in &block.intro {
        line.write_to(&mut body);
    }
    for tag in &block.tags {
        for line in &tag.lines {
            line.write_to(&mut body);
        }
    }
    body.push_str(&block.tail);

    let mut out = String::with_capacity(body.len() + 6);
    out.push_str("/**");
    if body.is_empty() || body.starts_with(['*', '/']) {
        out.push(' ');
    }
    out.push_str(&body);
    out.push_str("*/");
    out
}
