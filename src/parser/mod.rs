//! purpose: Front half of the conversion pipeline. The locator finds comments in raw
//!     JavaScript/TypeScript text and the tag parser turns one documentation comment into
//!     a DocBlock.
//!
//! when-editing:
//!     - !ParseError is the only error the core surfaces; keep it to one classification
//!     - Malformed tags are not errors; the tag parser keeps them as opaque tags
//!
//! invariants:
//!     - Both stages are pure functions of their input text
//!     - Line and column in ParseError are 1-based
//!
//! gotchas:
//!     - The locator is a lexer, not a parser; it only knows enough syntax to skip strings,
//!       template literals and regular expressions

pub mod locator;
pub mod tags;

use thiserror::Error;

pub use locator::locate;
pub use tags::parse_doc_block;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("{source_id}:{line}:{column}: comment opened at byte {offset} is never closed")]
    UnterminatedComment {
        source_id: String,
        offset: usize,
        line: usize,
        column: usize,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_message() {
        let err = ParseError::UnterminatedComment {
            source_id: "src/a.ts".to_string(),
            offset: 12,
            line: 2,
            column: 5,
        };
        assert_eq!(
            err.to_string(),
            "src/a.ts:2:5: comment opened at byte 12 is never closed"
        );
    }
}
