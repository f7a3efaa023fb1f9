//! Commit message codec.
//!
//! Grammar, top to bottom:
//!
//! ```text
//! <issueId>: <description>        (zero or more)
//!
//! summary paragraph lines         (zero or more, blank-separated paragraphs)
//!
//! Co-authored-by: <identity>      (zero or more)
//! Reviewed-by: <id>, <id>, ...    (at most one)
//! Backport-of: <40-hex hash>      (at most one)
//! Key: value                      (any other keyed lines)
//! ```
//!
//! [`parse`] and [`serialize`] are inverses on parsed input:
//! `parse(&serialize(&m)) == Ok(m)` for every `m` returned by [`parse`].

pub mod lexer;
pub mod parser;
pub mod serialize;

pub use parser::parse;
pub use serialize::serialize;
