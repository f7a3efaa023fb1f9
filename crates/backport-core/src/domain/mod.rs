//! Core domain types: commit hashes, structured messages, reconciliation state.

pub mod error;
pub mod hash;
pub mod message;
pub mod state;

pub use error::{FormatError, InvalidHash};
pub use hash::{is_commit_hash, CommitHash, HASH_HEX_LEN};
pub use message::{is_issue_id, IssueRef, StructuredCommitMessage};
pub use state::{BackportFailure, ReconciliationState, StateLabel};
