//! Per-pull-request reconciliation state.
//!
//! The state is never stored. Each poll derives it again from the PR title,
//! the bot's comment markers and the repository history.

use serde::{Deserialize, Serialize};

use crate::domain::error::FormatError;
use crate::domain::hash::CommitHash;
use crate::domain::message::StructuredCommitMessage;

/// Why a backport PR cannot proceed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackportFailure {
    /// The referenced hash is well-formed but absent from every ref.
    ReferenceNotFound { reference: CommitHash },
    /// The original commit exists but its message violates the grammar.
    MalformedMessage {
        original: CommitHash,
        error: FormatError,
    },
}

impl BackportFailure {
    /// The hash the failure is about.
    pub fn reference(&self) -> &CommitHash {
        match self {
            BackportFailure::ReferenceNotFound { reference } => reference,
            BackportFailure::MalformedMessage { original, .. } => original,
        }
    }
}

impl std::fmt::Display for BackportFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BackportFailure::ReferenceNotFound { reference } => {
                write!(f, "could not find any commit with hash {reference}")
            }
            BackportFailure::MalformedMessage { original, error } => {
                write!(f, "message of {original} could not be parsed: {error}")
            }
        }
    }
}

/// Where a backport PR stands after a poll.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconciliationState {
    /// The title does not reference a commit and no backport was recorded.
    NotABackport,
    /// A reference is known but has not been resolved in this pass yet.
    Pending { reference: CommitHash },
    Error { cause: BackportFailure },
    /// The original was found and the backport message synthesized.
    Resolved {
        original: CommitHash,
        message: StructuredCommitMessage,
    },
    /// The backport was pushed; reconciliation is over.
    Integrated { pushed: CommitHash },
}

impl ReconciliationState {
    /// Terminal states never cause further side effects.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ReconciliationState::NotABackport | ReconciliationState::Integrated { .. }
        )
    }

    /// Short label used in logs and CLI output.
    pub fn label(&self) -> StateLabel {
        match self {
            ReconciliationState::NotABackport => StateLabel::NotABackport,
            ReconciliationState::Pending { .. } => StateLabel::Pending,
            ReconciliationState::Error { .. } => StateLabel::Error,
            ReconciliationState::Resolved { .. } => StateLabel::Resolved,
            ReconciliationState::Integrated { .. } => StateLabel::Integrated,
        }
    }
}

/// Payload-free discriminant of [`ReconciliationState`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StateLabel {
    NotABackport,
    Pending,
    Error,
    Resolved,
    Integrated,
}

impl std::fmt::Display for StateLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            StateLabel::NotABackport => "not_a_backport",
            StateLabel::Pending => "pending",
            StateLabel::Error => "error",
            StateLabel::Resolved => "resolved",
            StateLabel::Integrated => "integrated",
        };
        f.write_str(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hash() -> CommitHash {
        CommitHash::parse("0123456789012345678901234567890123456789").unwrap()
    }

    #[test]
    fn terminal_states() {
        assert!(ReconciliationState::NotABackport.is_terminal());
        assert!(ReconciliationState::Integrated { pushed: hash() }.is_terminal());
        assert!(!ReconciliationState::Pending { reference: hash() }.is_terminal());
    }

    #[test]
    fn failure_display_names_hash() {
        let failure = BackportFailure::ReferenceNotFound { reference: hash() };
        assert!(failure.to_string().contains(hash().as_str()));
        assert_eq!(failure.reference(), &hash());
    }

    #[test]
    fn label_serializes_snake_case() {
        let json = serde_json::to_string(&StateLabel::NotABackport).unwrap();
        assert_eq!(json, "\"not_a_backport\"");
        assert_eq!(StateLabel::Resolved.to_string(), "resolved");
    }
}
