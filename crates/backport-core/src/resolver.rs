//! Backport reference extraction and cross-branch commit resolution.

use std::sync::LazyLock;

use regex::Regex;
use thiserror::Error;
use tracing::debug;

use crate::domain::hash::CommitHash;
use crate::forge::{Commit, CommitHistory, HistoryError};

/// `Backport <hash>`; the hash must be 40 lowercase hex characters.
static BACKPORT_TITLE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^Backport\s+([0-9a-f]{40})$").expect("backport title pattern is valid")
});

/// A validated commit hash taken from a PR title.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BackportReference(CommitHash);

impl BackportReference {
    pub fn new(hash: CommitHash) -> Self {
        Self(hash)
    }

    pub fn hash(&self) -> &CommitHash {
        &self.0
    }

    pub fn into_hash(self) -> CommitHash {
        self.0
    }
}

impl std::fmt::Display for BackportReference {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Errors from [`resolve`].
#[derive(Debug, Error)]
pub enum ResolveError {
    /// The hash is not reachable from any ref in the mirror.
    #[error("could not find any commit with hash {reference}")]
    NotFound { reference: CommitHash },

    #[error("history lookup failed: {0}")]
    History(#[from] HistoryError),
}

/// Extract the backport reference from a PR title.
///
/// Returns `None` for any title that is not exactly `Backport <hash>`
/// (surrounding whitespace aside); such a PR is not a backport candidate.
pub fn extract_reference(title: &str) -> Option<BackportReference> {
    let captures = BACKPORT_TITLE.captures(title.trim())?;
    let hash = CommitHash::parse(captures.get(1)?.as_str()).ok()?;
    Some(BackportReference(hash))
}

/// Look the referenced commit up across every branch of `history`.
pub async fn resolve(
    reference: &BackportReference,
    history: &dyn CommitHistory,
) -> Result<Commit, ResolveError> {
    match history.lookup(reference.hash()).await? {
        Some(commit) if commit.hash == *reference.hash() => {
            debug!(reference = %reference, "backport reference resolved");
            Ok(commit)
        }
        Some(commit) => Err(ResolveError::History(HistoryError::Unavailable(format!(
            "lookup of {} returned {}",
            reference, commit.hash
        )))),
        None => Err(ResolveError::NotFound {
            reference: reference.hash().clone(),
        }),
    }
}
