//! Error types for the collaborator boundary.
//!
//! Every variant here is transient from the driver's point of view: the pass
//! is abandoned without side effects and retried on the next poll.

use thiserror::Error;

/// Errors returned by the review-platform collaborator.
#[derive(Debug, Error)]
pub enum ForgeError {
    #[error("pull request not found: {pr_id}")]
    PullRequestNotFound { pr_id: String },

    #[error("comment {comment_id} not found on pull request {pr_id}")]
    CommentNotFound { pr_id: String, comment_id: String },

    /// The remote call failed (network, rate limit, server error).
    #[error("forge request failed: {0}")]
    Request(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors returned by the repository-history collaborator.
#[derive(Debug, Error)]
pub enum HistoryError {
    #[error("git error: {0}")]
    Git(String),

    #[error("history unavailable: {0}")]
    Unavailable(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors returned by the push collaborator.
#[derive(Debug, Error)]
pub enum PushError {
    #[error("push of pull request {pr_id} rejected: {reason}")]
    Rejected { pr_id: String, reason: String },

    #[error("git error: {0}")]
    Git(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

pub type ForgeResult<T> = std::result::Result<T, ForgeError>;
pub type HistoryResult<T> = std::result::Result<T, HistoryError>;
pub type PushResult<T> = std::result::Result<T, PushError>;
