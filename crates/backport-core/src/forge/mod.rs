//! Collaborator boundary: review platform, repository history, push, readiness.
//!
//! The engine only talks to the outside world through these traits. Real
//! implementations live in [`crate::git`] and [`crate::store`]; in-memory
//! fakes for tests live in [`crate::fakes`].

pub mod error;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::hash::CommitHash;

pub use error::{ForgeError, ForgeResult, HistoryError, HistoryResult, PushError, PushResult};

/// Opaque identifier of a PR comment, assigned by the forge.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CommentId(pub String);

impl std::fmt::Display for CommentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A comment as listed by the forge, in posting order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    pub id: CommentId,
    pub author: String,
    pub body: String,
}

/// A commit found in the repository history.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Commit {
    pub hash: CommitHash,
    pub message: String,
}

impl Commit {
    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Where an integrated PR gets pushed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PushTarget {
    pub pr_id: String,
    /// Ref or hash of the PR's head commit.
    pub head: String,
    /// Branch the backport lands on.
    pub target_branch: String,
}

/// External integration decision (approvals, automated checks).
///
/// The engine consumes this; it never computes it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Readiness {
    pub ready: bool,
    /// Human-readable reasons when not ready.
    #[serde(default)]
    pub blockers: Vec<String>,
}

impl Readiness {
    pub fn ready() -> Self {
        Self {
            ready: true,
            blockers: Vec::new(),
        }
    }

    pub fn blocked(blockers: Vec<String>) -> Self {
        Self {
            ready: false,
            blockers,
        }
    }
}

/// A single pull request on the review platform.
#[async_trait]
pub trait PullRequest: Send + Sync {
    fn id(&self) -> &str;

    async fn title(&self) -> ForgeResult<String>;

    async fn set_title(&self, title: &str) -> ForgeResult<()>;

    /// All comments, oldest first.
    async fn comments(&self) -> ForgeResult<Vec<Comment>>;

    async fn add_comment(&self, body: &str) -> ForgeResult<Comment>;

    async fn update_comment(&self, id: &CommentId, body: &str) -> ForgeResult<Comment>;

    /// Currently approving reviewers, in approval order.
    async fn approvers(&self) -> ForgeResult<Vec<String>>;

    async fn push_target(&self) -> ForgeResult<PushTarget>;
}

/// Read-only view of the repository mirror, spanning every ref.
#[async_trait]
pub trait CommitHistory: Send + Sync {
    /// Look `hash` up on any branch or tag. `Ok(None)` means absent.
    async fn lookup(&self, hash: &CommitHash) -> HistoryResult<Option<Commit>>;
}

/// Creates the integrated commit and returns its hash.
#[async_trait]
pub trait CommitPusher: Send + Sync {
    async fn push(&self, target: &PushTarget, message: &str) -> PushResult<CommitHash>;
}

/// Source of the external readiness decision for a PR.
#[async_trait]
pub trait ReadinessGate: Send + Sync {
    async fn readiness(&self, pr_id: &str) -> ForgeResult<Readiness>;
}
