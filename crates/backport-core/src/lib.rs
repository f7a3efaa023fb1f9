//! Backport reconciliation engine.
//!
//! Recognizes pull requests titled `Backport <hash>`, finds the original
//! commit, rebuilds its message for the backport, and drives the PR to
//! integration through idempotent, marker-tagged status comments.

pub mod comments;
pub mod config;
pub mod domain;
pub mod driver;
pub mod fakes;
pub mod forge;
pub mod git;
pub mod message;
pub mod metrics;
pub mod obs;
pub mod resolver;
pub mod store;
pub mod synthesizer;
pub mod telemetry;

pub use comments::{CommentAction, CommentManager, CommentMarker, MarkerKind};
pub use config::{BotConfig, ConfigError};
pub use domain::{
    BackportFailure, CommitHash, FormatError, InvalidHash, IssueRef, ReconciliationState,
    StateLabel, StructuredCommitMessage,
};
pub use driver::{Driver, DriverError};
pub use forge::{
    Comment, CommentId, Commit, CommitHistory, CommitPusher, ForgeError, HistoryError,
    PullRequest, PushError, PushTarget, Readiness, ReadinessGate,
};
pub use git::{is_git_repo, GitHistory, GitPusher};
pub use message::{parse, serialize};
pub use metrics::METRICS;
pub use resolver::{extract_reference, resolve, BackportReference, ResolveError};
pub use store::{JsonPullRequestStore, PullRequestDoc, StoreReadiness, StoredPullRequest};
pub use synthesizer::{synthesize, Synthesis};
pub use telemetry::init_tracing;

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
