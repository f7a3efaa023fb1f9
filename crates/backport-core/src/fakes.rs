//! In-memory fakes for the collaborator traits (testing only)
//!
//! Provides `MemoryPullRequest`, `MemoryHistory`, `MemoryPusher` and
//! `FixedReadiness` that satisfy the trait contracts without a network or a
//! git checkout. Each fake can be switched into a failing mode to exercise
//! the transient-error paths.

use std::collections::BTreeMap;
use std::sync::Mutex;

use async_trait::async_trait;
use sha2::{Digest, Sha256};

use crate::domain::hash::CommitHash;
use crate::forge::*;

fn short_hash(seed: &[u8]) -> CommitHash {
    let mut hasher = Sha256::new();
    hasher.update(seed);
    let hex = hex::encode(hasher.finalize());
    CommitHash::parse(&hex[..40]).expect("sha-256 hex prefix is a valid commit hash")
}

// ---------------------------------------------------------------------------
// MemoryPullRequest
// ---------------------------------------------------------------------------

#[derive(Debug)]
struct PullRequestState {
    title: String,
    comments: Vec<Comment>,
    approvers: Vec<String>,
    next_comment: u64,
    head: String,
    target_branch: String,
    unavailable: bool,
}

/// In-memory pull request with a comment list and an approver set.
#[derive(Debug)]
pub struct MemoryPullRequest {
    id: String,
    state: Mutex<PullRequestState>,
}

impl MemoryPullRequest {
    pub fn new(id: &str, title: &str) -> Self {
        Self {
            id: id.to_string(),
            state: Mutex::new(PullRequestState {
                title: title.to_string(),
                comments: Vec::new(),
                approvers: Vec::new(),
                next_comment: 1,
                head: format!("refs/pull/{id}/head"),
                target_branch: "master".to_string(),
                unavailable: false,
            }),
        }
    }

    /// Simulate the PR author editing the title.
    pub fn retitle(&self, title: &str) {
        self.state.lock().unwrap().title = title.to_string();
    }

    pub fn current_title(&self) -> String {
        self.state.lock().unwrap().title.clone()
    }

    /// Record an approval; approving twice keeps the original position.
    pub fn approve(&self, reviewer: &str) {
        let mut state = self.state.lock().unwrap();
        if !state.approvers.iter().any(|a| a == reviewer) {
            state.approvers.push(reviewer.to_string());
        }
    }

    pub fn withdraw_approval(&self, reviewer: &str) {
        self.state.lock().unwrap().approvers.retain(|a| a != reviewer);
    }

    /// Post a comment as someone other than the bot.
    pub fn add_user_comment(&self, author: &str, body: &str) -> Comment {
        let mut state = self.state.lock().unwrap();
        push_comment(&mut state, author, body)
    }

    pub fn snapshot_comments(&self) -> Vec<Comment> {
        self.state.lock().unwrap().comments.clone()
    }

    pub fn comment_count(&self) -> usize {
        self.state.lock().unwrap().comments.len()
    }

    /// When `true`, every trait call fails with [`ForgeError::Request`].
    pub fn set_unavailable(&self, unavailable: bool) {
        self.state.lock().unwrap().unavailable = unavailable;
    }

    fn check(&self) -> ForgeResult<std::sync::MutexGuard<'_, PullRequestState>> {
        let state = self.state.lock().unwrap();
        if state.unavailable {
            return Err(ForgeError::Request(format!(
                "pull request {} is unavailable",
                self.id
            )));
        }
        Ok(state)
    }
}

/// Bot comments are authored by whoever the caller says posts through the
/// trait; the fake attributes trait-posted comments to `BOT_AUTHOR`.
pub const BOT_AUTHOR: &str = "backport-bot";

fn push_comment(state: &mut PullRequestState, author: &str, body: &str) -> Comment {
    let comment = Comment {
        id: CommentId(format!("c{}", state.next_comment)),
        author: author.to_string(),
        body: body.to_string(),
    };
    state.next_comment += 1;
    state.comments.push(comment.clone());
    comment
}

#[async_trait]
impl PullRequest for MemoryPullRequest {
    fn id(&self) -> &str {
        &self.id
    }

    async fn title(&self) -> ForgeResult<String> {
        Ok(self.check()?.title.clone())
    }

    async fn set_title(&self, title: &str) -> ForgeResult<()> {
        self.check()?.title = title.to_string();
        Ok(())
    }

    async fn comments(&self) -> ForgeResult<Vec<Comment>> {
        Ok(self.check()?.comments.clone())
    }

    async fn add_comment(&self, body: &str) -> ForgeResult<Comment> {
        let mut state = self.check()?;
        Ok(push_comment(&mut state, BOT_AUTHOR, body))
    }

    async fn update_comment(&self, id: &CommentId, body: &str) -> ForgeResult<Comment> {
        let mut state = self.check()?;
        let comment = state
            .comments
            .iter_mut()
            .find(|c| c.id == *id)
            .ok_or_else(|| ForgeError::CommentNotFound {
                pr_id: self.id.clone(),
                comment_id: id.to_string(),
            })?;
        comment.body = body.to_string();
        Ok(comment.clone())
    }

    async fn approvers(&self) -> ForgeResult<Vec<String>> {
        Ok(self.check()?.approvers.clone())
    }

    async fn push_target(&self) -> ForgeResult<PushTarget> {
        let state = self.check()?;
        Ok(PushTarget {
            pr_id: self.id.clone(),
            head: state.head.clone(),
            target_branch: state.target_branch.clone(),
        })
    }
}

// ---------------------------------------------------------------------------
// MemoryHistory
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
struct HistoryState {
    branches: BTreeMap<String, Vec<Commit>>,
    unavailable: bool,
}

/// In-memory repository history: named branches, each a list of commits.
#[derive(Debug, Default)]
pub struct MemoryHistory {
    state: Mutex<HistoryState>,
}

impl MemoryHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a commit to `branch` and return its hash.
    pub fn commit(&self, branch: &str, message: &str) -> CommitHash {
        let mut state = self.state.lock().unwrap();
        let commits = state.branches.entry(branch.to_string()).or_default();
        let seed = format!("{branch}\0{}\0{message}", commits.len());
        let hash = short_hash(seed.as_bytes());
        commits.push(Commit {
            hash: hash.clone(),
            message: message.to_string(),
        });
        hash
    }

    /// Place a commit with a chosen hash on `branch`.
    pub fn insert(&self, branch: &str, commit: Commit) {
        let mut state = self.state.lock().unwrap();
        state
            .branches
            .entry(branch.to_string())
            .or_default()
            .push(commit);
    }

    pub fn set_unavailable(&self, unavailable: bool) {
        self.state.lock().unwrap().unavailable = unavailable;
    }
}

#[async_trait]
impl CommitHistory for MemoryHistory {
    async fn lookup(&self, hash: &CommitHash) -> HistoryResult<Option<Commit>> {
        let state = self.state.lock().unwrap();
        if state.unavailable {
            return Err(HistoryError::Unavailable("history is unavailable".to_string()));
        }
        Ok(state
            .branches
            .values()
            .flat_map(|commits| commits.iter())
            .find(|c| c.hash == *hash)
            .cloned())
    }
}

// ---------------------------------------------------------------------------
// MemoryPusher
// ---------------------------------------------------------------------------

/// A push recorded by [`MemoryPusher`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedPush {
    pub target: PushTarget,
    pub message: String,
    pub pushed: CommitHash,
}

/// Records pushes instead of performing them.
///
/// The last push to a branch stands in for its tip: pushing the same head
/// with the same message again returns the recorded hash without a new
/// push, as [`crate::git::GitPusher`] does.
#[derive(Debug, Default)]
pub struct MemoryPusher {
    pushes: Mutex<Vec<RecordedPush>>,
    rejecting: Mutex<bool>,
}

impl MemoryPusher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pushes(&self) -> Vec<RecordedPush> {
        self.pushes.lock().unwrap().clone()
    }

    pub fn set_rejecting(&self, rejecting: bool) {
        *self.rejecting.lock().unwrap() = rejecting;
    }
}

#[async_trait]
impl CommitPusher for MemoryPusher {
    async fn push(&self, target: &PushTarget, message: &str) -> PushResult<CommitHash> {
        if *self.rejecting.lock().unwrap() {
            return Err(PushError::Rejected {
                pr_id: target.pr_id.clone(),
                reason: "push rejected".to_string(),
            });
        }
        let mut pushes = self.pushes.lock().unwrap();
        let tip = pushes
            .iter()
            .rev()
            .find(|p| p.target.target_branch == target.target_branch);
        if let Some(tip) = tip {
            if tip.target.head == target.head && tip.message == message {
                return Ok(tip.pushed.clone());
            }
        }
        let seed = format!("{}\0{}\0{message}", target.target_branch, pushes.len());
        let pushed = short_hash(seed.as_bytes());
        pushes.push(RecordedPush {
            target: target.clone(),
            message: message.to_string(),
            pushed: pushed.clone(),
        });
        Ok(pushed)
    }
}

// ---------------------------------------------------------------------------
// FixedReadiness
// ---------------------------------------------------------------------------

/// Readiness decision set directly by the test.
#[derive(Debug, Default)]
pub struct FixedReadiness {
    readiness: Mutex<Readiness>,
}

impl FixedReadiness {
    pub fn new(ready: bool) -> Self {
        let readiness = if ready {
            Readiness::ready()
        } else {
            Readiness::blocked(vec!["awaiting review".to_string()])
        };
        Self {
            readiness: Mutex::new(readiness),
        }
    }

    pub fn set(&self, readiness: Readiness) {
        *self.readiness.lock().unwrap() = readiness;
    }
}

#[async_trait]
impl ReadinessGate for FixedReadiness {
    async fn readiness(&self, _pr_id: &str) -> ForgeResult<Readiness> {
        Ok(self.readiness.lock().unwrap().clone())
    }
}
