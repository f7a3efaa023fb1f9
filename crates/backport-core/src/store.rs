//! File-backed review platform: one JSON document per pull request.
//!
//! Layout: `<dir>/<pr-id>.json`. Every trait call re-reads the document, so
//! edits made by people (approvals, `/integrate` comments, readiness flips)
//! are picked up on the next poll. Writes go through a temp file and a
//! rename so a crashed bot never leaves a half-written document behind.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use tokio::sync::Mutex;

use crate::forge::{
    Comment, CommentId, ForgeError, ForgeResult, PullRequest, PushTarget, Readiness,
    ReadinessGate,
};

fn default_next_comment() -> u64 {
    1
}

fn default_target_branch() -> String {
    "master".to_string()
}

/// On-disk shape of a pull request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PullRequestDoc {
    pub id: String,
    pub title: String,
    pub author: String,
    #[serde(default)]
    pub approvers: Vec<String>,
    #[serde(default)]
    pub comments: Vec<Comment>,
    #[serde(default = "default_next_comment")]
    pub next_comment: u64,
    /// Readiness as decided by external checks.
    #[serde(default)]
    pub ready: bool,
    #[serde(default)]
    pub blockers: Vec<String>,
    pub head: String,
    #[serde(default = "default_target_branch")]
    pub target_branch: String,
    #[serde(default = "Utc::now")]
    pub updated_at: DateTime<Utc>,
}

impl PullRequestDoc {
    pub fn new(id: &str, title: &str, author: &str, head: &str) -> Self {
        Self {
            id: id.to_string(),
            title: title.to_string(),
            author: author.to_string(),
            approvers: Vec::new(),
            comments: Vec::new(),
            next_comment: default_next_comment(),
            ready: false,
            blockers: Vec::new(),
            head: head.to_string(),
            target_branch: default_target_branch(),
            updated_at: Utc::now(),
        }
    }

    fn push_comment(&mut self, author: &str, body: &str) -> Comment {
        let comment = Comment {
            id: CommentId(format!("c{}", self.next_comment)),
            author: author.to_string(),
            body: body.to_string(),
        };
        self.next_comment += 1;
        self.comments.push(comment.clone());
        comment
    }
}

/// Directory of pull request documents.
#[derive(Debug, Clone)]
pub struct JsonPullRequestStore {
    dir: PathBuf,
}

impl JsonPullRequestStore {
    /// Open the store rooted at `dir`, creating the directory if needed.
    pub fn new(dir: impl AsRef<Path>) -> ForgeResult<Self> {
        fs::create_dir_all(dir.as_ref())?;
        Ok(Self {
            dir: dir.as_ref().to_path_buf(),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn doc_path(&self, id: &str) -> PathBuf {
        self.dir.join(format!("{id}.json"))
    }

    /// Ids of all stored pull requests, sorted.
    pub fn list(&self) -> ForgeResult<Vec<String>> {
        let mut ids = Vec::new();
        for entry in fs::read_dir(&self.dir)? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                ids.push(stem.to_string());
            }
        }
        ids.sort();
        Ok(ids)
    }

    pub fn load(&self, id: &str) -> ForgeResult<PullRequestDoc> {
        let bytes = fs::read(self.doc_path(id)).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ForgeError::PullRequestNotFound {
                    pr_id: id.to_string(),
                }
            } else {
                ForgeError::Io(e)
            }
        })?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    pub fn save(&self, doc: &PullRequestDoc) -> ForgeResult<()> {
        let json = serde_json::to_vec_pretty(doc)?;
        let mut tmp = NamedTempFile::new_in(&self.dir)?;
        tmp.write_all(&json)?;
        tmp.persist(self.doc_path(&doc.id)).map_err(|e| e.error)?;
        Ok(())
    }

    /// Handle to one stored PR; comments posted through it are authored by
    /// `bot_login`.
    pub fn open(&self, id: &str, bot_login: &str) -> ForgeResult<StoredPullRequest> {
        if !self.doc_path(id).exists() {
            return Err(ForgeError::PullRequestNotFound {
                pr_id: id.to_string(),
            });
        }
        Ok(StoredPullRequest {
            id: id.to_string(),
            bot_login: bot_login.to_string(),
            store: self.clone(),
            write_lock: Mutex::new(()),
        })
    }

    /// Append a comment written by a person.
    pub fn add_user_comment(&self, id: &str, author: &str, body: &str) -> ForgeResult<Comment> {
        let mut doc = self.load(id)?;
        let comment = doc.push_comment(author, body);
        doc.updated_at = Utc::now();
        self.save(&doc)?;
        Ok(comment)
    }
}

/// A pull request read from and written to its JSON document.
#[derive(Debug)]
pub struct StoredPullRequest {
    id: String,
    bot_login: String,
    store: JsonPullRequestStore,
    write_lock: Mutex<()>,
}

impl StoredPullRequest {
    async fn modify<T>(&self, edit: impl FnOnce(&mut PullRequestDoc) -> ForgeResult<T>) -> ForgeResult<T> {
        let _guard = self.write_lock.lock().await;
        let mut doc = self.store.load(&self.id)?;
        let out = edit(&mut doc)?;
        doc.updated_at = Utc::now();
        self.store.save(&doc)?;
        Ok(out)
    }
}

#[async_trait]
impl PullRequest for StoredPullRequest {
    fn id(&self) -> &str {
        &self.id
    }

    async fn title(&self) -> ForgeResult<String> {
        Ok(self.store.load(&self.id)?.title)
    }

    async fn set_title(&self, title: &str) -> ForgeResult<()> {
        self.modify(|doc| {
            doc.title = title.to_string();
            Ok(())
        })
        .await
    }

    async fn comments(&self) -> ForgeResult<Vec<Comment>> {
        Ok(self.store.load(&self.id)?.comments)
    }

    async fn add_comment(&self, body: &str) -> ForgeResult<Comment> {
        self.modify(|doc| Ok(doc.push_comment(&self.bot_login, body)))
            .await
    }

    async fn update_comment(&self, id: &CommentId, body: &str) -> ForgeResult<Comment> {
        self.modify(|doc| {
            let comment = doc
                .comments
                .iter_mut()
                .find(|c| c.id == *id)
                .ok_or_else(|| ForgeError::CommentNotFound {
                    pr_id: doc.id.clone(),
                    comment_id: id.to_string(),
                })?;
            comment.body = body.to_string();
            Ok(comment.clone())
        })
        .await
    }

    async fn approvers(&self) -> ForgeResult<Vec<String>> {
        Ok(self.store.load(&self.id)?.approvers)
    }

    async fn push_target(&self) -> ForgeResult<PushTarget> {
        let doc = self.store.load(&self.id)?;
        Ok(PushTarget {
            pr_id: doc.id,
            head: doc.head,
            target_branch: doc.target_branch,
        })
    }
}

/// Readiness taken from the `ready` and `blockers` fields of each document.
#[derive(Debug, Clone)]
pub struct StoreReadiness {
    store: JsonPullRequestStore,
}

impl StoreReadiness {
    pub fn new(store: JsonPullRequestStore) -> Self {
        Self { store }
    }
}

#[async_trait]
impl ReadinessGate for StoreReadiness {
    async fn readiness(&self, pr_id: &str) -> ForgeResult<Readiness> {
        let doc = self.store.load(pr_id)?;
        Ok(if doc.ready {
            Readiness::ready()
        } else {
            Readiness::blocked(doc.blockers)
        })
    }
}
