//! Idempotent posting of marker-tagged status comments.

use tracing::debug;

use crate::comments::marker::{CommentMarker, MarkerKind};
use crate::forge::{Comment, CommentId, ForgeResult, PullRequest};
use crate::metrics::METRICS;
use crate::obs;

/// What [`CommentManager::post_or_update`] did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommentAction {
    Posted(CommentId),
    Updated(CommentId),
    Unchanged(CommentId),
}

impl CommentAction {
    pub fn comment_id(&self) -> &CommentId {
        match self {
            CommentAction::Posted(id) | CommentAction::Updated(id) | CommentAction::Unchanged(id) => {
                id
            }
        }
    }

    /// `true` when a user-visible change was made.
    pub fn changed(&self) -> bool {
        !matches!(self, CommentAction::Unchanged(_))
    }
}

/// Reconciles the bot's comments on one PR against the desired status.
///
/// Holds a snapshot of the comment list taken at [`CommentManager::load`];
/// comments posted or edited through the manager are folded back into the
/// snapshot so later calls in the same pass see them.
pub struct CommentManager<'a> {
    pr: &'a dyn PullRequest,
    bot_login: &'a str,
    comments: Vec<Comment>,
}

impl<'a> CommentManager<'a> {
    pub async fn load(pr: &'a dyn PullRequest, bot_login: &'a str) -> ForgeResult<Self> {
        let comments = pr.comments().await?;
        Ok(Self::with_comments(pr, bot_login, comments))
    }

    pub fn with_comments(pr: &'a dyn PullRequest, bot_login: &'a str, comments: Vec<Comment>) -> Self {
        Self {
            pr,
            bot_login,
            comments,
        }
    }

    /// All comments in the snapshot, oldest first.
    pub fn comments(&self) -> &[Comment] {
        &self.comments
    }

    /// The most recent bot comment carrying a marker of `kind`.
    pub fn find(&self, kind: MarkerKind) -> Option<(&Comment, CommentMarker)> {
        self.comments
            .iter()
            .rev()
            .filter(|c| c.author == self.bot_login)
            .find_map(|c| {
                CommentMarker::find(&c.body)
                    .filter(|m| m.kind() == kind)
                    .map(|m| (c, m))
            })
    }

    /// Make sure exactly one bot comment carries `marker`.
    ///
    /// - no comment of the marker's kind: post `text` with the marker;
    /// - same kind and payload: nothing to do;
    /// - same kind, different payload: edit in place when the kind is live,
    ///   otherwise leave the existing comment alone.
    pub async fn post_or_update(
        &mut self,
        marker: &CommentMarker,
        text: &str,
    ) -> ForgeResult<CommentAction> {
        let kind = marker.kind();
        let body = format!("{text}\n{}", marker.encode());

        let existing = self
            .find(kind)
            .map(|(comment, found)| (comment.id.clone(), found));

        match existing {
            None => {
                let posted = self.pr.add_comment(&body).await?;
                obs::emit_comment_posted(self.pr.id(), kind);
                METRICS.inc_comments_posted();
                let id = posted.id.clone();
                self.comments.push(posted);
                Ok(CommentAction::Posted(id))
            }
            Some((id, found)) if found == *marker || !kind.is_live() => {
                debug!(pr_id = %self.pr.id(), kind = %kind, "comment already up to date");
                Ok(CommentAction::Unchanged(id))
            }
            Some((id, _)) => {
                let updated = self.pr.update_comment(&id, &body).await?;
                obs::emit_comment_updated(self.pr.id(), kind);
                METRICS.inc_comments_updated();
                if let Some(slot) = self.comments.iter_mut().find(|c| c.id == id) {
                    *slot = updated;
                }
                Ok(CommentAction::Updated(id))
            }
        }
    }

    /// Set the PR title unless it already reads `desired`.
    pub async fn ensure_title(&self, current: &str, desired: &str) -> ForgeResult<bool> {
        if current == desired {
            return Ok(false);
        }
        self.pr.set_title(desired).await?;
        obs::emit_title_updated(self.pr.id(), desired);
        Ok(true)
    }
}
