//! Reconciliation driver: one pass per poll, state recomputed from facts.
//!
//! The driver keeps no memory between polls. Each pass reads the PR title,
//! the comment list and the repository history, derives where the PR
//! stands, and applies whatever side effects are still missing. Comment
//! markers are the only record of what was already said, which is what
//! makes repeated or interrupted passes safe.

use std::sync::Arc;
use std::time::Instant;

use thiserror::Error;
use tracing::{debug, info, Instrument};

use crate::comments::{render, CommentManager, CommentMarker};
use crate::config::BotConfig;
use crate::domain::hash::CommitHash;
use crate::domain::message::StructuredCommitMessage;
use crate::domain::state::{BackportFailure, ReconciliationState};
use crate::forge::{
    Comment, CommitHistory, CommitPusher, ForgeError, HistoryError, PullRequest, PushError,
    ReadinessGate,
};
use crate::message;
use crate::metrics::METRICS;
use crate::obs;
use crate::resolver::{self, BackportReference, ResolveError};
use crate::synthesizer::synthesize;

/// A collaborator call failed; nothing was recorded and the next poll
/// retries the full pass.
#[derive(Debug, Error)]
pub enum DriverError {
    #[error("forge call failed: {0}")]
    Forge(#[from] ForgeError),

    #[error("history lookup failed: {0}")]
    History(#[from] HistoryError),

    #[error("push failed: {0}")]
    Push(#[from] PushError),
}

/// Whether a pass may change anything on the PR.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Apply,
    Observe,
}

/// Drives backport PRs towards integration.
pub struct Driver {
    bot_login: String,
    integrate_command: String,
    history: Arc<dyn CommitHistory>,
    pusher: Arc<dyn CommitPusher>,
    readiness: Arc<dyn ReadinessGate>,
}

impl Driver {
    pub fn new(
        config: &BotConfig,
        history: Arc<dyn CommitHistory>,
        pusher: Arc<dyn CommitPusher>,
        readiness: Arc<dyn ReadinessGate>,
    ) -> Self {
        Self {
            bot_login: config.bot_login.clone(),
            integrate_command: config.integrate_command.clone(),
            history,
            pusher,
            readiness,
        }
    }

    /// Derive the starting state of a pass from the title and comments.
    ///
    /// Pure: no collaborator is consulted. The result is `Integrated`,
    /// `NotABackport`, or `Pending` with the reference to resolve. The title
    /// wins over the recorded info marker, so retitling the PR to another
    /// `Backport <hash>` re-targets it.
    pub fn derive(&self, title: &str, comments: &[Comment]) -> ReconciliationState {
        let markers: Vec<CommentMarker> = comments
            .iter()
            .filter(|c| c.author == self.bot_login)
            .filter_map(|c| CommentMarker::find(&c.body))
            .collect();

        if let Some(pushed) = markers.iter().rev().find_map(|m| match m {
            CommentMarker::Integrated { pushed } => Some(pushed.clone()),
            _ => None,
        }) {
            return ReconciliationState::Integrated { pushed };
        }

        let recorded = markers.iter().rev().find_map(|m| match m {
            CommentMarker::BackportInfo { original, .. } => Some(original.clone()),
            _ => None,
        });

        match resolver::extract_reference(title)
            .map(BackportReference::into_hash)
            .or(recorded)
        {
            Some(reference) => ReconciliationState::Pending { reference },
            None => ReconciliationState::NotABackport,
        }
    }

    /// Run one reconciliation pass with side effects.
    pub async fn poll(&self, pr: &dyn PullRequest) -> Result<ReconciliationState, DriverError> {
        let span = obs::poll_span(pr.id(), &uuid::Uuid::new_v4());
        self.poll_pass(pr).instrument(span).await
    }

    async fn poll_pass(&self, pr: &dyn PullRequest) -> Result<ReconciliationState, DriverError> {
        obs::emit_poll_started(pr.id());
        let started = Instant::now();

        match self.reconcile(pr, Mode::Apply).await {
            Ok(state) => {
                METRICS.inc_polls();
                let elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
                obs::emit_poll_finished(pr.id(), state.label(), elapsed_ms);
                Ok(state)
            }
            Err(err) => {
                METRICS.inc_transient_failures();
                obs::emit_transient_error(pr.id(), &err);
                Err(err)
            }
        }
    }

    /// Compute the state a pass would reach, without touching the PR.
    pub async fn observe(&self, pr: &dyn PullRequest) -> Result<ReconciliationState, DriverError> {
        self.reconcile(pr, Mode::Observe).await
    }

    async fn reconcile(
        &self,
        pr: &dyn PullRequest,
        mode: Mode,
    ) -> Result<ReconciliationState, DriverError> {
        let title = pr.title().await?;
        let mut comments = CommentManager::load(pr, &self.bot_login).await?;

        let reference = match self.derive(&title, comments.comments()) {
            ReconciliationState::Pending { reference } => reference,
            settled => {
                debug!(pr_id = %pr.id(), state = %settled.label(), "nothing to reconcile");
                return Ok(settled);
            }
        };

        let commit = match resolver::resolve(
            &BackportReference::new(reference.clone()),
            self.history.as_ref(),
        )
        .await
        {
            Ok(commit) => commit,
            Err(ResolveError::NotFound { reference }) => {
                if mode == Mode::Apply {
                    comments
                        .post_or_update(
                            &CommentMarker::BackportError,
                            &render::reference_not_found(&reference),
                        )
                        .await?;
                }
                return Ok(ReconciliationState::Error {
                    cause: BackportFailure::ReferenceNotFound { reference },
                });
            }
            Err(ResolveError::History(err)) => return Err(err.into()),
        };

        let original = match message::parse(commit.message()) {
            Ok(original) => original,
            Err(error) => {
                if mode == Mode::Apply {
                    comments
                        .post_or_update(
                            &CommentMarker::BackportError,
                            &render::malformed_original(&reference, &error),
                        )
                        .await?;
                }
                return Ok(ReconciliationState::Error {
                    cause: BackportFailure::MalformedMessage {
                        original: reference,
                        error,
                    },
                });
            }
        };

        let approvers = pr.approvers().await?;
        let synthesis = synthesize(&original, &reference, &approvers);

        if mode == Mode::Apply {
            // The info marker must exist before the title stops naming the
            // hash, or an interrupted pass loses the reference.
            let marker = CommentMarker::BackportInfo {
                original: reference.clone(),
                reviewers: synthesis.message.reviewers.clone(),
            };
            comments
                .post_or_update(&marker, &render::backport_info(&reference, &synthesis))
                .await?;
            if let Some(new_title) = &synthesis.title {
                comments.ensure_title(&title, new_title).await?;
            }
        }

        let readiness = self.readiness.readiness(pr.id()).await?;
        if !readiness.ready {
            debug!(pr_id = %pr.id(), blockers = ?readiness.blockers, "not ready for integration");
            return Ok(ReconciliationState::Resolved {
                original: reference,
                message: synthesis.message,
            });
        }

        if mode == Mode::Observe {
            return Ok(ReconciliationState::Resolved {
                original: reference,
                message: synthesis.message,
            });
        }

        comments
            .post_or_update(
                &CommentMarker::Readiness,
                &render::readiness(&self.integrate_command),
            )
            .await?;

        if !self.integrate_requested(comments.comments()) {
            return Ok(ReconciliationState::Resolved {
                original: reference,
                message: synthesis.message,
            });
        }

        let pushed = self.integrate(pr, &mut comments, &synthesis.message).await?;
        Ok(ReconciliationState::Integrated { pushed })
    }

    async fn integrate(
        &self,
        pr: &dyn PullRequest,
        comments: &mut CommentManager<'_>,
        synthesized: &StructuredCommitMessage,
    ) -> Result<CommitHash, DriverError> {
        let target = pr.push_target().await?;
        let pushed = self
            .pusher
            .push(&target, &message::serialize(synthesized))
            .await?;
        METRICS.inc_pushes();
        obs::emit_backport_pushed(pr.id(), pushed.as_str());
        info!(pr_id = %pr.id(), branch = %target.target_branch, pushed = %pushed, "backport integrated");

        comments
            .post_or_update(
                &CommentMarker::Integrated {
                    pushed: pushed.clone(),
                },
                &render::integrated(&pushed),
            )
            .await?;
        Ok(pushed)
    }

    /// `true` when someone other than the bot asked for integration.
    fn integrate_requested(&self, comments: &[Comment]) -> bool {
        comments
            .iter()
            .filter(|c| c.author != self.bot_login)
            .any(|c| c.body.lines().any(|l| l.trim() == self.integrate_command))
    }
}
