//! Structured observability hooks for the reconciliation lifecycle.
//!
//! This module provides:
//! - Poll-scoped tracing spans via [`poll_span`]
//! - Emission functions for key events: poll start/finish, comment and title
//!   side effects, pushes, transient failures
//!
//! Events are emitted at `info!` level (filter with `RUST_LOG`).

use tracing::info;

use crate::comments::marker::MarkerKind;
use crate::domain::state::StateLabel;

/// Span covering one reconciliation pass.
///
/// Attach it with `tracing::Instrument` rather than entering it, so the
/// pass future stays `Send` across collaborator awaits.
///
/// ```ignore
/// driver.reconcile(pr).instrument(poll_span("42", &poll_id)).await
/// ```
pub fn poll_span(pr_id: &str, poll_id: &uuid::Uuid) -> tracing::Span {
    tracing::info_span!("backport.poll", pr_id = %pr_id, poll_id = %poll_id)
}

pub fn emit_poll_started(pr_id: &str) {
    info!(event = "poll.started", pr_id = %pr_id);
}

pub fn emit_poll_finished(pr_id: &str, state: StateLabel, duration_ms: u64) {
    info!(
        event = "poll.finished",
        pr_id = %pr_id,
        state = %state,
        duration_ms = duration_ms,
    );
}

pub fn emit_comment_posted(pr_id: &str, kind: MarkerKind) {
    info!(event = "comment.posted", pr_id = %pr_id, kind = %kind);
}

pub fn emit_comment_updated(pr_id: &str, kind: MarkerKind) {
    info!(event = "comment.updated", pr_id = %pr_id, kind = %kind);
}

pub fn emit_title_updated(pr_id: &str, title: &str) {
    info!(event = "title.updated", pr_id = %pr_id, title = %title);
}

pub fn emit_backport_pushed(pr_id: &str, pushed: &str) {
    info!(event = "backport.pushed", pr_id = %pr_id, pushed = %pushed);
}

/// Emit event: a collaborator call failed; the pass is abandoned (warning level).
pub fn emit_transient_error(pr_id: &str, error: &dyn std::fmt::Display) {
    tracing::warn!(event = "poll.transient_error", pr_id = %pr_id, error = %error);
}
