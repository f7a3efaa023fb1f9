//! Structured events emitted during reconciliation passes.

use std::sync::Arc;

use backport_core::fakes::{FixedReadiness, MemoryHistory, MemoryPullRequest, MemoryPusher};
use backport_core::obs::{emit_comment_posted, emit_poll_finished, emit_transient_error};
use backport_core::{BotConfig, Driver, MarkerKind, StateLabel};
use tracing_test::traced_test;

fn driver(history: Arc<MemoryHistory>) -> Driver {
    Driver::new(
        &BotConfig::default(),
        history,
        Arc::new(MemoryPusher::new()),
        Arc::new(FixedReadiness::new(false)),
    )
}

#[traced_test]
#[test]
fn poll_finished_names_state() {
    emit_poll_finished("42", StateLabel::Resolved, 12);
    assert!(logs_contain("poll.finished"));
    assert!(logs_contain("resolved"));
}

#[traced_test]
#[test]
fn comment_posted_names_marker_kind() {
    emit_comment_posted("42", MarkerKind::BackportError);
    assert!(logs_contain("backport_error"));
}

#[traced_test]
#[test]
fn transient_error_is_a_warning() {
    emit_transient_error("42", &"forge timed out");
    assert!(logs_contain("WARN"));
    assert!(logs_contain("forge timed out"));
}

#[tokio::test]
#[traced_test]
async fn poll_emits_lifecycle_events() {
    let history = Arc::new(MemoryHistory::new());
    let original = history.commit("master", "JDK-1: An issue");
    let pr = MemoryPullRequest::new("7", &format!("Backport {original}"));

    driver(history).poll(&pr).await.unwrap();

    assert!(logs_contain("poll.started"));
    assert!(logs_contain("title.updated"));
    assert!(logs_contain("comment.posted"));
    assert!(logs_contain("poll.finished"));
    assert!(logs_contain("backport.poll"));
}

#[tokio::test]
#[traced_test]
async fn failed_poll_logs_transient_error() {
    let history = Arc::new(MemoryHistory::new());
    let original = history.commit("master", "JDK-1: An issue");
    history.set_unavailable(true);
    let pr = MemoryPullRequest::new("8", &format!("Backport {original}"));

    assert!(driver(history).poll(&pr).await.is_err());
    assert!(logs_contain("poll.transient_error"));
}
