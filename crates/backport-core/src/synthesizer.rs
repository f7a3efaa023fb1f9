//! Backport message synthesis.
//!
//! Blends the original commit's provenance (issues, summary) with the live
//! review state of the backport PR (its current approvers).

use serde::{Deserialize, Serialize};

use crate::domain::hash::CommitHash;
use crate::domain::message::StructuredCommitMessage;

/// Result of synthesizing a backport.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Synthesis {
    pub message: StructuredCommitMessage,
    /// New PR title, `None` when the original references no issue.
    pub title: Option<String>,
    /// What was copied, e.g. `"issues and summary"`.
    pub status: String,
}

/// Build the backport message for `original_hash`.
///
/// Reviewers come from `approvers` (the backport is reviewed on its own);
/// contributors and additional trailers are not inherited.
pub fn synthesize(
    original: &StructuredCommitMessage,
    original_hash: &CommitHash,
    approvers: &[String],
) -> Synthesis {
    let mut reviewers: Vec<String> = Vec::with_capacity(approvers.len());
    for approver in approvers {
        if !reviewers.contains(approver) {
            reviewers.push(approver.clone());
        }
    }

    let message = StructuredCommitMessage {
        issues: original.issues.clone(),
        summary: original.summary.clone(),
        reviewers,
        contributors: Vec::new(),
        additional: Vec::new(),
        original: Some(original_hash.clone()),
    };

    Synthesis {
        title: backport_title(&message),
        status: status_text(&message),
        message,
    }
}

/// Headline of the first issue; later issues never change the title.
pub fn backport_title(message: &StructuredCommitMessage) -> Option<String> {
    message.primary_issue().map(|issue| issue.headline())
}

/// Describe what the backport copied from the original.
///
/// `"issue"` or `"issues"` by issue count, followed by `" and summary"` when
/// the summary is non-empty.
pub fn status_text(message: &StructuredCommitMessage) -> String {
    let issues = match message.issues.len() {
        0 => None,
        1 => Some("issue"),
        _ => Some("issues"),
    };
    match (issues, message.summary.is_empty()) {
        (Some(issues), true) => issues.to_string(),
        (Some(issues), false) => format!("{issues} and summary"),
        (None, false) => "summary".to_string(),
        (None, true) => "original commit message".to_string(),
    }
}
