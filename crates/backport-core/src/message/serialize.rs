//! Canonical rendering of a [`StructuredCommitMessage`].

use crate::domain::message::StructuredCommitMessage;
use crate::message::lexer::{CONTRIBUTOR_KEY, ORIGINAL_KEY, REVIEWERS_KEY};

/// Render `message` in the canonical block order.
///
/// Blocks are issues, summary, then trailers, separated by one blank line;
/// empty blocks are left out together with their separator. Trailers are
/// always written as contributors, reviewers, `Backport-of`, additional.
pub fn serialize(message: &StructuredCommitMessage) -> String {
    let mut blocks: Vec<String> = Vec::with_capacity(3);

    if !message.issues.is_empty() {
        let issues: Vec<String> = message.issues.iter().map(|i| i.headline()).collect();
        blocks.push(issues.join("\n"));
    }

    if !message.summary.is_empty() {
        blocks.push(message.summary.join("\n"));
    }

    let mut trailers: Vec<String> = message
        .contributors
        .iter()
        .map(|c| format!("{CONTRIBUTOR_KEY}: {c}"))
        .collect();
    if !message.reviewers.is_empty() {
        trailers.push(format!("{REVIEWERS_KEY}: {}", message.reviewers.join(", ")));
    }
    if let Some(original) = &message.original {
        trailers.push(format!("{ORIGINAL_KEY}: {original}"));
    }
    trailers.extend(message.additional.iter().cloned());
    if !trailers.is_empty() {
        blocks.push(trailers.join("\n"));
    }

    blocks.join("\n\n")
}
