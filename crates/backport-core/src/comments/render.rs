//! Comment texts. Markers are appended by the manager, not here.

use crate::domain::error::FormatError;
use crate::domain::hash::CommitHash;
use crate::message::serialize;
use crate::synthesizer::Synthesis;

pub fn backport_info(original: &CommitHash, synthesis: &Synthesis) -> String {
    format!(
        "This backport pull request has now been updated with {} from the original commit `{}`.\n\n\
         The commit message that will be pushed is:\n\n```\n{}\n```",
        synthesis.status,
        original,
        serialize(&synthesis.message)
    )
}

pub fn reference_not_found(reference: &CommitHash) -> String {
    format!(
        ":warning: could not find any commit with hash `{reference}`. \
         Please update the title with the hash for an existing commit."
    )
}

pub fn malformed_original(original: &CommitHash, error: &FormatError) -> String {
    format!(
        ":warning: the commit message of the original commit `{original}` could not be parsed: {error}. \
         A backport commit message cannot be derived from it."
    )
}

pub fn readiness(integrate_command: &str) -> String {
    format!(
        "This change now passes all *automated* pre-integration checks.\n\n\
         Type `{integrate_command}` in a new comment to proceed."
    )
}

pub fn integrated(pushed: &CommitHash) -> String {
    format!("Integration complete. Pushed as commit {pushed}.")
}
