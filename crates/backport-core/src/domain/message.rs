//! Structured commit message model.

use serde::{Deserialize, Serialize};

use crate::domain::hash::CommitHash;

/// A reference to an issue-tracker entry, rendered as `"<id>: <description>"`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssueRef {
    pub id: String,
    pub description: String,
}

impl IssueRef {
    pub fn new(id: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            description: description.into(),
        }
    }

    /// The canonical `"<id>: <description>"` form, also used as a PR title.
    pub fn headline(&self) -> String {
        format!("{}: {}", self.id, self.description)
    }
}

/// `true` when `id` looks like an issue key: an optional `PROJECT-` prefix
/// (uppercase letter, then uppercase letters or digits) followed by digits.
///
/// Keeping the key shape narrow is what separates issue lines such as
/// `JDK-8123: Fix crash` from keyed trailers such as `Reviewed-by: alice`.
pub fn is_issue_id(id: &str) -> bool {
    let number = match id.rsplit_once('-') {
        Some((project, number)) => {
            let mut chars = project.chars();
            let head_ok = chars.next().is_some_and(|c| c.is_ascii_uppercase());
            let tail_ok = chars.all(|c| c.is_ascii_uppercase() || c.is_ascii_digit());
            if !(head_ok && tail_ok) {
                return false;
            }
            number
        }
        None => id,
    };
    !number.is_empty() && number.bytes().all(|b| b.is_ascii_digit())
}

/// A commit message decomposed into its grammar blocks.
///
/// `summary` holds the paragraph lines in order; paragraphs are separated by
/// a single empty string entry and the list never starts or ends with one.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructuredCommitMessage {
    pub issues: Vec<IssueRef>,
    pub summary: Vec<String>,
    pub reviewers: Vec<String>,
    pub contributors: Vec<String>,
    pub additional: Vec<String>,
    pub original: Option<CommitHash>,
}

impl StructuredCommitMessage {
    /// `true` when at least one issue is referenced.
    pub fn is_issue_tracked(&self) -> bool {
        !self.issues.is_empty()
    }

    /// The first referenced issue, used as the headline of the change.
    pub fn primary_issue(&self) -> Option<&IssueRef> {
        self.issues.first()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn issue_ids_with_and_without_project() {
        assert!(is_issue_id("JDK-1"));
        assert!(is_issue_id("8123"));
        assert!(is_issue_id("SKARA2-77"));
        assert!(!is_issue_id("Reviewed-by"));
        assert!(!is_issue_id("jdk-1"));
        assert!(!is_issue_id("JDK-"));
        assert!(!is_issue_id("-12"));
        assert!(!is_issue_id(""));
    }

    #[test]
    fn headline_joins_id_and_description() {
        let issue = IssueRef::new("JDK-1", "An issue");
        assert_eq!(issue.headline(), "JDK-1: An issue");
    }

    #[test]
    fn primary_issue_is_first_mention() {
        let msg = StructuredCommitMessage {
            issues: vec![
                IssueRef::new("JDK-1", "An issue"),
                IssueRef::new("JDK-2", "Another issue"),
            ],
            ..Default::default()
        };
        assert!(msg.is_issue_tracked());
        assert_eq!(msg.primary_issue().map(|i| i.id.as_str()), Some("JDK-1"));
    }
}
