//! Domain-level error taxonomy for the backport engine.

/// A token that is not a 40-character lowercase hex commit hash.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid commit hash: {value:?}")]
pub struct InvalidHash {
    pub value: String,
}

/// A commit message that violates the structured message grammar.
///
/// Line numbers are 1-based and refer to the input text.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FormatError {
    #[error("commit message is empty")]
    Empty,

    #[error("line {line}: expected an issue line or a blank line after the issues, got {text:?}")]
    UnterminatedIssues { line: usize, text: String },

    #[error("line {line}: trailer {text:?} must be separated from the summary by a blank line")]
    TrailerInSummary { line: usize, text: String },

    #[error("line {line}: expected a keyed trailer line, got {text:?}")]
    MalformedTrailer { line: usize, text: String },

    #[error("line {line}: {key} trailer is out of order: {text:?}")]
    TrailerOutOfOrder {
        line: usize,
        key: String,
        text: String,
    },

    #[error("line {line}: duplicate {key} trailer: {text:?}")]
    DuplicateTrailer {
        line: usize,
        key: String,
        text: String,
    },

    #[error("line {line}: empty identity in {text:?}")]
    EmptyIdentity { line: usize, text: String },

    #[error("line {line}: invalid Backport-of hash in {text:?}")]
    InvalidOriginal { line: usize, text: String },

    #[error("line {line}: unexpected content after the trailer block: {text:?}")]
    TrailingContent { line: usize, text: String },
}

impl FormatError {
    /// 1-based line the error points at, when it points at one.
    pub fn line(&self) -> Option<usize> {
        match self {
            FormatError::Empty => None,
            FormatError::UnterminatedIssues { line, .. }
            | FormatError::TrailerInSummary { line, .. }
            | FormatError::MalformedTrailer { line, .. }
            | FormatError::TrailerOutOfOrder { line, .. }
            | FormatError::DuplicateTrailer { line, .. }
            | FormatError::EmptyIdentity { line, .. }
            | FormatError::InvalidOriginal { line, .. }
            | FormatError::TrailingContent { line, .. } => Some(*line),
        }
    }
}
