//! Commit object names.

use serde::{Deserialize, Serialize};

use crate::domain::error::InvalidHash;

/// Length of a full hexadecimal commit object name.
pub const HASH_HEX_LEN: usize = 40;

/// A full commit hash: exactly 40 lowercase hexadecimal characters.
///
/// The inner field is private so a `CommitHash` is only ever built through
/// [`CommitHash::parse`] or `TryFrom<String>`, both of which validate.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CommitHash(String);

impl CommitHash {
    /// Validate `value` as a commit hash.
    ///
    /// Uppercase hex is rejected rather than normalized: a title naming
    /// `ABCD…` is not a backport reference.
    pub fn parse(value: &str) -> Result<Self, InvalidHash> {
        if is_commit_hash(value) {
            Ok(Self(value.to_string()))
        } else {
            Err(InvalidHash {
                value: value.to_string(),
            })
        }
    }

    /// Return the full hex string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Short form (first 12 hex chars).
    pub fn short(&self) -> &str {
        &self.0[..12]
    }
}

/// `true` when `value` is exactly 40 lowercase hex characters.
pub fn is_commit_hash(value: &str) -> bool {
    value.len() == HASH_HEX_LEN
        && value
            .bytes()
            .all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b))
}

impl TryFrom<String> for CommitHash {
    type Error = InvalidHash;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        if is_commit_hash(&value) {
            Ok(Self(value))
        } else {
            Err(InvalidHash { value })
        }
    }
}

impl From<CommitHash> for String {
    fn from(hash: CommitHash) -> Self {
        hash.0
    }
}

impl std::str::FromStr for CommitHash {
    type Err = InvalidHash;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl std::fmt::Display for CommitHash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
