//! Invisible comment markers.
//!
//! A marker is a single-line HTML comment the review platform does not
//! render. It is the only way the bot recognizes its own earlier output:
//!
//! ```text
//! <!-- backport <hash> -->
//! <!-- backport <hash> reviewers=alice,bob -->
//! <!-- backport error -->
//! <!-- backport ready -->
//! <!-- backport integrated <hash> -->
//! ```

use serde::{Deserialize, Serialize};

use crate::domain::hash::CommitHash;

const OPEN: &str = "<!-- ";
const CLOSE: &str = " -->";
const DISCRIMINATOR: &str = "backport";
const REVIEWERS_PREFIX: &str = "reviewers=";

/// Logical status a comment carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MarkerKind {
    BackportInfo,
    BackportError,
    Readiness,
    Integrated,
}

impl MarkerKind {
    /// Only the info comment tracks live state and is edited in place.
    pub fn is_live(&self) -> bool {
        matches!(self, MarkerKind::BackportInfo)
    }
}

impl std::fmt::Display for MarkerKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            MarkerKind::BackportInfo => "backport_info",
            MarkerKind::BackportError => "backport_error",
            MarkerKind::Readiness => "readiness",
            MarkerKind::Integrated => "integrated",
        };
        f.write_str(s)
    }
}

/// A marker with its typed payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommentMarker {
    /// Original hash plus the reviewer snapshot the comment was rendered for.
    BackportInfo {
        original: CommitHash,
        reviewers: Vec<String>,
    },
    BackportError,
    Readiness,
    Integrated { pushed: CommitHash },
}

impl CommentMarker {
    pub fn kind(&self) -> MarkerKind {
        match self {
            CommentMarker::BackportInfo { .. } => MarkerKind::BackportInfo,
            CommentMarker::BackportError => MarkerKind::BackportError,
            CommentMarker::Readiness => MarkerKind::Readiness,
            CommentMarker::Integrated { .. } => MarkerKind::Integrated,
        }
    }

    /// Render the marker token.
    pub fn encode(&self) -> String {
        let inner = match self {
            CommentMarker::BackportInfo {
                original,
                reviewers,
            } if reviewers.is_empty() => format!("{DISCRIMINATOR} {original}"),
            CommentMarker::BackportInfo {
                original,
                reviewers,
            } => {
                let encoded: Vec<String> = reviewers.iter().map(|r| escape(r)).collect();
                format!(
                    "{DISCRIMINATOR} {original} {REVIEWERS_PREFIX}{}",
                    encoded.join(",")
                )
            }
            CommentMarker::BackportError => format!("{DISCRIMINATOR} error"),
            CommentMarker::Readiness => format!("{DISCRIMINATOR} ready"),
            CommentMarker::Integrated { pushed } => format!("{DISCRIMINATOR} integrated {pushed}"),
        };
        format!("{OPEN}{inner}{CLOSE}")
    }

    /// Decode the inner text of a single marker token.
    fn decode_inner(inner: &str) -> Option<Self> {
        let mut words = inner.split_whitespace();
        if words.next()? != DISCRIMINATOR {
            return None;
        }
        let marker = match words.next()? {
            "error" => CommentMarker::BackportError,
            "ready" => CommentMarker::Readiness,
            "integrated" => CommentMarker::Integrated {
                pushed: CommitHash::parse(words.next()?).ok()?,
            },
            hash => {
                let original = CommitHash::parse(hash).ok()?;
                let reviewers = match words.next() {
                    None => Vec::new(),
                    Some(list) => list
                        .strip_prefix(REVIEWERS_PREFIX)?
                        .split(',')
                        .filter(|r| !r.is_empty())
                        .map(unescape)
                        .collect::<Option<Vec<_>>>()?,
                };
                CommentMarker::BackportInfo {
                    original,
                    reviewers,
                }
            }
        };
        if words.next().is_some() {
            return None;
        }
        Some(marker)
    }

    /// Find the backport marker in a comment body.
    ///
    /// The manager appends the marker after the text, so the last valid
    /// token wins over anything quoted earlier in the body.
    pub fn find(body: &str) -> Option<Self> {
        let mut found = None;
        let mut cursor = body;
        while let Some(start) = cursor.find(OPEN) {
            let after_open = &cursor[start + OPEN.len()..];
            let Some(end) = after_open.find(CLOSE) else {
                break;
            };
            let inner = &after_open[..end];
            if !inner.contains('\n') {
                if let Some(marker) = Self::decode_inner(inner) {
                    found = Some(marker);
                }
            }
            cursor = &after_open[end + CLOSE.len()..];
        }
        found
    }
}

impl std::fmt::Display for CommentMarker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.encode())
    }
}

/// Percent-encode everything outside a conservative identity alphabet so a
/// reviewer name can never close the HTML comment or split the list.
fn escape(identity: &str) -> String {
    let mut out = String::with_capacity(identity.len());
    for b in identity.bytes() {
        if b.is_ascii_alphanumeric() || matches!(b, b'.' | b'_' | b'-' | b'@' | b'+') {
            out.push(b as char);
        } else {
            out.push_str(&format!("%{b:02X}"));
        }
    }
    out
}

fn unescape(encoded: &str) -> Option<String> {
    let bytes = encoded.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' {
            let hex = encoded.get(i + 1..i + 3)?;
            out.push(u8::from_str_radix(hex, 16).ok()?);
            i += 3;
        } else {
            out.push(bytes[i]);
            i += 1;
        }
    }
    String::from_utf8(out).ok()
}
