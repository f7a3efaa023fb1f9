//! Line classification for the commit message grammar.
//!
//! Every input line becomes exactly one [`Token`]. The lexer knows nothing
//! about block structure; it only answers "what could this line be".

use crate::domain::message::is_issue_id;

/// Recognized trailer keys with dedicated fields in the structured message.
pub const CONTRIBUTOR_KEY: &str = "Co-authored-by";
pub const REVIEWERS_KEY: &str = "Reviewed-by";
pub const ORIGINAL_KEY: &str = "Backport-of";

/// Trailer keys the parser maps onto structured fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrailerKey {
    Contributor,
    Reviewers,
    Original,
}

impl TrailerKey {
    fn from_key(key: &str) -> Option<Self> {
        match key {
            CONTRIBUTOR_KEY => Some(TrailerKey::Contributor),
            REVIEWERS_KEY => Some(TrailerKey::Reviewers),
            ORIGINAL_KEY => Some(TrailerKey::Original),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TrailerKey::Contributor => CONTRIBUTOR_KEY,
            TrailerKey::Reviewers => REVIEWERS_KEY,
            TrailerKey::Original => ORIGINAL_KEY,
        }
    }
}

/// Classification of a single line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenKind {
    Blank,
    /// `"<issueId>: <description>"`.
    Issue { id: String, description: String },
    /// A recognized trailer; `value` may be empty.
    Trailer { key: TrailerKey, value: String },
    /// Any other `Key: value` line with a non-empty value.
    Keyed,
    Text,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    /// 1-based line number.
    pub line: usize,
    /// The line with trailing whitespace removed.
    pub text: String,
    pub kind: TokenKind,
}

impl Token {
    /// `true` when the line is acceptable as a free-form trailer.
    pub fn is_keyed(&self) -> bool {
        match &self.kind {
            TokenKind::Keyed => true,
            TokenKind::Issue { id, .. } => is_trailer_key(id),
            _ => false,
        }
    }
}

/// Split `text` into classified tokens, one per line.
pub fn tokenize(text: &str) -> Vec<Token> {
    text.lines()
        .enumerate()
        .map(|(idx, raw)| {
            let line = raw.trim_end();
            Token {
                line: idx + 1,
                text: line.to_string(),
                kind: classify(line),
            }
        })
        .collect()
}

fn classify(line: &str) -> TokenKind {
    if line.trim().is_empty() {
        return TokenKind::Blank;
    }

    if let Some((id, description)) = line.split_once(": ") {
        let description = description.trim();
        if is_issue_id(id) && !description.is_empty() {
            return TokenKind::Issue {
                id: id.to_string(),
                description: description.to_string(),
            };
        }
    }

    match line.split_once(':') {
        Some((key, value)) if is_trailer_key(key) => {
            let value = value.trim();
            if let Some(key) = TrailerKey::from_key(key) {
                TokenKind::Trailer {
                    key,
                    value: value.to_string(),
                }
            } else if value.is_empty() {
                TokenKind::Text
            } else {
                TokenKind::Keyed
            }
        }
        _ => TokenKind::Text,
    }
}

/// Trailer keys: an ASCII letter followed by letters, digits or dashes.
fn is_trailer_key(key: &str) -> bool {
    let mut chars = key.chars();
    chars.next().is_some_and(|c| c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '-')
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kind(line: &str) -> TokenKind {
        classify(line)
    }

    #[test]
    fn classifies_issue_lines() {
        assert_eq!(
            kind("JDK-1: An issue"),
            TokenKind::Issue {
                id: "JDK-1".to_string(),
                description: "An issue".to_string()
            }
        );
        assert!(matches!(kind("8123: Fix crash"), TokenKind::Issue { .. }));
    }

    #[test]
    fn classifies_recognized_trailers() {
        assert_eq!(
            kind("Reviewed-by: alice, bob"),
            TokenKind::Trailer {
                key: TrailerKey::Reviewers,
                value: "alice, bob".to_string()
            }
        );
        assert_eq!(
            kind("Reviewed-by:"),
            TokenKind::Trailer {
                key: TrailerKey::Reviewers,
                value: String::new()
            }
        );
        assert!(matches!(
            kind("Co-authored-by: Jane <jane@example.com>"),
            TokenKind::Trailer {
                key: TrailerKey::Contributor,
                ..
            }
        ));
    }

    #[test]
    fn classifies_other_lines() {
        assert_eq!(kind("Signed-off-by: duke"), TokenKind::Keyed);
        assert_eq!(kind("Note:"), TokenKind::Text);
        assert_eq!(kind("just prose here"), TokenKind::Text);
        assert_eq!(kind("two words: are not a key"), TokenKind::Text);
        assert_eq!(kind("   "), TokenKind::Blank);
    }

    #[test]
    fn tokenize_numbers_lines_and_trims_trailing_whitespace() {
        let tokens = tokenize("JDK-1: An issue  \n\nReviewed-by: alice\r\n");
        assert_eq!(tokens.len(), 3);
        assert_eq!(tokens[0].line, 1);
        assert_eq!(tokens[0].text, "JDK-1: An issue");
        assert_eq!(tokens[1].kind, TokenKind::Blank);
        assert_eq!(tokens[2].line, 3);
        assert_eq!(tokens[2].text, "Reviewed-by: alice");
    }

    #[test]
    fn issue_shaped_keys_count_as_keyed() {
        let tokens = tokenize("JDK-1: An issue\n8123: numeric");
        assert!(tokens[0].is_keyed());
        assert!(!tokens[1].is_keyed());
    }
}
