//! Finite-state parser over classified lines.
//!
//! States follow the grammar top to bottom:
//!
//! ```text
//! Start ──issue──▶ Issues ──blank──▶ Gap ──text──▶ Summary ──blank──▶ Gap
//!   │                                 │
//!   └─text──▶ Summary                 └─trailer──▶ Trailers ──blank──▶ Tail
//! ```
//!
//! The parser either returns a complete message or the first
//! [`FormatError`]; it never hands back a partially filled message.

use crate::domain::error::FormatError;
use crate::domain::hash::CommitHash;
use crate::domain::message::{IssueRef, StructuredCommitMessage};
use crate::message::lexer::{tokenize, Token, TokenKind, TrailerKey};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Start,
    Issues,
    /// After at least one blank line, before the trailer block.
    Gap,
    Summary,
    Trailers,
    /// Blank line seen inside the trailer block; only blanks may follow.
    Tail,
}

/// Position inside the trailer block. Trailers must appear in this order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Phase {
    Contributors,
    Rest,
}

struct Parser {
    state: State,
    phase: Phase,
    seen_reviewers: bool,
    message: StructuredCommitMessage,
}

/// Parse `text` into a [`StructuredCommitMessage`].
pub fn parse(text: &str) -> Result<StructuredCommitMessage, FormatError> {
    let mut parser = Parser {
        state: State::Start,
        phase: Phase::Contributors,
        seen_reviewers: false,
        message: StructuredCommitMessage::default(),
    };
    for token in tokenize(text) {
        parser.feed(token)?;
    }
    parser.finish()
}

impl Parser {
    fn feed(&mut self, token: Token) -> Result<(), FormatError> {
        self.state = match (self.state, &token.kind) {
            (State::Start, TokenKind::Blank) => State::Start,
            (State::Start | State::Issues, TokenKind::Issue { id, description }) => {
                self.message
                    .issues
                    .push(IssueRef::new(id.as_str(), description.as_str()));
                State::Issues
            }
            (State::Start | State::Gap, TokenKind::Trailer { .. }) => {
                self.trailer(&token)?;
                State::Trailers
            }
            (State::Start, _) => {
                self.message.summary.push(token.text);
                State::Summary
            }

            (State::Issues, TokenKind::Blank) => State::Gap,
            (State::Issues, _) => {
                return Err(FormatError::UnterminatedIssues {
                    line: token.line,
                    text: token.text,
                })
            }

            (State::Gap, TokenKind::Blank) => State::Gap,
            (State::Gap, _) => {
                if !self.message.summary.is_empty() {
                    self.message.summary.push(String::new());
                }
                self.message.summary.push(token.text);
                State::Summary
            }

            (State::Summary, TokenKind::Blank) => State::Gap,
            (State::Summary, TokenKind::Trailer { .. }) => {
                return Err(FormatError::TrailerInSummary {
                    line: token.line,
                    text: token.text,
                })
            }
            (State::Summary, _) => {
                self.message.summary.push(token.text);
                State::Summary
            }

            (State::Trailers, TokenKind::Blank) => State::Tail,
            (State::Trailers, _) => {
                self.trailer(&token)?;
                State::Trailers
            }

            (State::Tail, TokenKind::Blank) => State::Tail,
            (State::Tail, _) => {
                return Err(FormatError::TrailingContent {
                    line: token.line,
                    text: token.text,
                })
            }
        };
        Ok(())
    }

    fn trailer(&mut self, token: &Token) -> Result<(), FormatError> {
        let (key, value) = match &token.kind {
            TokenKind::Trailer { key, value } => (*key, value.as_str()),
            _ if token.is_keyed() => {
                self.phase = Phase::Rest;
                self.message.additional.push(token.text.clone());
                return Ok(());
            }
            _ => {
                return Err(FormatError::MalformedTrailer {
                    line: token.line,
                    text: token.text.clone(),
                })
            }
        };

        match key {
            TrailerKey::Contributor => {
                if self.phase > Phase::Contributors {
                    return Err(out_of_order(key, token));
                }
                if value.is_empty() {
                    return Err(empty_identity(token));
                }
                self.message.contributors.push(value.to_string());
            }
            TrailerKey::Reviewers => {
                if self.seen_reviewers {
                    return Err(duplicate(key, token));
                }
                if self.phase > Phase::Contributors {
                    return Err(out_of_order(key, token));
                }
                for reviewer in value.split(',').map(str::trim) {
                    if reviewer.is_empty() {
                        return Err(empty_identity(token));
                    }
                    if !self.message.reviewers.iter().any(|r| r == reviewer) {
                        self.message.reviewers.push(reviewer.to_string());
                    }
                }
                self.seen_reviewers = true;
                self.phase = Phase::Rest;
            }
            TrailerKey::Original => {
                if self.message.original.is_some() {
                    return Err(duplicate(key, token));
                }
                let hash = CommitHash::parse(value).map_err(|_| FormatError::InvalidOriginal {
                    line: token.line,
                    text: token.text.clone(),
                })?;
                self.message.original = Some(hash);
                self.phase = Phase::Rest;
            }
        }
        Ok(())
    }

    fn finish(self) -> Result<StructuredCommitMessage, FormatError> {
        let m = &self.message;
        let empty = m.issues.is_empty()
            && m.summary.is_empty()
            && m.reviewers.is_empty()
            && m.contributors.is_empty()
            && m.additional.is_empty()
            && m.original.is_none();
        if empty {
            return Err(FormatError::Empty);
        }
        Ok(self.message)
    }
}

fn out_of_order(key: TrailerKey, token: &Token) -> FormatError {
    FormatError::TrailerOutOfOrder {
        line: token.line,
        key: key.as_str().to_string(),
        text: token.text.clone(),
    }
}

fn duplicate(key: TrailerKey, token: &Token) -> FormatError {
    FormatError::DuplicateTrailer {
        line: token.line,
        key: key.as_str().to_string(),
        text: token.text.clone(),
    }
}

fn empty_identity(token: &Token) -> FormatError {
    FormatError::EmptyIdentity {
        line: token.line,
        text: token.text.clone(),
    }
}
