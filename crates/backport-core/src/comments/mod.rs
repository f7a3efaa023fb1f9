//! Status comment management.
//!
//! - [`marker::CommentMarker`]: closed set of invisible markers with typed payloads
//! - [`manager::CommentManager`]: idempotent post/update against the PR's comment list
//! - [`render`]: the user-visible texts

pub mod manager;
pub mod marker;
pub mod render;

pub use manager::{CommentAction, CommentManager};
pub use marker::{CommentMarker, MarkerKind};
