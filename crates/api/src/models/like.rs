//! Like/dislike domain types.

use serde::Serialize;

use quillpost_core::{LikeId, PostId, UserId};

/// A user's reaction to a post. `status` is `true` for a like and `false`
/// for a dislike; a user has at most one reaction per post.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Like {
    pub id: LikeId,
    pub post_id: PostId,
    pub user_id: UserId,
    pub status: bool,
}

/// Reaction totals for a post.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct LikeInfo {
    pub likes_count: i64,
    pub dislikes_count: i64,
}

/// What a toggle did to the caller's reaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LikeOutcome {
    /// No reaction existed, one was added.
    Created,
    /// The opposite reaction existed and was flipped.
    Updated,
    /// The same reaction existed and was withdrawn.
    Removed,
}

impl LikeOutcome {
    /// Decide the toggle transition from the existing reaction, if any.
    #[must_use]
    pub const fn decide(existing: Option<bool>, requested: bool) -> Self {
        match existing {
            None => Self::Created,
            Some(current) if current == requested => Self::Removed,
            Some(_) => Self::Updated,
        }
    }
}
