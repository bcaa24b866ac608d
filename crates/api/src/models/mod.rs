//! Domain models for the blog.
//!
//! These are what the store traits hand back and what handlers serialize.
//! Database row types live next to their queries in `db`.

pub mod category;
pub mod comment;
pub mod like;
pub mod post;
pub mod user;

pub use category::{Category, CategoryFilter};
pub use comment::{Comment, CommentAuthor, CommentFilter, CommentWithAuthor, NewComment};
pub use like::{Like, LikeInfo, LikeOutcome};
pub use post::{NewPost, Post, PostChanges, PostDetail, PostFilter, SortOrder};
pub use user::{NewUser, User, UserChanges, UserFilter};
