//! Comment rows and the joined records the tree builder consumes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::api::{CarId, CommentId, UserId};

/// A comment on a car. `parent_id` is fixed at creation time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    pub id: CommentId,
    pub car_id: CarId,
    pub user_id: UserId,
    pub parent_id: Option<CommentId>,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Data required to create a comment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewComment {
    pub car_id: CarId,
    pub user_id: UserId,
    pub parent_id: Option<CommentId>,
    pub content: String,
}

/// The slice of a user account shown next to a comment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommentAuthorRecord {
    pub id: UserId,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
}

impl CommentAuthorRecord {
    /// Full name when one is set, otherwise the username.
    pub fn display_name(&self) -> String {
        super::account::display_name(&self.first_name, &self.last_name, &self.username)
    }
}

/// A comment joined with its author and like count.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommentRecord {
    pub comment: Comment,
    pub author: CommentAuthorRecord,
    pub like_count: i64,
}

/// A comment written by a user, joined with the car it was left on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserCommentRecord {
    pub comment: Comment,
    pub car_name: String,
    pub make_name: String,
    pub like_count: i64,
}
