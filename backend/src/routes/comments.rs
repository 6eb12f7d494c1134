use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::api::{CarId, CommentId, UserId};

pub const CAR_COMMENTS: &str = "/api/cars/{car_id}/comments/";
pub const CAR_COMMENT_DETAIL: &str = "/api/cars/{car_id}/comments/{comment_id}/";

/// Author block embedded in every comment node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommentAuthor {
    pub id: UserId,
    pub username: String,
    pub display_name: String,
}

/// One comment with its replies nested in creation order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommentNode {
    pub id: CommentId,
    pub car_id: CarId,
    pub parent_id: Option<CommentId>,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub like_count: i64,
    pub liked_by_current_user: bool,
    pub can_edit: bool,
    pub author: CommentAuthor,
    pub replies: Vec<CommentNode>,
}

impl CommentNode {
    /// Number of comments in this subtree, the node included.
    pub fn subtree_len(&self) -> usize {
        1 + self.replies.iter().map(CommentNode::subtree_len).sum::<usize>()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CommentTreeResponse {
    pub comments: Vec<CommentNode>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommentResponse {
    pub comment: CommentNode,
}

/// Body of a successful comment deletion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommentDeleted {
    pub status: String,
}

impl Default for CommentDeleted {
    fn default() -> Self {
        Self {
            status: "deleted".to_string(),
        }
    }
}
