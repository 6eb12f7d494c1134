use serde::{Deserialize, Serialize};

pub const TOGGLE_FAVORITE: &str = "/api/cars/{car_id}/favorite/";
pub const TOGGLE_COMMENT_LIKE: &str = "/api/comments/{comment_id}/like/";

/// State of a favorite after a toggle, with the car's favorite total.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FavoriteToggle {
    pub favorited: bool,
    pub favorites: i64,
}

/// State of a comment like after a toggle, with the comment's like total.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LikeToggle {
    pub liked: bool,
    pub likes: i64,
}
