//! Favorite and comment-like membership rows.
//!
//! A row's existence is the boolean state; toggling inserts or deletes it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::catalogue::CarListing;
use crate::api::{CarId, CommentId, UserId};

/// A car favorited by a user. Unique on (user, car).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Favorite {
    pub id: i64,
    pub user_id: UserId,
    pub car_id: CarId,
    pub created_at: DateTime<Utc>,
}

/// A like on a comment. Unique on (user, comment).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommentLike {
    pub id: i64,
    pub user_id: UserId,
    pub comment_id: CommentId,
    pub created_at: DateTime<Utc>,
}

/// A user's favorite joined with the car listing it points at.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FavoriteListing {
    pub listing: CarListing,
    pub favorite_since: DateTime<Utc>,
}
