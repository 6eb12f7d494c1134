use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::accounts::UserPayload;
use super::cars::CarSummary;
use crate::api::{CarId, CommentId};

pub const USER_PROFILE: &str = "/api/user/profile/";

/// A favorited car with the time it was favorited.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileFavorite {
    #[serde(flatten)]
    pub car: CarSummary,
    pub favorite_since: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileCommentCar {
    pub id: CarId,
    pub name: String,
    pub brand: String,
}

/// A comment written by the profile owner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileComment {
    pub id: CommentId,
    pub car: ProfileCommentCar,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub likes: i64,
    pub parent_id: Option<CommentId>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileResponse {
    pub user: UserPayload,
    pub favorites: Vec<ProfileFavorite>,
    pub comments: Vec<ProfileComment>,
}
