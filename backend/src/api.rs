//! Public API surface for the backend.
//!
//! This file consolidates the identifier newtypes and the DTO types for the
//! HTTP API. All types derive Serialize/Deserialize for JSON serialization.

pub use crate::routes::accounts::{AuthResponse, UserPayload};
pub use crate::routes::cars::{
    CarDetailResponse, CarListResponse, CarSummary, CatalogueFilters, PriceRange,
};
pub use crate::routes::comments::{CommentAuthor, CommentNode, CommentResponse, CommentTreeResponse};
pub use crate::routes::engagement::{FavoriteToggle, LikeToggle};
pub use crate::routes::profile::{ProfileComment, ProfileCommentCar, ProfileFavorite, ProfileResponse};

use serde::{Deserialize, Serialize};

/// Car make identifier (database primary key).
#[derive(
    Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct CarMakeId(pub i64);

/// Car identifier.
#[derive(
    Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct CarId(pub i64);

/// Comment identifier.
#[derive(
    Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct CommentId(pub i64);

/// User account identifier.
#[derive(
    Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct UserId(pub i64);

macro_rules! impl_id {
    ($($name:ident),+ $(,)?) => {
        $(
            impl $name {
                pub fn new(value: i64) -> Self {
                    $name(value)
                }

                pub fn value(&self) -> i64 {
                    self.0
                }
            }

            impl std::fmt::Display for $name {
                fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                    write!(f, "{}", self.0)
                }
            }

            impl From<$name> for i64 {
                fn from(id: $name) -> Self {
                    id.0
                }
            }
        )+
    };
}

impl_id!(CarMakeId, CarId, CommentId, UserId);
