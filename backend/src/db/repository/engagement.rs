//! Favorite and comment-like repository trait.
//!
//! Membership is the existence of a row. Inserts must be rejected with
//! [`RepositoryError::ConflictError`](super::RepositoryError::ConflictError)
//! when the (user, target) pair already exists; the toggle engine relies on it.

use async_trait::async_trait;
use std::collections::HashSet;

use super::error::RepositoryResult;
use crate::api::{CarId, CommentId, UserId};
use crate::models::{CommentLike, Favorite, FavoriteListing};

#[async_trait]
pub trait EngagementRepository: Send + Sync {
    // ==================== Favorites ====================

    /// Insert a favorite row.
    ///
    /// # Errors
    /// * `ConflictError` when the user already favorited the car
    /// * `NotFound` when the car or user does not exist
    async fn insert_favorite(&self, user_id: UserId, car_id: CarId) -> RepositoryResult<Favorite>;

    /// Delete a favorite row. Returns whether a row was removed.
    async fn delete_favorite(&self, user_id: UserId, car_id: CarId) -> RepositoryResult<bool>;

    async fn count_favorites(&self, car_id: CarId) -> RepositoryResult<i64>;

    /// Car ids favorited by a user.
    async fn favorite_car_ids(&self, user_id: UserId) -> RepositoryResult<HashSet<CarId>>;

    /// A user's favorites joined with their listings, newest favorite first.
    async fn favorites_for_user(&self, user_id: UserId) -> RepositoryResult<Vec<FavoriteListing>>;

    // ==================== Comment likes ====================

    /// Insert a like row.
    ///
    /// # Errors
    /// * `ConflictError` when the user already liked the comment
    /// * `NotFound` when the comment or user does not exist
    async fn insert_comment_like(
        &self,
        user_id: UserId,
        comment_id: CommentId,
    ) -> RepositoryResult<CommentLike>;

    /// Delete a like row. Returns whether a row was removed.
    async fn delete_comment_like(
        &self,
        user_id: UserId,
        comment_id: CommentId,
    ) -> RepositoryResult<bool>;

    async fn count_comment_likes(&self, comment_id: CommentId) -> RepositoryResult<i64>;
}
