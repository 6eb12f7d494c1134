//! Comment repository trait.

use async_trait::async_trait;
use std::collections::HashSet;

use super::error::RepositoryResult;
use crate::api::{CarId, CommentId, UserId};
use crate::models::{Comment, CommentRecord, NewComment, UserCommentRecord};

/// Repository trait for threaded comments.
#[async_trait]
pub trait CommentRepository: Send + Sync {
    /// All comments on a car joined with author and like count.
    ///
    /// Ordered by `created_at` ascending with the id as tie-break. Like
    /// counts come from one aggregated query, not one query per comment.
    async fn list_comments_for_car(&self, car_id: CarId) -> RepositoryResult<Vec<CommentRecord>>;

    /// Ids of the comments on `car_id` liked by `user_id`.
    async fn liked_comment_ids(
        &self,
        user_id: UserId,
        car_id: CarId,
    ) -> RepositoryResult<HashSet<CommentId>>;

    /// Fetch a single comment with author and like count.
    async fn get_comment(&self, comment_id: CommentId) -> RepositoryResult<Option<CommentRecord>>;

    /// Insert a comment.
    ///
    /// # Errors
    /// * `NotFound` when the car, user or parent comment is gone
    async fn create_comment(&self, comment: &NewComment) -> RepositoryResult<Comment>;

    /// Replace the content of a comment and bump `updated_at`.
    async fn update_comment_content(
        &self,
        comment_id: CommentId,
        content: &str,
    ) -> RepositoryResult<Comment>;

    /// Delete a comment together with its replies (transitively) and their likes.
    ///
    /// Returns `false` when the comment did not exist.
    async fn delete_comment(&self, comment_id: CommentId) -> RepositoryResult<bool>;

    /// Comments written by a user, newest first, with car and make names.
    async fn comments_by_user(&self, user_id: UserId) -> RepositoryResult<Vec<UserCommentRecord>>;
}
