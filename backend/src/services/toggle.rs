//! Favorite and comment-like toggles.
//!
//! A toggle never reads the membership first. It tries the insert; a
//! conflict means the row is there, so it deletes instead. If that delete
//! finds nothing, a concurrent request removed the row in between and the
//! insert is tried again. Correctness rests on the unique indexes, not on
//! in-process locks, so it holds across server instances.

use std::future::Future;

use crate::api::{CarId, CommentId, FavoriteToggle, LikeToggle, UserId};
use crate::db::repository::{
    CatalogueRepository, CommentRepository, EngagementRepository, ErrorContext, RepositoryError,
    RepositoryResult,
};

use super::error::{ServiceError, ServiceResult};

/// Insert/delete rounds before giving up under contention.
pub const MAX_TOGGLE_ATTEMPTS: usize = 3;

/// Flip membership using `insert` and `delete`.
///
/// Returns the new state: `true` when a row now exists.
async fn flip<I, IF, D, DF>(operation: &str, mut insert: I, mut delete: D) -> RepositoryResult<bool>
where
    I: FnMut() -> IF,
    IF: Future<Output = RepositoryResult<()>>,
    D: FnMut() -> DF,
    DF: Future<Output = RepositoryResult<bool>>,
{
    for attempt in 1..=MAX_TOGGLE_ATTEMPTS {
        match insert().await {
            Ok(()) => return Ok(true),
            Err(e) if e.is_conflict() => {
                if delete().await? {
                    return Ok(false);
                }
                log::debug!(
                    "{}: row vanished between conflict and delete (attempt {})",
                    operation,
                    attempt
                );
            }
            Err(e) => return Err(e),
        }
    }

    Err(RepositoryError::TransactionError {
        message: format!("Toggle did not settle after {} attempts", MAX_TOGGLE_ATTEMPTS),
        context: ErrorContext::new(operation).retryable(),
    })
}

/// Toggle `user_id`'s favorite on `car_id` and return the new state and total.
///
/// # Errors
/// * `NotFound` when the car does not exist
pub async fn toggle_favorite<R>(
    repo: &R,
    user_id: UserId,
    car_id: CarId,
) -> ServiceResult<FavoriteToggle>
where
    R: CatalogueRepository + EngagementRepository + ?Sized,
{
    if !repo.car_exists(car_id).await? {
        return Err(ServiceError::not_found("Car not found"));
    }

    let favorited = flip(
        "toggle_favorite",
        move || async move { repo.insert_favorite(user_id, car_id).await.map(|_| ()) },
        move || repo.delete_favorite(user_id, car_id),
    )
    .await
    .map_err(|e| ServiceError::not_found_or_repository(e, "Car not found"))?;

    let favorites = repo.count_favorites(car_id).await?;
    log::info!(
        "User {} {} car {} ({} favorites)",
        user_id,
        if favorited { "favorited" } else { "unfavorited" },
        car_id,
        favorites
    );
    Ok(FavoriteToggle {
        favorited,
        favorites,
    })
}

/// Toggle `user_id`'s like on `comment_id` and return the new state and total.
///
/// # Errors
/// * `NotFound` when the comment does not exist
pub async fn toggle_comment_like<R>(
    repo: &R,
    user_id: UserId,
    comment_id: CommentId,
) -> ServiceResult<LikeToggle>
where
    R: CommentRepository + EngagementRepository + ?Sized,
{
    if repo.get_comment(comment_id).await?.is_none() {
        return Err(ServiceError::not_found("Comment not found"));
    }

    let liked = flip(
        "toggle_comment_like",
        move || async move {
            repo.insert_comment_like(user_id, comment_id)
                .await
                .map(|_| ())
        },
        move || repo.delete_comment_like(user_id, comment_id),
    )
    .await
    .map_err(|e| ServiceError::not_found_or_repository(e, "Comment not found"))?;

    let likes = repo.count_comment_likes(comment_id).await?;
    Ok(LikeToggle { liked, likes })
}
