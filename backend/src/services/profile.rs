//! The signed-in user's profile: favorites and authored comments.

use crate::api::{CarSummary, ProfileComment, ProfileCommentCar, ProfileFavorite, ProfileResponse, UserPayload};
use crate::db::repository::{CommentRepository, EngagementRepository};
use crate::models::User;

use super::error::ServiceResult;

/// Favorites and comments of `user`, both newest first.
pub async fn user_profile<R>(repo: &R, user: &User) -> ServiceResult<ProfileResponse>
where
    R: CommentRepository + EngagementRepository + ?Sized,
{
    let favorites = repo
        .favorites_for_user(user.id)
        .await?
        .into_iter()
        .map(|entry| ProfileFavorite {
            car: CarSummary::from_listing(&entry.listing, Some(true)),
            favorite_since: entry.favorite_since,
        })
        .collect();

    let comments = repo
        .comments_by_user(user.id)
        .await?
        .into_iter()
        .map(|record| ProfileComment {
            id: record.comment.id,
            car: ProfileCommentCar {
                id: record.comment.car_id,
                name: record.car_name,
                brand: record.make_name,
            },
            content: record.comment.content,
            created_at: record.comment.created_at,
            updated_at: record.comment.updated_at,
            likes: record.like_count,
            parent_id: record.comment.parent_id,
        })
        .collect();

    Ok(ProfileResponse {
        user: UserPayload::from(user),
        favorites,
        comments,
    })
}
