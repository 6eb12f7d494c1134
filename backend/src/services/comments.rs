//! Comment operations on a car: list, create, read, edit and delete.
//!
//! Access checks follow a fixed order so that responses are predictable:
//! the target must exist first, then the caller must be allowed to act on
//! it, and only then is the submitted content validated.

use std::collections::HashSet;

use crate::api::{CarId, CommentId, CommentNode, CommentTreeResponse};
use crate::db::repository::{CatalogueRepository, CommentRepository};
use crate::models::{CommentAuthorRecord, CommentRecord, NewComment, User, Viewer};
use crate::routes::comments::CommentDeleted;

use super::comment_tree::{comment_node, load_comment_tree};
use super::error::{ServiceError, ServiceResult};

/// Fail with `NotFound` unless the car exists.
pub async fn ensure_car_exists<R>(repo: &R, car_id: CarId) -> ServiceResult<()>
where
    R: CatalogueRepository + ?Sized,
{
    if repo.car_exists(car_id).await? {
        Ok(())
    } else {
        Err(ServiceError::not_found("Car not found"))
    }
}

/// Trimmed comment text; blank content is rejected.
pub fn normalize_content(content: Option<&str>) -> ServiceResult<String> {
    let content = content.unwrap_or_default().trim();
    if content.is_empty() {
        return Err(ServiceError::validation("Comment content must not be empty"));
    }
    Ok(content.to_string())
}

/// The reply tree of a car.
pub async fn list_comments<R>(
    repo: &R,
    car_id: CarId,
    viewer: Option<Viewer>,
) -> ServiceResult<CommentTreeResponse>
where
    R: CatalogueRepository + CommentRepository + ?Sized,
{
    ensure_car_exists(repo, car_id).await?;
    let comments = load_comment_tree(repo, car_id, viewer).await?;
    Ok(CommentTreeResponse { comments })
}

/// Post a comment, optionally as a reply to `parent_id` on the same car.
///
/// The caller has already established that the car exists. Returns the new
/// node with no replies and no likes.
pub async fn create_comment<R>(
    repo: &R,
    car_id: CarId,
    author: &User,
    content: Option<&str>,
    parent_id: Option<CommentId>,
) -> ServiceResult<CommentNode>
where
    R: CommentRepository + ?Sized,
{
    let content = normalize_content(content)?;

    if let Some(parent_id) = parent_id {
        let parent_on_car = repo
            .get_comment(parent_id)
            .await?
            .is_some_and(|parent| parent.comment.car_id == car_id);
        if !parent_on_car {
            return Err(ServiceError::not_found("Parent comment not found"));
        }
    }

    let comment = repo
        .create_comment(&NewComment {
            car_id,
            user_id: author.id,
            parent_id,
            content,
        })
        .await
        .map_err(|e| {
            let missing = if parent_id.is_some() {
                "Car or parent comment not found"
            } else {
                "Car not found"
            };
            ServiceError::not_found_or_repository(e, missing)
        })?;

    log::info!(
        "User {} commented {} on car {} (parent: {:?})",
        author.id,
        comment.id,
        car_id,
        comment.parent_id
    );

    let record = CommentRecord {
        comment,
        author: CommentAuthorRecord {
            id: author.id,
            username: author.username.clone(),
            first_name: author.first_name.clone(),
            last_name: author.last_name.clone(),
        },
        like_count: 0,
    };
    Ok(comment_node(record, &HashSet::new(), Some(author.viewer())))
}

/// Fetch a comment that must belong to `car_id`.
pub async fn find_comment<R>(
    repo: &R,
    car_id: CarId,
    comment_id: CommentId,
) -> ServiceResult<CommentRecord>
where
    R: CommentRepository + ?Sized,
{
    repo.get_comment(comment_id)
        .await?
        .filter(|record| record.comment.car_id == car_id)
        .ok_or_else(|| ServiceError::not_found("Comment not found"))
}

/// Fail with `PermissionDenied` unless `viewer` is the author or staff.
pub fn authorize_edit(record: &CommentRecord, viewer: Viewer, action: &str) -> ServiceResult<()> {
    if viewer.can_edit(record.comment.user_id) {
        Ok(())
    } else {
        Err(ServiceError::permission_denied(format!(
            "You do not have permission to {} this comment",
            action
        )))
    }
}

async fn single_node<R>(
    repo: &R,
    record: CommentRecord,
    viewer: Option<Viewer>,
) -> ServiceResult<CommentNode>
where
    R: CommentRepository + ?Sized,
{
    let liked = match viewer {
        Some(v) => {
            let ids = repo
                .liked_comment_ids(v.user_id, record.comment.car_id)
                .await?;
            if ids.contains(&record.comment.id) {
                HashSet::from([record.comment.id])
            } else {
                HashSet::new()
            }
        }
        None => HashSet::new(),
    };
    // Replies are not included for single-comment responses.
    Ok(comment_node(record, &liked, viewer))
}

/// One comment as a node without its replies.
pub async fn comment_detail<R>(
    repo: &R,
    car_id: CarId,
    comment_id: CommentId,
    viewer: Option<Viewer>,
) -> ServiceResult<CommentNode>
where
    R: CommentRepository + ?Sized,
{
    let record = find_comment(repo, car_id, comment_id).await?;
    single_node(repo, record, viewer).await
}

/// Replace the content of `record`.
pub async fn update_comment<R>(
    repo: &R,
    record: CommentRecord,
    viewer: Viewer,
    content: Option<&str>,
) -> ServiceResult<CommentNode>
where
    R: CommentRepository + ?Sized,
{
    authorize_edit(&record, viewer, "edit")?;
    let content = normalize_content(content)?;

    let comment = repo
        .update_comment_content(record.comment.id, &content)
        .await?;
    log::info!("User {} edited comment {}", viewer.user_id, comment.id);

    let updated = CommentRecord { comment, ..record };
    single_node(repo, updated, Some(viewer)).await
}

/// Delete `record` along with its replies and likes.
pub async fn delete_comment<R>(
    repo: &R,
    record: &CommentRecord,
    viewer: Viewer,
) -> ServiceResult<CommentDeleted>
where
    R: CommentRepository + ?Sized,
{
    authorize_edit(record, viewer, "delete")?;
    if !repo.delete_comment(record.comment.id).await? {
        return Err(ServiceError::not_found("Comment not found"));
    }
    log::info!(
        "User {} deleted comment {} on car {}",
        viewer.user_id,
        record.comment.id,
        record.comment.car_id
    );
    Ok(CommentDeleted::default())
}
