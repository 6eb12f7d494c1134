//! Comment tree construction.
//!
//! Comments are stored flat with an optional `parent_id`. The builder turns
//! the flat, creation-ordered rows of one car into a forest of
//! [`CommentNode`]s without recursion or back-references:
//!
//! 1. every record gets an arena slot, indexed through an id → slot map;
//! 2. a record links to its parent only when the parent sits in an *earlier*
//!    slot on the same car, so links always point backwards and cycles cannot
//!    form; anything else (missing, self, cross-car parent) becomes a root;
//! 3. slots are drained from last to first, each finished node moving into
//!    its parent's pending replies, which keeps everything O(n).

use std::collections::{HashMap, HashSet};

use crate::api::{CarId, CommentAuthor, CommentId, CommentNode};
use crate::db::repository::CommentRepository;
use crate::models::{CommentRecord, Viewer};

use super::error::ServiceResult;

/// Convert one record into a node with no replies.
pub fn comment_node(
    record: CommentRecord,
    liked: &HashSet<CommentId>,
    viewer: Option<Viewer>,
) -> CommentNode {
    let display_name = record.author.display_name();
    let CommentRecord {
        comment,
        author,
        like_count,
    } = record;

    CommentNode {
        id: comment.id,
        car_id: comment.car_id,
        parent_id: comment.parent_id,
        content: comment.content,
        created_at: comment.created_at,
        updated_at: comment.updated_at,
        like_count,
        liked_by_current_user: liked.contains(&comment.id),
        can_edit: viewer.is_some_and(|v| v.can_edit(comment.user_id)),
        author: CommentAuthor {
            id: author.id,
            username: author.username,
            display_name,
        },
        replies: Vec::new(),
    }
}

/// Build the reply forest for one car.
///
/// `records` must be in creation order (created_at, then id), which is what
/// [`CommentRepository::list_comments_for_car`] returns. Roots and every
/// reply list keep that order.
pub fn build_comment_tree(
    records: Vec<CommentRecord>,
    liked: &HashSet<CommentId>,
    viewer: Option<Viewer>,
) -> Vec<CommentNode> {
    let index: HashMap<CommentId, usize> = records
        .iter()
        .enumerate()
        .map(|(slot, r)| (r.comment.id, slot))
        .collect();

    let parents: Vec<Option<usize>> = records
        .iter()
        .enumerate()
        .map(|(slot, r)| {
            r.comment
                .parent_id
                .and_then(|pid| index.get(&pid).copied())
                .filter(|&p| p < slot && records[p].comment.car_id == r.comment.car_id)
        })
        .collect();

    let mut arena: Vec<Option<CommentNode>> = records
        .into_iter()
        .map(|r| Some(comment_node(r, liked, viewer)))
        .collect();
    let mut pending: Vec<Vec<CommentNode>> = vec![Vec::new(); arena.len()];
    let mut roots = Vec::new();

    for slot in (0..arena.len()).rev() {
        let Some(mut node) = arena[slot].take() else {
            continue;
        };
        // Children were pushed last-first.
        node.replies = std::mem::take(&mut pending[slot]);
        node.replies.reverse();

        match parents[slot] {
            Some(parent) => pending[parent].push(node),
            None => roots.push(node),
        }
    }

    roots.reverse();
    roots
}

/// Load and assemble the comment tree of `car_id` for `viewer`.
///
/// The caller is responsible for checking that the car exists.
pub async fn load_comment_tree<R>(
    repo: &R,
    car_id: CarId,
    viewer: Option<Viewer>,
) -> ServiceResult<Vec<CommentNode>>
where
    R: CommentRepository + ?Sized,
{
    let records = repo.list_comments_for_car(car_id).await?;
    let liked = match viewer {
        Some(v) => repo.liked_comment_ids(v.user_id, car_id).await?,
        None => HashSet::new(),
    };

    let total = records.len();
    let tree = build_comment_tree(records, &liked, viewer);
    log::debug!(
        "Built comment tree for car {}: {} comments, {} roots",
        car_id,
        total,
        tree.len()
    );
    Ok(tree)
}

#[cfg(test)]
#[path = "comment_tree_tests.rs"]
mod tests;
