//! Favorite and comment-like toggles against the local repository.

mod support;

use std::sync::Arc;

use dealership::api::{CarId, CommentId, UserId};
use dealership::db::repositories::LocalRepository;
use dealership::db::repository::{CommentRepository, EngagementRepository};
use dealership::models::NewComment;
use dealership::services::{toggle_comment_like, toggle_favorite, ServiceError};

async fn comment(repo: &LocalRepository, car_id: CarId, user_id: UserId) -> CommentId {
    repo.create_comment(&NewComment {
        car_id,
        user_id,
        parent_id: None,
        content: "First!".to_string(),
    })
    .await
    .unwrap()
    .id
}

#[tokio::test]
async fn test_favorite_toggled_twice_restores_state() {
    let repo = LocalRepository::new();
    let (ferrari, _) = support::ferrari_and_porsche(&repo).await;
    let ana = support::create_user(&repo, "ana", false).await;
    let bia = support::create_user(&repo, "bia", false).await;
    toggle_favorite(&repo, bia.id, ferrari).await.unwrap();

    let first = toggle_favorite(&repo, ana.id, ferrari).await.unwrap();
    assert!(first.favorited);
    assert_eq!(first.favorites, 2);

    let second = toggle_favorite(&repo, ana.id, ferrari).await.unwrap();
    assert!(!second.favorited);
    assert_eq!(second.favorites, 1);
    assert!(!repo.favorite_car_ids(ana.id).await.unwrap().contains(&ferrari));
}

#[tokio::test]
async fn test_favorite_on_missing_car_is_not_found() {
    let repo = LocalRepository::new();
    let ana = support::create_user(&repo, "ana", false).await;
    let err = toggle_favorite(&repo, ana.id, CarId::new(999)).await.unwrap_err();
    assert!(matches!(err, ServiceError::NotFound(_)));
}

#[tokio::test]
async fn test_like_parity() {
    let repo = LocalRepository::new();
    let (ferrari, _) = support::ferrari_and_porsche(&repo).await;
    let ana = support::create_user(&repo, "ana", false).await;
    let c1 = comment(&repo, ferrari, ana.id).await;

    for round in 1..=5 {
        let toggle = toggle_comment_like(&repo, ana.id, c1).await.unwrap();
        let odd = round % 2 == 1;
        assert_eq!(toggle.liked, odd, "round {}", round);
        assert_eq!(toggle.likes, i64::from(odd));
    }
}

#[tokio::test]
async fn test_like_then_unlike_counts() {
    let repo = LocalRepository::new();
    let (ferrari, _) = support::ferrari_and_porsche(&repo).await;
    let ana = support::create_user(&repo, "ana", false).await;
    let c1 = comment(&repo, ferrari, ana.id).await;

    let liked = toggle_comment_like(&repo, ana.id, c1).await.unwrap();
    assert!(liked.liked);
    assert_eq!(liked.likes, 1);

    let unliked = toggle_comment_like(&repo, ana.id, c1).await.unwrap();
    assert!(!unliked.liked);
    assert_eq!(unliked.likes, 0);
}

#[tokio::test]
async fn test_like_on_missing_comment_is_not_found() {
    let repo = LocalRepository::new();
    let ana = support::create_user(&repo, "ana", false).await;
    let err = toggle_comment_like(&repo, ana.id, CommentId::new(42))
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::NotFound(_)));
}

#[tokio::test]
async fn test_concurrent_favorite_toggles_settle_on_parity() {
    let repo = Arc::new(LocalRepository::new());
    let (ferrari, _) = support::ferrari_and_porsche(repo.as_ref()).await;
    let ana = support::create_user(repo.as_ref(), "ana", false).await.id;

    let handles: Vec<_> = (0..10)
        .map(|_| {
            let repo = repo.clone();
            tokio::spawn(async move { toggle_favorite(repo.as_ref(), ana, ferrari).await })
        })
        .collect();
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    // An even number of toggles leaves no favorite and never a duplicate row.
    assert_eq!(repo.count_favorites(ferrari).await.unwrap(), 0);
}
