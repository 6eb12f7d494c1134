//! Comment threads, permissions and the profile view through the services.

mod support;

use dealership::api::{CarId, CommentId};
use dealership::db::repositories::LocalRepository;
use dealership::db::repository::CommentRepository;
use dealership::services::comments;
use dealership::services::profile::user_profile;
use dealership::services::{toggle_comment_like, toggle_favorite, ServiceError};

#[tokio::test]
async fn test_reply_thread_and_can_edit_per_viewer() {
    let repo = LocalRepository::new();
    let (ferrari, _) = support::ferrari_and_porsche(&repo).await;
    let ana = support::create_user(&repo, "ana", false).await;
    let bia = support::create_user(&repo, "bia", false).await;

    let c1 = comments::create_comment(&repo, ferrari, &ana, Some("Stunning car"), None)
        .await
        .unwrap();
    let c2 = comments::create_comment(&repo, ferrari, &bia, Some(" Agreed "), Some(c1.id))
        .await
        .unwrap();
    assert_eq!(c2.content, "Agreed");
    assert_eq!(c2.parent_id, Some(c1.id));
    assert!(c2.replies.is_empty());

    let as_ana = comments::list_comments(&repo, ferrari, Some(ana.viewer()))
        .await
        .unwrap();
    assert_eq!(as_ana.comments.len(), 1);
    let root = &as_ana.comments[0];
    assert_eq!(root.id, c1.id);
    assert_eq!(root.replies.len(), 1);
    assert_eq!(root.replies[0].id, c2.id);
    assert!(root.can_edit);
    assert!(!root.replies[0].can_edit);

    let as_bia = comments::list_comments(&repo, ferrari, Some(bia.viewer()))
        .await
        .unwrap();
    assert!(!as_bia.comments[0].can_edit);
    assert!(as_bia.comments[0].replies[0].can_edit);

    let anonymous = comments::list_comments(&repo, ferrari, None).await.unwrap();
    assert!(!anonymous.comments[0].can_edit);
}

#[tokio::test]
async fn test_liked_flag_follows_viewer() {
    let repo = LocalRepository::new();
    let (ferrari, _) = support::ferrari_and_porsche(&repo).await;
    let ana = support::create_user(&repo, "ana", false).await;
    let bia = support::create_user(&repo, "bia", false).await;
    let c1 = comments::create_comment(&repo, ferrari, &ana, Some("Hi"), None)
        .await
        .unwrap();
    toggle_comment_like(&repo, bia.id, c1.id).await.unwrap();

    let as_bia = comments::list_comments(&repo, ferrari, Some(bia.viewer()))
        .await
        .unwrap();
    assert!(as_bia.comments[0].liked_by_current_user);
    assert_eq!(as_bia.comments[0].like_count, 1);

    let as_ana = comments::comment_detail(&repo, ferrari, c1.id, Some(ana.viewer()))
        .await
        .unwrap();
    assert!(!as_ana.liked_by_current_user);
    assert_eq!(as_ana.like_count, 1);
}

#[tokio::test]
async fn test_listing_comments_of_missing_car_is_not_found() {
    let repo = LocalRepository::new();
    let err = comments::list_comments(&repo, CarId::new(404), None)
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::NotFound(_)));
}

#[tokio::test]
async fn test_blank_content_is_rejected() {
    let repo = LocalRepository::new();
    let (ferrari, _) = support::ferrari_and_porsche(&repo).await;
    let ana = support::create_user(&repo, "ana", false).await;

    let err = comments::create_comment(&repo, ferrari, &ana, Some("   "), None)
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::Validation(_)));
    assert_eq!(repo.comment_count(), 0);
}

#[tokio::test]
async fn test_parent_must_be_on_same_car() {
    let repo = LocalRepository::new();
    let (ferrari, porsche) = support::ferrari_and_porsche(&repo).await;
    let ana = support::create_user(&repo, "ana", false).await;
    let on_porsche = comments::create_comment(&repo, porsche, &ana, Some("Fast"), None)
        .await
        .unwrap();

    let err = comments::create_comment(&repo, ferrari, &ana, Some("Reply"), Some(on_porsche.id))
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::NotFound(_)));

    let err = comments::create_comment(&repo, ferrari, &ana, Some("Reply"), Some(CommentId::new(999)))
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::NotFound(_)));
}

#[tokio::test]
async fn test_comment_must_belong_to_car_in_path() {
    let repo = LocalRepository::new();
    let (ferrari, porsche) = support::ferrari_and_porsche(&repo).await;
    let ana = support::create_user(&repo, "ana", false).await;
    let c1 = comments::create_comment(&repo, ferrari, &ana, Some("Hi"), None)
        .await
        .unwrap();

    let err = comments::find_comment(&repo, porsche, c1.id).await.unwrap_err();
    assert!(matches!(err, ServiceError::NotFound(_)));
    assert!(comments::find_comment(&repo, ferrari, c1.id).await.is_ok());
}

#[tokio::test]
async fn test_only_author_or_staff_may_edit() {
    let repo = LocalRepository::new();
    let (ferrari, _) = support::ferrari_and_porsche(&repo).await;
    let ana = support::create_user(&repo, "ana", false).await;
    let bia = support::create_user(&repo, "bia", false).await;
    let staff = support::create_user(&repo, "moderator", true).await;
    let c1 = comments::create_comment(&repo, ferrari, &ana, Some("Original"), None)
        .await
        .unwrap();

    let record = comments::find_comment(&repo, ferrari, c1.id).await.unwrap();
    let err = comments::update_comment(&repo, record.clone(), bia.viewer(), Some("Hijacked"))
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::PermissionDenied(_)));

    let err = comments::update_comment(&repo, record.clone(), ana.viewer(), Some(" "))
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::Validation(_)));

    let edited = comments::update_comment(&repo, record.clone(), ana.viewer(), Some(" Edited "))
        .await
        .unwrap();
    assert_eq!(edited.content, "Edited");
    assert!(edited.updated_at >= edited.created_at);

    let record = comments::find_comment(&repo, ferrari, c1.id).await.unwrap();
    let moderated = comments::update_comment(&repo, record, staff.viewer(), Some("Moderated"))
        .await
        .unwrap();
    assert_eq!(moderated.content, "Moderated");
    assert!(moderated.can_edit);
}

#[tokio::test]
async fn test_delete_cascades_to_replies_and_likes() {
    let repo = LocalRepository::new();
    let (ferrari, _) = support::ferrari_and_porsche(&repo).await;
    let ana = support::create_user(&repo, "ana", false).await;
    let bia = support::create_user(&repo, "bia", false).await;

    let c1 = comments::create_comment(&repo, ferrari, &ana, Some("Root"), None)
        .await
        .unwrap();
    let c2 = comments::create_comment(&repo, ferrari, &bia, Some("Reply"), Some(c1.id))
        .await
        .unwrap();
    comments::create_comment(&repo, ferrari, &ana, Some("Nested"), Some(c2.id))
        .await
        .unwrap();
    comments::create_comment(&repo, ferrari, &bia, Some("Other root"), None)
        .await
        .unwrap();
    toggle_comment_like(&repo, bia.id, c2.id).await.unwrap();

    let record = comments::find_comment(&repo, ferrari, c1.id).await.unwrap();
    let err = comments::delete_comment(&repo, &record, bia.viewer())
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::PermissionDenied(_)));

    let deleted = comments::delete_comment(&repo, &record, ana.viewer())
        .await
        .unwrap();
    assert_eq!(deleted.status, "deleted");
    assert_eq!(repo.comment_count(), 1);
    assert!(repo.get_comment(c2.id).await.unwrap().is_none());
    assert!(repo
        .liked_comment_ids(bia.id, ferrari)
        .await
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn test_profile_lists_newest_first() {
    let repo = LocalRepository::new();
    let (ferrari, porsche) = support::ferrari_and_porsche(&repo).await;
    let ana = support::create_user(&repo, "ana", false).await;

    toggle_favorite(&repo, ana.id, ferrari).await.unwrap();
    toggle_favorite(&repo, ana.id, porsche).await.unwrap();
    let first = comments::create_comment(&repo, ferrari, &ana, Some("First"), None)
        .await
        .unwrap();
    let second = comments::create_comment(&repo, porsche, &ana, Some("Second"), None)
        .await
        .unwrap();
    toggle_comment_like(&repo, ana.id, second.id).await.unwrap();

    let profile = user_profile(&repo, &ana).await.unwrap();
    assert_eq!(profile.user.username, "ana");

    let favorite_ids: Vec<CarId> = profile.favorites.iter().map(|f| f.car.id).collect();
    assert_eq!(favorite_ids, vec![porsche, ferrari]);
    assert_eq!(profile.favorites[0].car.is_favorite, Some(true));

    let comment_ids: Vec<CommentId> = profile.comments.iter().map(|c| c.id).collect();
    assert_eq!(comment_ids, vec![second.id, first.id]);
    assert_eq!(profile.comments[0].car.brand, "Porsche");
    assert_eq!(profile.comments[0].likes, 1);
    assert_eq!(profile.comments[1].car.name, "SF90 Stradale");

    let json = serde_json::to_value(&profile).unwrap();
    assert!(json["favorites"][0]["favorite_since"].is_string());
    assert_eq!(json["favorites"][0]["brand"], "Porsche");
}
