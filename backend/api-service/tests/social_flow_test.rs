//! End-to-end service flows against a real PostgreSQL.
//!
//! Requires Docker. Run with `cargo test -- --ignored`.

mod common;

use campus_crush_api::db::post_repo;
use campus_crush_api::error::AppError;
use campus_crush_api::models::comment::{CommentCreate, CommentUpdate};
use campus_crush_api::models::friendship::FriendshipStatus;
use campus_crush_api::models::reaction::ReactionCreate;
use campus_crush_api::models::Page;
use campus_crush_api::ops::migrations::verify;
use campus_crush_api::ops::purge::delete_user_by_email;
use campus_crush_api::services::{
    CommentService, FeedService, FriendshipService, MediaStorage, NotificationService,
    PostService, ReactionService,
};
use common::{create_user, setup_test_db};
use serial_test::serial;
use tempfile::TempDir;
use uuid::Uuid;

const FIRST_PAGE: Page = Page { skip: 0, limit: 20 };

#[actix_rt::test]
#[ignore]
#[serial]
async fn test_migrations_create_expected_schema() {
    let pool = setup_test_db().await.expect("Failed to set up database");

    let report = verify(&pool).await.unwrap();
    assert!(report.is_ok(), "unexpected schema state: {:?}", report);
}

#[actix_rt::test]
#[ignore]
#[serial]
async fn test_friend_request_lifecycle() {
    let pool = setup_test_db().await.expect("Failed to set up database");
    let alice = create_user(&pool, "alice").await;
    let bob = create_user(&pool, "bob").await;
    let friendships = FriendshipService::new(pool.clone());

    let request = friendships.send_request(&alice, bob.id).await.unwrap();
    assert_eq!(request.status, "pending");

    let duplicate = friendships.send_request(&alice, bob.id).await.unwrap_err();
    assert!(matches!(duplicate, AppError::BadRequest(_)));
    let reverse = friendships.send_request(&bob, alice.id).await.unwrap_err();
    assert!(matches!(reverse, AppError::BadRequest(_)));

    let status = friendships.status(alice.id, bob.id).await.unwrap();
    assert_eq!(status.status, FriendshipStatus::RequestSent);
    assert_eq!(status.request_id, Some(request.id));

    // Only the receiver may answer.
    let forbidden = friendships.respond(&alice, request.id, "accepted").await.unwrap_err();
    assert!(matches!(forbidden, AppError::Forbidden(_)));

    let accepted = friendships.respond(&bob, request.id, "accepted").await.unwrap();
    assert_eq!(accepted.status, "accepted");
    assert_eq!(
        friendships.status(bob.id, alice.id).await.unwrap().status,
        FriendshipStatus::Friends
    );
    assert_eq!(friendships.friends(alice.id).await.unwrap().len(), 1);
    assert_eq!(friendships.friends(bob.id).await.unwrap().len(), 1);

    let again = friendships.respond(&bob, request.id, "rejected").await.unwrap_err();
    assert!(matches!(again, AppError::BadRequest(_)));

    let inbox = NotificationService::new(pool.clone())
        .list_for_user(alice.id, false, 100, 0)
        .await
        .unwrap();
    assert!(inbox.iter().any(|n| n.notification_type == "friend_accepted"));

    friendships.remove_friend(alice.id, bob.id).await.unwrap();
    assert_eq!(
        friendships.status(alice.id, bob.id).await.unwrap().status,
        FriendshipStatus::NotFriends
    );
    assert!(friendships.friends(bob.id).await.unwrap().is_empty());
}

#[actix_rt::test]
#[ignore]
#[serial]
async fn test_posts_comments_reactions_and_feed() {
    let pool = setup_test_db().await.expect("Failed to set up database");
    let uploads = TempDir::new().unwrap();
    let storage = MediaStorage::local(uploads.path(), "http://localhost:8000");

    let alice = create_user(&pool, "alice").await;
    let bob = create_user(&pool, "bob").await;
    let friendships = FriendshipService::new(pool.clone());
    let request = friendships.send_request(&alice, bob.id).await.unwrap();
    friendships.respond(&bob, request.id, "accepted").await.unwrap();

    let posts = PostService::new(pool.clone());
    let post = posts
        .create(&storage, bob.id, "Library is packed today", None)
        .await
        .unwrap();

    let empty = posts.create(&storage, bob.id, "   ", None).await.unwrap_err();
    assert!(matches!(empty, AppError::ValidationError(_)));

    let reactions = ReactionService::new(pool.clone());
    reactions
        .react(&alice, post.id, &ReactionCreate { reaction_type: "like".to_string() })
        .await
        .unwrap();
    let updated = reactions
        .react(&alice, post.id, &ReactionCreate { reaction_type: "love".to_string() })
        .await
        .unwrap();
    assert_eq!(updated.reaction_type, "love");
    let counts = reactions.counts(post.id).await.unwrap();
    assert_eq!(counts.len(), 1);
    assert_eq!(counts[0].count, 1);

    let comments = CommentService::new(pool.clone());
    let top = comments
        .create(
            &alice,
            post.id,
            CommentCreate { content: "Same here".to_string(), parent_id: None },
        )
        .await
        .unwrap();
    comments
        .create(
            &bob,
            post.id,
            CommentCreate { content: "Third floor is quiet".to_string(), parent_id: Some(top.id) },
        )
        .await
        .unwrap();

    let thread = comments.list(post.id, FIRST_PAGE).await.unwrap();
    assert_eq!(thread.len(), 1);
    assert_eq!(thread[0].replies.len(), 1);
    assert_eq!(thread[0].comment.replies_count, 1);

    // Bob gets one like and one comment notification; his own reply is skipped.
    let inbox = NotificationService::new(pool.clone())
        .list_for_user(bob.id, false, 100, 0)
        .await
        .unwrap();
    let likes = inbox.iter().filter(|n| n.notification_type == "post_like").count();
    let comment_notes: Vec<_> = inbox
        .iter()
        .filter(|n| n.notification_type == "post_comment")
        .collect();
    assert_eq!(likes, 1);
    assert_eq!(comment_notes.len(), 1);
    assert_eq!(comment_notes[0].post_id, Some(post.id));

    let feed = FeedService::new(pool.clone()).home_feed(alice.id, FIRST_PAGE).await.unwrap();
    assert_eq!(feed.total, 1);
    assert!(!feed.has_more);
    let item = &feed.items[0];
    assert_eq!(item.post.id, post.id);
    assert!(item.has_reacted);
    assert_eq!(item.reaction_type.as_deref(), Some("love"));
    assert_eq!(item.comment_count, 2);

    let not_owner = posts.delete(&storage, alice.id, post.id).await.unwrap_err();
    assert!(matches!(not_owner, AppError::Forbidden(_)));
    posts.delete(&storage, bob.id, post.id).await.unwrap();
    assert!(matches!(posts.get(post.id).await.unwrap_err(), AppError::NotFound(_)));
}

#[actix_rt::test]
#[ignore]
#[serial]
async fn test_delete_user_removes_related_rows() {
    let pool = setup_test_db().await.expect("Failed to set up database");
    let uploads = TempDir::new().unwrap();
    let storage = MediaStorage::local(uploads.path(), "http://localhost:8000");

    let alice = create_user(&pool, "alice").await;
    let bob = create_user(&pool, "bob").await;
    let friendships = FriendshipService::new(pool.clone());
    let request = friendships.send_request(&alice, bob.id).await.unwrap();
    friendships.respond(&bob, request.id, "accepted").await.unwrap();

    let post = PostService::new(pool.clone())
        .create(&storage, alice.id, "Hello campus", None)
        .await
        .unwrap();
    ReactionService::new(pool.clone())
        .react(&bob, post.id, &ReactionCreate { reaction_type: "wow".to_string() })
        .await
        .unwrap();

    let report = delete_user_by_email(&pool, uploads.path(), "ALICE@campus.edu")
        .await
        .unwrap();
    assert_eq!(report.user_id, Some(alice.id));

    let remaining_friends = friendships.friends(bob.id).await.unwrap();
    assert!(remaining_friends.is_empty());
    let reactions: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM reactions")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(reactions, 0);
    let notifications: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM notifications")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(notifications, 0);

    let missing = delete_user_by_email(&pool, uploads.path(), "alice@campus.edu")
        .await
        .unwrap();
    assert!(missing.user_id.is_none());
}

#[actix_rt::test]
#[ignore]
#[serial]
async fn test_comment_edits_through_another_post_are_rejected() {
    let pool = setup_test_db().await.expect("Failed to set up database");
    let uploads = TempDir::new().unwrap();
    let storage = MediaStorage::local(uploads.path(), "http://localhost:8000");
    let alice = create_user(&pool, "carol").await;

    let posts = PostService::new(pool.clone());
    let first = posts.create(&storage, alice.id, "Exam week", None).await.unwrap();
    let second = posts.create(&storage, alice.id, "Free pizza", None).await.unwrap();

    let comments = CommentService::new(pool.clone());
    let comment = comments
        .create(
            &alice,
            first.id,
            CommentCreate { content: "Good luck".to_string(), parent_id: None },
        )
        .await
        .unwrap();

    let update = comments
        .update(
            alice.id,
            second.id,
            comment.id,
            CommentUpdate { content: "Edited".to_string() },
        )
        .await
        .unwrap_err();
    assert!(matches!(update, AppError::BadRequest(ref msg) if msg.contains("does not belong")));

    let delete = comments.delete(alice.id, second.id, comment.id).await.unwrap_err();
    assert!(matches!(delete, AppError::BadRequest(_)));

    let latest = comments.latest(first.id).await.unwrap();
    assert_eq!(latest.id, comment.id);
    assert_eq!(latest.content, "Good luck");
}

#[actix_rt::test]
#[ignore]
#[serial]
async fn test_friendship_status_for_unknown_user_is_not_found() {
    let pool = setup_test_db().await.expect("Failed to set up database");
    let dave = create_user(&pool, "dave").await;

    let err = FriendshipService::new(pool.clone())
        .status(dave.id, Uuid::new_v4())
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound(ref msg) if msg == "User not found"));
}

#[actix_rt::test]
#[ignore]
#[serial]
async fn test_media_prefix_rewrite_matches_literal_prefix() {
    let pool = setup_test_db().await.expect("Failed to set up database");
    let erin = create_user(&pool, "erin").await;

    let local = post_repo::create_post(&pool, erin.id, "a", Some("http://up_host/static/post_media/a.jpg"))
        .await
        .unwrap();
    let lookalike = post_repo::create_post(&pool, erin.id, "b", Some("http://upXhost/static/post_media/b.jpg"))
        .await
        .unwrap();

    let rewritten =
        post_repo::rewrite_media_url_prefix(&pool, "http://up_host/static/", "https://cdn.example.com/")
            .await
            .unwrap();
    assert_eq!(rewritten, 1);

    let local = post_repo::find_post_by_id(&pool, local.id).await.unwrap().unwrap();
    assert_eq!(local.media_url.as_deref(), Some("https://cdn.example.com/post_media/a.jpg"));
    let lookalike = post_repo::find_post_by_id(&pool, lookalike.id).await.unwrap().unwrap();
    assert_eq!(lookalike.media_url.as_deref(), Some("http://upXhost/static/post_media/b.jpg"));
}
