//! Pipeline Integration Tests
//!
//! These tests require:
//! - Running PostgreSQL instance
//! - Running Redis instance
//! - Environment variables: DATABASE_URL, REDIS_URL
//!
//! Run with: cargo test -p integration-tests --test pipeline_tests

use integration_tests::{
    check_test_env, comment_request, drain, golden_request, missing_subject, new_subject,
    test_config, unique_user, TestStack,
};
use orion_consumer::Settlement;
use orion_core::error::DomainError;
use orion_core::events::{EventKind, LikeEvent, RelayEvent};
use orion_core::traits::RelayPublisher;
use orion_core::value_objects::UserId;
use orion_service::dto::{CreateSubjectRequest, ListCommentsQuery};
use orion_service::{CommentService, LikeService, SubjectService};

// ============================================================================
// Like Tests
// ============================================================================

#[tokio::test]
async fn test_like_applied_by_consumer() {
    if !check_test_env().await {
        return;
    }

    let stack = TestStack::start().await.expect("Failed to start stack");
    let worker = stack.worker(EventKind::Like).await.unwrap();
    let subject = stack.create_subject(new_subject()).await.unwrap();
    let user = unique_user();

    let likes = LikeService::new(&stack.ctx);
    likes.like(user, subject.id).await.unwrap();
    assert!(likes.has_liked(user, subject.id).await.unwrap());

    assert_eq!(drain(&worker, 1).await.unwrap(), vec![Settlement::Acked]);
    assert_eq!(stack.db_subject(subject.id).await.unwrap().like_count, 1);

    let err = likes.like(user, subject.id).await.unwrap_err();
    assert_eq!(err.domain(), Some(&DomainError::AlreadyLiked));
}

#[tokio::test]
async fn test_like_then_unlike() {
    if !check_test_env().await {
        return;
    }

    let stack = TestStack::start().await.expect("Failed to start stack");
    let worker = stack.worker(EventKind::Like).await.unwrap();
    let subject = stack.create_subject(new_subject()).await.unwrap();
    let user = unique_user();

    let likes = LikeService::new(&stack.ctx);
    likes.like(user, subject.id).await.unwrap();
    likes.unlike(user, subject.id).await.unwrap();

    let settled = drain(&worker, 2).await.unwrap();
    assert_eq!(settled, vec![Settlement::Acked, Settlement::Acked]);
    assert_eq!(stack.db_subject(subject.id).await.unwrap().like_count, 0);
    assert!(!likes.has_liked(user, subject.id).await.unwrap());
}

#[tokio::test]
async fn test_redelivered_like_counted_once() {
    if !check_test_env().await {
        return;
    }

    let stack = TestStack::start().await.expect("Failed to start stack");
    let worker = stack.worker(EventKind::Like).await.unwrap();
    let subject = stack.create_subject(new_subject()).await.unwrap();

    let event = RelayEvent::Like(LikeEvent::like(unique_user(), subject.id));
    stack.ctx.publisher().publish(&event).await.unwrap();
    stack.ctx.publisher().publish(&event).await.unwrap();

    let settled = drain(&worker, 2).await.unwrap();
    assert_eq!(settled, vec![Settlement::Acked, Settlement::AckedDuplicate]);
    assert_eq!(stack.db_subject(subject.id).await.unwrap().like_count, 1);
}

#[tokio::test]
async fn test_like_on_missing_subject_rejected() {
    if !check_test_env().await {
        return;
    }

    let stack = TestStack::start().await.expect("Failed to start stack");
    let missing = missing_subject();

    let err = LikeService::new(&stack.ctx)
        .like(unique_user(), missing)
        .await
        .unwrap_err();
    assert_eq!(err.domain(), Some(&DomainError::SubjectNotFound(missing)));
}

// ============================================================================
// Golden Comment Tests
// ============================================================================

#[tokio::test]
async fn test_golden_comment_persisted_by_consumer() {
    if !check_test_env().await {
        return;
    }

    let stack = TestStack::start().await.expect("Failed to start stack");
    let worker = stack.worker(EventKind::GoldenComment).await.unwrap();
    let subject = stack.create_subject(new_subject()).await.unwrap();

    let comments = CommentService::new(&stack.ctx);
    let pending = comments
        .create_golden_comment(unique_user(), subject.id, golden_request("first!"))
        .await
        .unwrap();
    assert_eq!(pending.seat, 1);

    assert_eq!(drain(&worker, 1).await.unwrap(), vec![Settlement::Acked]);
    assert_eq!(stack.db_subject(subject.id).await.unwrap().golden_count, 1);

    let page = comments
        .list_comments(subject.id, ListCommentsQuery::default())
        .await
        .unwrap();
    assert_eq!(page.comments.len(), 1);
    assert!(page.comments[0].is_golden);
    assert_eq!(page.comments[0].content, "first!");
}

#[tokio::test]
async fn test_golden_seats_capped() {
    if !check_test_env().await {
        return;
    }

    let mut config = test_config().unwrap();
    config.pipeline.golden_seat_cap = 2;
    let stack = TestStack::start_with_config(config)
        .await
        .expect("Failed to start stack");
    let worker = stack.worker(EventKind::GoldenComment).await.unwrap();
    let subject = stack.create_subject(new_subject()).await.unwrap();

    let comments = CommentService::new(&stack.ctx);
    for _ in 0..2 {
        comments
            .create_golden_comment(unique_user(), subject.id, golden_request("in time"))
            .await
            .unwrap();
    }
    let err = comments
        .create_golden_comment(unique_user(), subject.id, golden_request("too late"))
        .await
        .unwrap_err();
    assert!(matches!(err.domain(), Some(DomainError::SeatFull { cap: 2, .. })));

    drain(&worker, 2).await.unwrap();
    assert_eq!(stack.db_subject(subject.id).await.unwrap().golden_count, 2);
}

#[tokio::test]
async fn test_repeated_golden_comment_keeps_seat_count() {
    if !check_test_env().await {
        return;
    }

    let mut config = test_config().unwrap();
    config.pipeline.golden_seat_cap = 2;
    let stack = TestStack::start_with_config(config)
        .await
        .expect("Failed to start stack");
    let worker = stack.worker(EventKind::GoldenComment).await.unwrap();
    let subject = stack.create_subject(new_subject()).await.unwrap();
    let author = unique_user();

    let comments = CommentService::new(&stack.ctx);
    comments
        .create_golden_comment(author, subject.id, golden_request("mine"))
        .await
        .unwrap();
    let err = comments
        .create_golden_comment(author, subject.id, golden_request("mine again"))
        .await
        .unwrap_err();
    assert!(matches!(
        err.domain(),
        Some(DomainError::DuplicateGoldenComment { .. })
    ));

    assert_eq!(drain(&worker, 1).await.unwrap(), vec![Settlement::Acked]);
    assert_eq!(stack.db_subject(subject.id).await.unwrap().golden_count, 1);

    // The remaining seat is still available to another author
    let pending = comments
        .create_golden_comment(unique_user(), subject.id, golden_request("second"))
        .await
        .unwrap();
    assert_eq!(pending.seat, 2);
}

// ============================================================================
// Relay Failure Tests
// ============================================================================

#[tokio::test]
async fn test_poison_message_discarded() {
    if !check_test_env().await {
        return;
    }

    let stack = TestStack::start().await.expect("Failed to start stack");
    let worker = stack.worker(EventKind::Like).await.unwrap();

    stack
        .inject_raw(EventKind::Like, b"{\"user_id\":\"seven\"}")
        .await
        .unwrap();

    assert_eq!(drain(&worker, 1).await.unwrap(), vec![Settlement::Discarded]);
    assert_eq!(stack.dead_letter_len().await.unwrap(), 0);
}

#[tokio::test]
async fn test_unappliable_event_dead_lettered() {
    if !check_test_env().await {
        return;
    }

    let mut config = test_config().unwrap();
    config.relay.max_deliveries = 2;
    let stack = TestStack::start_with_config(config)
        .await
        .expect("Failed to start stack");
    let worker = stack.worker(EventKind::Like).await.unwrap();

    // Published directly so the producer-side existence check is skipped
    let missing = missing_subject();
    let event = RelayEvent::Like(LikeEvent::like(UserId::new(7), missing));
    stack.ctx.publisher().publish(&event).await.unwrap();

    let settled = drain(&worker, 3).await.unwrap();
    assert_eq!(
        settled,
        vec![
            Settlement::Requeued,
            Settlement::Requeued,
            Settlement::DeadLettered
        ]
    );
    assert_eq!(stack.dead_letter_len().await.unwrap(), 1);
}

// ============================================================================
// Read Path Tests
// ============================================================================

#[tokio::test]
async fn test_subject_served_from_cache() {
    if !check_test_env().await {
        return;
    }

    let stack = TestStack::start().await.expect("Failed to start stack");
    let worker = stack.worker(EventKind::Like).await.unwrap();
    let subject = stack.create_subject(new_subject()).await.unwrap();

    let subjects = SubjectService::new(&stack.ctx);
    let first = subjects.get_subject(subject.id).await.unwrap();
    assert_eq!(first.title, subject.title);
    assert_eq!(first.like_count, 0);

    LikeService::new(&stack.ctx)
        .like(unique_user(), subject.id)
        .await
        .unwrap();
    drain(&worker, 1).await.unwrap();

    // Counters in the cached entry lag until it expires
    let cached = subjects.get_subject(subject.id).await.unwrap();
    assert_eq!(cached.like_count, 0);
    assert_eq!(stack.db_subject(subject.id).await.unwrap().like_count, 1);
}

#[tokio::test]
async fn test_created_subject_leads_feed() {
    if !check_test_env().await {
        return;
    }

    let stack = TestStack::start().await.expect("Failed to start stack");
    let subjects = SubjectService::new(&stack.ctx);
    let author = unique_user();

    let created = subjects
        .create_subject(
            author,
            CreateSubjectRequest {
                title: "Fresh upload".to_string(),
                description: Some("just now".to_string()),
            },
        )
        .await
        .unwrap();
    assert_eq!(created.author_id, author.to_string());

    let feed = subjects.list_latest(Some(100)).await.unwrap();
    assert!(feed.iter().any(|s| s.id == created.id));
    assert!(feed.len() <= 100);

    let read = subjects.get_subject(created.id.parse().unwrap()).await.unwrap();
    assert_eq!(read.title, "Fresh upload");
}

// ============================================================================
// Comment Tests
// ============================================================================

#[tokio::test]
async fn test_comment_thread() {
    if !check_test_env().await {
        return;
    }

    let stack = TestStack::start().await.expect("Failed to start stack");
    let subject = stack.create_subject(new_subject()).await.unwrap();
    let author = unique_user();

    let comments = CommentService::new(&stack.ctx);
    let top = comments
        .create_comment(author, subject.id, comment_request("top"))
        .await
        .unwrap();
    let reply = comments
        .create_reply(unique_user(), top.id.parse().unwrap(), comment_request("reply"))
        .await
        .unwrap();
    assert_eq!(reply.reply_to_user_id, Some(author.to_string()));

    let err = comments
        .create_reply(unique_user(), reply.id.parse().unwrap(), comment_request("nested"))
        .await
        .unwrap_err();
    assert_eq!(err.domain(), Some(&DomainError::ReplyToReply));

    let page = comments
        .list_comments(subject.id, ListCommentsQuery::default())
        .await
        .unwrap();
    assert_eq!(page.comments.len(), 1);
    assert_eq!(page.comments[0].replies.len(), 1);
    assert_eq!(page.comments[0].replies[0].id, reply.id);
}
