mod common;

use anyhow::Result;
use uuid::Uuid;

use eduvia_api::services::comment::NewComment;
use eduvia_api::services::ServiceError;

fn comment(course_id: Uuid, student_id: Uuid, content: &str, parent: Option<Uuid>) -> NewComment {
    NewComment {
        course_id,
        student_id,
        content: content.to_string(),
        parent_comment_id: parent,
    }
}

#[tokio::test]
async fn threads_nest_replies_under_their_parent() -> Result<()> {
    let state = common::test_state().await;
    let school_id = common::seed_school(&state, "Math Academy", Some("mathacademy")).await;
    let course = state
        .composition
        .create_course("mathacademy", common::course("Algebra", school_id, vec![]))
        .await?;
    let (alice, bob) = (Uuid::new_v4(), Uuid::new_v4());

    let first = state
        .comments
        .add_comment("mathacademy", comment(course.id, alice, "Great course!", None))
        .await?;
    state
        .comments
        .add_comment("mathacademy", comment(course.id, bob, "Any prerequisites?", None))
        .await?;
    let reply = state
        .comments
        .add_comment(
            "mathacademy",
            comment(course.id, bob, "Agreed", Some(first.id)),
        )
        .await?;
    state
        .comments
        .add_comment(
            "mathacademy",
            comment(course.id, alice, "Thanks!", Some(reply.id)),
        )
        .await?;

    let threads = state.comments.course_comments("mathacademy", course.id).await?;
    assert_eq!(threads.len(), 2);
    assert_eq!(threads[0].comment.content, "Great course!");
    assert_eq!(threads[1].comment.content, "Any prerequisites?");
    assert_eq!(threads[0].replies.len(), 1);
    assert_eq!(threads[0].replies[0].comment.content, "Agreed");
    assert_eq!(threads[0].replies[0].replies[0].comment.content, "Thanks!");
    assert!(threads[1].replies.is_empty());
    Ok(())
}

#[tokio::test]
async fn comment_requires_a_live_course_and_parent() -> Result<()> {
    let state = common::test_state().await;
    let school_id = common::seed_school(&state, "Math Academy", Some("mathacademy")).await;
    let course = state
        .composition
        .create_course("mathacademy", common::course("Algebra", school_id, vec![]))
        .await?;
    let student = Uuid::new_v4();

    let err = state
        .comments
        .add_comment(
            "mathacademy",
            comment(Uuid::new_v4(), student, "Hello?", None),
        )
        .await
        .expect_err("unknown course");
    assert!(matches!(err, ServiceError::NotFound(_)));

    let err = state
        .comments
        .add_comment(
            "mathacademy",
            comment(course.id, student, "Reply", Some(Uuid::new_v4())),
        )
        .await
        .expect_err("unknown parent");
    assert!(matches!(err, ServiceError::NotFound(_)));

    let err = state
        .comments
        .add_comment("mathacademy", comment(course.id, student, "   ", None))
        .await
        .expect_err("blank content");
    assert!(matches!(err, ServiceError::Validation(_)));
    Ok(())
}

#[tokio::test]
async fn replies_cannot_cross_courses() -> Result<()> {
    let state = common::test_state().await;
    let school_id = common::seed_school(&state, "Math Academy", Some("mathacademy")).await;
    let algebra = state
        .composition
        .create_course("mathacademy", common::course("Algebra", school_id, vec![]))
        .await?;
    let geometry = state
        .composition
        .create_course("mathacademy", common::course("Geometry", school_id, vec![]))
        .await?;
    let student = Uuid::new_v4();

    let root = state
        .comments
        .add_comment("mathacademy", comment(algebra.id, student, "First", None))
        .await?;
    let err = state
        .comments
        .add_comment(
            "mathacademy",
            comment(geometry.id, student, "Wrong thread", Some(root.id)),
        )
        .await
        .expect_err("parent on another course");
    assert!(matches!(err, ServiceError::Validation(_)));
    Ok(())
}

#[tokio::test]
async fn only_the_author_can_delete_a_comment() -> Result<()> {
    let state = common::test_state().await;
    let school_id = common::seed_school(&state, "Math Academy", Some("mathacademy")).await;
    let course = state
        .composition
        .create_course("mathacademy", common::course("Algebra", school_id, vec![]))
        .await?;
    let (author, stranger) = (Uuid::new_v4(), Uuid::new_v4());

    let root = state
        .comments
        .add_comment("mathacademy", comment(course.id, author, "Mine", None))
        .await?;
    state
        .comments
        .add_comment(
            "mathacademy",
            comment(course.id, stranger, "A reply", Some(root.id)),
        )
        .await?;

    let err = state
        .comments
        .delete_comment("mathacademy", root.id, stranger)
        .await
        .expect_err("not the author");
    assert!(matches!(err, ServiceError::Unauthorized(_)));

    let deleted = state
        .comments
        .delete_comment("mathacademy", root.id, author)
        .await?;
    assert!(deleted.is_deleted);

    // The whole thread disappears with its root
    let threads = state.comments.course_comments("mathacademy", course.id).await?;
    assert!(threads.is_empty());

    let err = state
        .comments
        .delete_comment("mathacademy", root.id, author)
        .await
        .expect_err("already deleted");
    assert!(matches!(err, ServiceError::NotFound(_)));
    Ok(())
}

#[tokio::test]
async fn likes_are_deduplicated_per_student() -> Result<()> {
    let state = common::test_state().await;
    let school_id = common::seed_school(&state, "Math Academy", Some("mathacademy")).await;
    let course = state
        .composition
        .create_course("mathacademy", common::course("Algebra", school_id, vec![]))
        .await?;
    let (author, fan) = (Uuid::new_v4(), Uuid::new_v4());

    let root = state
        .comments
        .add_comment("mathacademy", comment(course.id, author, "Popular", None))
        .await?;

    state.comments.like_comment("mathacademy", root.id, fan).await?;
    let liked = state.comments.like_comment("mathacademy", root.id, fan).await?;
    assert_eq!(liked.likes, vec![fan]);

    let unliked = state
        .comments
        .unlike_comment("mathacademy", root.id, fan)
        .await?;
    assert!(unliked.likes.is_empty());

    // Unliking when not in the list is a no-op
    let unliked = state
        .comments
        .unlike_comment("mathacademy", root.id, fan)
        .await?;
    assert!(unliked.likes.is_empty());
    Ok(())
}
