mod common;

use anyhow::Result;

use eduvia_api::services::ServiceError;
use eduvia_api::store::{collections, DocumentStore, Query};

#[tokio::test]
async fn create_course_preserves_input_order() -> Result<()> {
    let state = common::test_state().await;
    let school_id = common::seed_school(&state, "Math Academy", Some("mathacademy")).await;

    let input = common::course(
        "Algebra",
        school_id,
        vec![
            common::section(
                "Linear equations",
                vec![common::video("lines-1"), common::video("lines-2")],
                None,
            ),
            common::section(
                "Quadratics",
                vec![common::video("quad-1")],
                Some(common::exam("Quadratics check")),
            ),
        ],
    );

    let details = state.composition.create_course("mathacademy", input).await?;

    assert_eq!(details.course_name, "Algebra");
    assert_eq!(details.sections.len(), 2);
    assert_eq!(details.sections[0].section_name, "Linear equations");
    assert_eq!(details.sections[1].section_name, "Quadratics");

    let first = &details.sections[0];
    assert_eq!(first.videos.len(), 2);
    assert_eq!(first.videos[0].video_name, "lines-1");
    assert_eq!(first.videos[1].video_name, "lines-2");
    assert!(first.exam.is_none());

    let second = &details.sections[1];
    let exam = second.exam.as_ref().expect("exam populated");
    assert_eq!(exam.title, "Quadratics check");
    // Back-references were filled in after the section got its id
    assert_eq!(exam.section, Some(second.id));
    assert_eq!(second.videos[0].section, Some(second.id));
    Ok(())
}

#[tokio::test]
async fn failed_write_leaves_no_partial_course() -> Result<()> {
    let state = common::test_state().await;
    let school_id = common::seed_school(&state, "Math Academy", Some("mathacademy")).await;

    // First contact creates the namespace so we can count afterwards
    let handle = state.resolver.resolve("mathacademy").await?;
    state.store.fail_inserts_into(collections::EXAMS).await;

    let input = common::course(
        "Algebra",
        school_id,
        vec![
            common::section("Linear equations", vec![common::video("lines-1")], None),
            common::section(
                "Quadratics",
                vec![common::video("quad-1")],
                Some(common::exam("Quadratics check")),
            ),
        ],
    );

    let err = state
        .composition
        .create_course("mathacademy", input)
        .await
        .expect_err("exam insert was set to fail");
    assert!(matches!(err, ServiceError::Store(_)), "got {err:?}");

    for collection in [
        collections::COURSES,
        collections::SECTIONS,
        collections::VIDEOS,
        collections::EXAMS,
    ] {
        let count = state
            .store
            .count(&handle.database, collection, Query::new())
            .await?;
        assert_eq!(count, 0, "{collection} should be empty after rollback");
    }
    Ok(())
}

#[tokio::test]
async fn video_cap_is_checked_before_any_write() -> Result<()> {
    let state = common::test_state().await;
    let school_id = common::seed_school(&state, "Math Academy", Some("mathacademy")).await;
    let handle = state.resolver.resolve("mathacademy").await?;

    let input = common::course(
        "Algebra",
        school_id,
        vec![common::section(
            "Overfull",
            vec![
                common::video("v1"),
                common::video("v2"),
                common::video("v3"),
                common::video("v4"),
            ],
            None,
        )],
    );

    let err = state
        .composition
        .create_course("mathacademy", input)
        .await
        .expect_err("four videos exceed the cap");
    assert!(matches!(err, ServiceError::Validation(_)), "got {err:?}");

    let count = state
        .store
        .count(&handle.database, collections::COURSES, Query::new())
        .await?;
    assert_eq!(count, 0);
    Ok(())
}

#[tokio::test]
async fn rejects_blank_course_name_and_negative_fee() -> Result<()> {
    let state = common::test_state().await;
    let school_id = common::seed_school(&state, "Math Academy", Some("mathacademy")).await;

    let mut input = common::course("  ", school_id, vec![]);
    let err = state
        .composition
        .create_course("mathacademy", input.clone())
        .await
        .expect_err("blank name");
    assert!(matches!(err, ServiceError::Validation(_)));

    input.course_name = "Algebra".to_string();
    input.fee = -1;
    let err = state
        .composition
        .create_course("mathacademy", input)
        .await
        .expect_err("negative fee");
    assert!(matches!(err, ServiceError::Validation(_)));
    Ok(())
}

#[tokio::test]
async fn course_with_no_sections_is_valid() -> Result<()> {
    let state = common::test_state().await;
    let school_id = common::seed_school(&state, "Math Academy", Some("mathacademy")).await;

    let details = state
        .composition
        .create_course("mathacademy", common::course("Algebra", school_id, vec![]))
        .await?;
    assert!(details.sections.is_empty());
    Ok(())
}
