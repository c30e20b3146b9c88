mod common;

use anyhow::Result;

use eduvia_api::services::course_query::ListCoursesParams;

#[tokio::test]
async fn listing_paginates_and_reports_totals() -> Result<()> {
    let state = common::test_state().await;
    let school_id = common::seed_school(&state, "Math Academy", Some("mathacademy")).await;

    for i in 0..12 {
        state
            .composition
            .create_course(
                "mathacademy",
                common::course(&format!("Course {i:02}"), school_id, vec![]),
            )
            .await?;
    }

    let page = state
        .courses
        .list_courses("mathacademy", ListCoursesParams::default())
        .await?;
    assert_eq!(page.courses.len(), 10);
    assert_eq!(page.pagination.total, 12);
    assert_eq!(page.pagination.total_pages, 2);

    let page = state
        .courses
        .list_courses(
            "mathacademy",
            ListCoursesParams {
                page: Some(2),
                ..Default::default()
            },
        )
        .await?;
    assert_eq!(page.courses.len(), 2);
    assert_eq!(page.pagination.page, 2);
    Ok(())
}

#[tokio::test]
async fn search_and_sort_narrow_the_listing() -> Result<()> {
    let state = common::test_state().await;
    let school_id = common::seed_school(&state, "Math Academy", Some("mathacademy")).await;

    for name in ["Algebra", "Geometry", "Advanced Algebra"] {
        state
            .composition
            .create_course("mathacademy", common::course(name, school_id, vec![]))
            .await?;
    }

    let page = state
        .courses
        .list_courses(
            "mathacademy",
            ListCoursesParams {
                search: Some("algebra".to_string()),
                sort_by: Some("courseName".to_string()),
                sort_order: Some("asc".to_string()),
                ..Default::default()
            },
        )
        .await?;

    let names: Vec<_> = page.courses.iter().map(|c| c.course_name.as_str()).collect();
    assert_eq!(names, vec!["Advanced Algebra", "Algebra"]);
    assert_eq!(page.pagination.total, 2);
    Ok(())
}

#[tokio::test]
async fn soft_delete_hides_course_from_reads() -> Result<()> {
    let state = common::test_state().await;
    let school_id = common::seed_school(&state, "Math Academy", Some("mathacademy")).await;

    let details = state
        .composition
        .create_course("mathacademy", common::course("Algebra", school_id, vec![]))
        .await?;

    let deleted = state
        .courses
        .soft_delete_course("mathacademy", details.id)
        .await?
        .expect("course exists");
    assert!(deleted.is_deleted);

    // Gone from the listing and the detail fetch
    let page = state
        .courses
        .list_courses("mathacademy", ListCoursesParams::default())
        .await?;
    assert!(page.courses.is_empty());
    assert_eq!(page.pagination.total, 0);

    let fetched = state
        .courses
        .get_course_with_details("mathacademy", details.id)
        .await?;
    assert!(fetched.is_none());

    // Idempotent: deleting again still returns the flagged course
    let again = state
        .courses
        .soft_delete_course("mathacademy", details.id)
        .await?
        .expect("still resolvable by id");
    assert!(again.is_deleted);
    Ok(())
}

#[tokio::test]
async fn soft_delete_of_unknown_id_returns_none() -> Result<()> {
    let state = common::test_state().await;
    common::seed_school(&state, "Math Academy", Some("mathacademy")).await;

    let missing = state
        .courses
        .soft_delete_course("mathacademy", uuid::Uuid::new_v4())
        .await?;
    assert!(missing.is_none());
    Ok(())
}

#[tokio::test]
async fn tenants_never_see_each_other_courses() -> Result<()> {
    let state = common::test_state().await;
    let math_id = common::seed_school(&state, "Math Academy", Some("mathacademy")).await;
    common::seed_school(&state, "Gamers Club", Some("gamersclub")).await;

    let details = state
        .composition
        .create_course("mathacademy", common::course("Algebra", math_id, vec![]))
        .await?;

    let page = state
        .courses
        .list_courses("gamersclub", ListCoursesParams::default())
        .await?;
    assert!(page.courses.is_empty());

    let cross = state
        .courses
        .get_course_with_details("gamersclub", details.id)
        .await?;
    assert!(cross.is_none());
    Ok(())
}

#[tokio::test]
async fn limit_is_clamped_to_the_configured_maximum() -> Result<()> {
    let state = common::test_state().await;
    let school_id = common::seed_school(&state, "Math Academy", Some("mathacademy")).await;

    state
        .composition
        .create_course("mathacademy", common::course("Algebra", school_id, vec![]))
        .await?;

    let page = state
        .courses
        .list_courses(
            "mathacademy",
            ListCoursesParams {
                limit: Some(100_000),
                ..Default::default()
            },
        )
        .await?;
    assert!(page.pagination.limit <= 100);

    let page = state
        .courses
        .list_courses(
            "mathacademy",
            ListCoursesParams {
                limit: Some(0),
                page: Some(-3),
                ..Default::default()
            },
        )
        .await?;
    assert_eq!(page.pagination.limit, 1);
    assert_eq!(page.pagination.page, 1);
    Ok(())
}

#[tokio::test]
async fn absurd_page_numbers_return_an_empty_page() -> Result<()> {
    let state = common::test_state().await;
    let school_id = common::seed_school(&state, "Math Academy", Some("mathacademy")).await;

    state
        .composition
        .create_course("mathacademy", common::course("Algebra", school_id, vec![]))
        .await?;

    // The offset saturates instead of overflowing
    let page = state
        .courses
        .list_courses(
            "mathacademy",
            ListCoursesParams {
                page: Some(i64::MAX),
                ..Default::default()
            },
        )
        .await?;
    assert!(page.courses.is_empty());
    assert_eq!(page.pagination.total, 1);
    Ok(())
}
