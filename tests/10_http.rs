mod common;

use anyhow::Result;
use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use tower::ServiceExt;

#[tokio::test]
async fn root_describes_the_api() -> Result<()> {
    let app = eduvia_api::app(common::test_state().await);

    let res = app
        .oneshot(Request::builder().uri("/").body(Body::empty())?)
        .await?;
    assert_eq!(res.status(), StatusCode::OK);

    let bytes = to_bytes(res.into_body(), 64 * 1024).await?;
    let body: serde_json::Value = serde_json::from_slice(&bytes)?;
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["name"], "Eduvia API");
    Ok(())
}

#[tokio::test]
async fn health_endpoint_responds() -> Result<()> {
    let app = eduvia_api::app(common::test_state().await);

    let res = app
        .oneshot(Request::builder().uri("/health").body(Body::empty())?)
        .await?;
    assert_eq!(res.status(), StatusCode::OK);

    let bytes = to_bytes(res.into_body(), 64 * 1024).await?;
    let body: serde_json::Value = serde_json::from_slice(&bytes)?;
    assert_eq!(body["data"]["status"], "ok");
    Ok(())
}

#[tokio::test]
async fn course_create_and_fetch_over_http() -> Result<()> {
    let state = common::test_state().await;
    let school_id = common::seed_school(&state, "Gamers Club", Some("gamersclub")).await;
    let app = eduvia_api::app(state);

    let payload = serde_json::json!({
        "courseName": "Speedrunning 101",
        "fee": 250,
        "noOfLessons": 4,
        "schoolId": school_id,
        "sections": [
            {"sectionName": "Basics", "videos": [
                {"videoName": "Intro", "url": "https://videos.eduvia.space/intro.mp4"}
            ]}
        ]
    });

    let res = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/gamersclub/courses")
                .header("content-type", "application/json")
                .body(Body::from(payload.to_string()))?,
        )
        .await?;
    assert_eq!(res.status(), StatusCode::CREATED);

    let bytes = to_bytes(res.into_body(), 64 * 1024).await?;
    let body: serde_json::Value = serde_json::from_slice(&bytes)?;
    assert_eq!(body["success"], true);
    let course_id = body["data"]["id"].as_str().expect("course id").to_string();

    let res = app
        .oneshot(
            Request::builder()
                .uri(format!("/api/gamersclub/courses/{course_id}"))
                .body(Body::empty())?,
        )
        .await?;
    assert_eq!(res.status(), StatusCode::OK);

    let bytes = to_bytes(res.into_body(), 64 * 1024).await?;
    let body: serde_json::Value = serde_json::from_slice(&bytes)?;
    assert_eq!(body["data"]["courseName"], "Speedrunning 101");
    assert_eq!(body["data"]["sections"][0]["sectionName"], "Basics");
    Ok(())
}

#[tokio::test]
async fn missing_course_maps_to_404_with_error_body() -> Result<()> {
    let state = common::test_state().await;
    common::seed_school(&state, "Gamers Club", Some("gamersclub")).await;
    let app = eduvia_api::app(state);

    let res = app
        .oneshot(
            Request::builder()
                .uri(format!(
                    "/api/gamersclub/courses/{}",
                    uuid::Uuid::new_v4()
                ))
                .body(Body::empty())?,
        )
        .await?;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    let bytes = to_bytes(res.into_body(), 64 * 1024).await?;
    let body: serde_json::Value = serde_json::from_slice(&bytes)?;
    assert_eq!(body["error"], true);
    assert_eq!(body["code"], "NOT_FOUND");
    Ok(())
}
