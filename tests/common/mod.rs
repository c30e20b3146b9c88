//! Shared test fixtures: an in-memory store wired through the full service
//! stack, plus builders for the documents most tests need.

#![allow(dead_code)]

use std::sync::Arc;

use serde_json::json;
use uuid::Uuid;

use eduvia_api::external::{LogMailer, StubGateway};
use eduvia_api::models::{CourseInput, ExamInput, SectionInput, VideoInput};
use eduvia_api::state::AppState;
use eduvia_api::store::memory::MemoryStore;
use eduvia_api::store::{collections, DocumentStore, CENTRAL_NAMESPACE};

pub async fn test_state() -> AppState<MemoryStore> {
    let store = Arc::new(MemoryStore::new());
    let state = AppState::new(store, Arc::new(LogMailer), Arc::new(StubGateway));
    state
        .resolver
        .ensure_central()
        .await
        .expect("central namespace");
    state
}

/// Inserts a school document directly into the central directory and returns
/// its id. The subdomain is stored as given; pass `None` for a school that
/// has not been assigned one yet.
pub async fn seed_school(
    state: &AppState<MemoryStore>,
    name: &str,
    sub_domain: Option<&str>,
) -> Uuid {
    let doc = state
        .store
        .insert(
            CENTRAL_NAMESPACE,
            collections::SCHOOLS,
            json!({
                "name": name,
                "email": format!("{}@eduvia.space", name.to_lowercase().replace(' ', ".")),
                "password": "salt$digest",
                "coursesOffered": [],
                "isVerified": sub_domain.is_some(),
                "subDomain": sub_domain,
            }),
        )
        .await
        .expect("seed school");
    eduvia_api::store::doc_id(&doc).expect("school id")
}

pub fn video(name: &str) -> VideoInput {
    VideoInput {
        video_name: name.to_string(),
        url: format!("https://videos.eduvia.space/{name}.mp4"),
        description: None,
    }
}

pub fn section(name: &str, videos: Vec<VideoInput>, exam: Option<ExamInput>) -> SectionInput {
    SectionInput {
        section_name: name.to_string(),
        exam_required: exam.is_some(),
        exam,
        videos,
    }
}

pub fn exam(title: &str) -> ExamInput {
    ExamInput {
        title: title.to_string(),
        total_marks: 100,
        min_to_pass: 40,
    }
}

pub fn course(name: &str, school_id: Uuid, sections: Vec<SectionInput>) -> CourseInput {
    CourseInput {
        course_name: name.to_string(),
        fee: 500,
        no_of_lessons: 12,
        course_thumbnail: None,
        description: Some(format!("{name} fundamentals")),
        is_preliminary_required: false,
        school_id,
        sections,
    }
}
