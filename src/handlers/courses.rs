use axum::extract::{Path, Query, State};
use axum::Json;
use serde::Deserialize;
use uuid::Uuid;

use crate::error::ApiError;
use crate::middleware::response::{ApiResponse, ApiResult};
use crate::models::{
    Course, CourseDetails, CourseInput, ExamKind, Question, QuestionInput, Section, Video,
    VideoInput,
};
use crate::services::course_query::{CoursePage, ListCoursesParams};
use crate::state::AppState;
use crate::store::DocumentStore;

pub async fn create_course<S: DocumentStore>(
    State(state): State<AppState<S>>,
    Path(tenant): Path<String>,
    Json(input): Json<CourseInput>,
) -> ApiResult<CourseDetails> {
    let details = state.composition.create_course(&tenant, input).await?;
    Ok(ApiResponse::created(details))
}

pub async fn list_courses<S: DocumentStore>(
    State(state): State<AppState<S>>,
    Path(tenant): Path<String>,
    Query(params): Query<ListCoursesParams>,
) -> ApiResult<CoursePage> {
    let page = state.courses.list_courses(&tenant, params).await?;
    Ok(ApiResponse::success(page))
}

pub async fn get_course<S: DocumentStore>(
    State(state): State<AppState<S>>,
    Path((tenant, course_id)): Path<(String, Uuid)>,
) -> ApiResult<CourseDetails> {
    let details = state
        .courses
        .get_course_with_details(&tenant, course_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Course not found or deleted"))?;
    Ok(ApiResponse::success(details))
}

pub async fn delete_course<S: DocumentStore>(
    State(state): State<AppState<S>>,
    Path((tenant, course_id)): Path<(String, Uuid)>,
) -> ApiResult<Course> {
    let course = state
        .courses
        .soft_delete_course(&tenant, course_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Course not found"))?;
    Ok(ApiResponse::success(course))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddVideosBody {
    pub videos: Vec<VideoInput>,
}

pub async fn add_videos<S: DocumentStore>(
    State(state): State<AppState<S>>,
    Path((tenant, section_id)): Path<(String, Uuid)>,
    Json(body): Json<AddVideosBody>,
) -> ApiResult<Vec<Video>> {
    let videos = state
        .catalog
        .add_videos_to_section(&tenant, section_id, body.videos)
        .await?;
    Ok(ApiResponse::created(videos))
}

pub async fn delete_section<S: DocumentStore>(
    State(state): State<AppState<S>>,
    Path((tenant, section_id)): Path<(String, Uuid)>,
) -> ApiResult<Section> {
    let section = state
        .catalog
        .soft_delete_section(&tenant, section_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Section not found"))?;
    Ok(ApiResponse::success(section))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetExamBody {
    pub exam_id: Uuid,
}

pub async fn set_course_exam<S: DocumentStore>(
    State(state): State<AppState<S>>,
    Path((tenant, course_id, kind)): Path<(String, Uuid, String)>,
    Json(body): Json<SetExamBody>,
) -> ApiResult<Course> {
    let kind = ExamKind::parse(&kind)
        .ok_or_else(|| ApiError::bad_request("examType must be 'preliminary' or 'final'"))?;
    let course = state
        .catalog
        .set_course_exam(&tenant, course_id, kind, body.exam_id)
        .await?;
    Ok(ApiResponse::success(course))
}

pub async fn get_course_questions<S: DocumentStore>(
    State(state): State<AppState<S>>,
    Path((tenant, course_id, kind)): Path<(String, Uuid, String)>,
) -> ApiResult<Vec<Question>> {
    let kind = ExamKind::parse(&kind)
        .ok_or_else(|| ApiError::bad_request("examType must be 'preliminary' or 'final'"))?;
    let questions = state
        .catalog
        .get_course_questions(&tenant, course_id, kind)
        .await?;
    Ok(ApiResponse::success(questions))
}

pub async fn add_exam_question<S: DocumentStore>(
    State(state): State<AppState<S>>,
    Path((tenant, exam_id)): Path<(String, Uuid)>,
    Json(input): Json<QuestionInput>,
) -> ApiResult<Question> {
    let question = state
        .catalog
        .add_exam_question(&tenant, exam_id, input)
        .await?;
    Ok(ApiResponse::created(question))
}
