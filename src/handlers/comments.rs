use axum::extract::{Path, State};
use axum::Json;
use serde::Deserialize;
use uuid::Uuid;

use crate::middleware::response::{ApiResponse, ApiResult};
use crate::models::Comment;
use crate::services::comment::{CommentThread, NewComment};
use crate::state::AppState;
use crate::store::DocumentStore;

pub async fn add<S: DocumentStore>(
    State(state): State<AppState<S>>,
    Path(tenant): Path<String>,
    Json(input): Json<NewComment>,
) -> ApiResult<Comment> {
    let comment = state.comments.add_comment(&tenant, input).await?;
    Ok(ApiResponse::created(comment))
}

pub async fn for_course<S: DocumentStore>(
    State(state): State<AppState<S>>,
    Path((tenant, course_id)): Path<(String, Uuid)>,
) -> ApiResult<Vec<CommentThread>> {
    let threads = state.comments.course_comments(&tenant, course_id).await?;
    Ok(ApiResponse::success(threads))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentActor {
    pub student_id: Uuid,
}

pub async fn delete<S: DocumentStore>(
    State(state): State<AppState<S>>,
    Path((tenant, comment_id)): Path<(String, Uuid)>,
    Json(body): Json<CommentActor>,
) -> ApiResult<Comment> {
    let comment = state
        .comments
        .delete_comment(&tenant, comment_id, body.student_id)
        .await?;
    Ok(ApiResponse::success(comment))
}

pub async fn like<S: DocumentStore>(
    State(state): State<AppState<S>>,
    Path((tenant, comment_id)): Path<(String, Uuid)>,
    Json(body): Json<CommentActor>,
) -> ApiResult<Comment> {
    let comment = state
        .comments
        .like_comment(&tenant, comment_id, body.student_id)
        .await?;
    Ok(ApiResponse::success(comment))
}

pub async fn unlike<S: DocumentStore>(
    State(state): State<AppState<S>>,
    Path((tenant, comment_id)): Path<(String, Uuid)>,
    Json(body): Json<CommentActor>,
) -> ApiResult<Comment> {
    let comment = state
        .comments
        .unlike_comment(&tenant, comment_id, body.student_id)
        .await?;
    Ok(ApiResponse::success(comment))
}
