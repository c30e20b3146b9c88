use axum::extract::{Path, State};
use axum::Json;
use serde::Deserialize;
use uuid::Uuid;

use crate::middleware::response::{ApiResponse, ApiResult};
use crate::models::Student;
use crate::services::entitlement::Entitlement;
use crate::services::student::{
    PasswordReset, StudentCredentials, StudentRegistration, StudentSession,
};
use crate::state::AppState;
use crate::store::DocumentStore;

pub async fn register<S: DocumentStore>(
    State(state): State<AppState<S>>,
    Json(input): Json<StudentRegistration>,
) -> ApiResult<Student> {
    let student = state.students.register(input).await?;
    Ok(ApiResponse::created(student))
}

pub async fn login<S: DocumentStore>(
    State(state): State<AppState<S>>,
    Json(credentials): Json<StudentCredentials>,
) -> ApiResult<StudentSession> {
    let session = state.students.login(credentials).await?;
    Ok(ApiResponse::success(session))
}

#[derive(Debug, Deserialize)]
pub struct ForgotPasswordBody {
    pub email: String,
}

pub async fn forgot_password<S: DocumentStore>(
    State(state): State<AppState<S>>,
    Json(body): Json<ForgotPasswordBody>,
) -> ApiResult<serde_json::Value> {
    state.students.forgot_password(&body.email).await?;
    Ok(ApiResponse::success(serde_json::json!({
        "message": "Password reset email sent"
    })))
}

pub async fn reset_password<S: DocumentStore>(
    State(state): State<AppState<S>>,
    Json(reset): Json<PasswordReset>,
) -> ApiResult<Student> {
    let student = state.students.reset_password(reset).await?;
    Ok(ApiResponse::success(student))
}

/// Every course the student has paid towards, across all schools.
pub async fn courses<S: DocumentStore>(
    State(state): State<AppState<S>>,
    Path(student_id): Path<Uuid>,
) -> ApiResult<Vec<Entitlement>> {
    let entitlements = state
        .entitlements
        .find_entitlements_for_student(student_id)
        .await?;
    Ok(ApiResponse::success(entitlements))
}
