use axum::extract::State;
use axum::Json;

use crate::middleware::response::{ApiResponse, ApiResult};
use crate::models::Admin;
use crate::services::admin::{AdminCredentials, AdminSession};
use crate::state::AppState;
use crate::store::DocumentStore;

pub async fn register<S: DocumentStore>(
    State(state): State<AppState<S>>,
    Json(credentials): Json<AdminCredentials>,
) -> ApiResult<Admin> {
    let admin = state.admins.register(credentials).await?;
    Ok(ApiResponse::created(admin))
}

pub async fn login<S: DocumentStore>(
    State(state): State<AppState<S>>,
    Json(credentials): Json<AdminCredentials>,
) -> ApiResult<AdminSession> {
    let session = state.admins.login(credentials).await?;
    Ok(ApiResponse::success(session))
}
