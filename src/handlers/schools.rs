use axum::extract::{Path, Query, State};
use axum::Json;
use uuid::Uuid;

use crate::middleware::response::{ApiResponse, ApiResult};
use crate::models::School;
use crate::services::school::{
    ListSchoolsParams, SchoolCredentials, SchoolPage, SchoolRegistration, SchoolSession,
    SchoolUpdate, TenantInit,
};
use crate::state::AppState;
use crate::store::DocumentStore;

pub async fn register<S: DocumentStore>(
    State(state): State<AppState<S>>,
    Json(input): Json<SchoolRegistration>,
) -> ApiResult<School> {
    let school = state.schools.register(input).await?;
    Ok(ApiResponse::created(school))
}

pub async fn login<S: DocumentStore>(
    State(state): State<AppState<S>>,
    Json(credentials): Json<SchoolCredentials>,
) -> ApiResult<SchoolSession> {
    let session = state.schools.login(credentials).await?;
    Ok(ApiResponse::success(session))
}

pub async fn list<S: DocumentStore>(
    State(state): State<AppState<S>>,
    Query(params): Query<ListSchoolsParams>,
) -> ApiResult<SchoolPage> {
    let page = state.schools.list_schools(params).await?;
    Ok(ApiResponse::success(page))
}

pub async fn get<S: DocumentStore>(
    State(state): State<AppState<S>>,
    Path(school_id): Path<Uuid>,
) -> ApiResult<School> {
    let school = state.schools.get_school(school_id).await?;
    Ok(ApiResponse::success(school))
}

pub async fn get_by_subdomain<S: DocumentStore>(
    State(state): State<AppState<S>>,
    Path(sub_domain): Path<String>,
) -> ApiResult<School> {
    let school = state.schools.get_by_subdomain(&sub_domain).await?;
    Ok(ApiResponse::success(school))
}

/// Explicit tenant bootstrap, normally triggered implicitly by subdomain
/// assignment. Idempotent.
pub async fn init_db<S: DocumentStore>(
    State(state): State<AppState<S>>,
    Path(tenant): Path<String>,
) -> ApiResult<TenantInit> {
    let init = state.schools.init_tenant(&tenant).await?;
    Ok(ApiResponse::success(init))
}

pub async fn update<S: DocumentStore>(
    State(state): State<AppState<S>>,
    Path(school_id): Path<Uuid>,
    Json(update): Json<SchoolUpdate>,
) -> ApiResult<School> {
    let school = state.schools.update_school(school_id, update).await?;
    Ok(ApiResponse::success(school))
}
