use axum::extract::{Path, State};
use axum::Json;
use uuid::Uuid;

use crate::middleware::response::{ApiResponse, ApiResult};
use crate::models::CoursePayment;
use crate::services::payment::{CheckoutRequest, CheckoutResponse, PaymentRecord};
use crate::state::AppState;
use crate::store::DocumentStore;

pub async fn create_checkout<S: DocumentStore>(
    State(state): State<AppState<S>>,
    Path(tenant): Path<String>,
    Json(request): Json<CheckoutRequest>,
) -> ApiResult<CheckoutResponse> {
    let response = state
        .payments
        .create_checkout_session(&tenant, request)
        .await?;
    Ok(ApiResponse::created(response))
}

pub async fn record<S: DocumentStore>(
    State(state): State<AppState<S>>,
    Json(payment): Json<PaymentRecord>,
) -> ApiResult<CoursePayment> {
    let payment = state.payments.record_payment(payment).await?;
    Ok(ApiResponse::created(payment))
}

pub async fn for_student<S: DocumentStore>(
    State(state): State<AppState<S>>,
    Path(student_id): Path<Uuid>,
) -> ApiResult<Vec<CoursePayment>> {
    let payments = state.payments.payments_for_student(student_id).await?;
    Ok(ApiResponse::success(payments))
}
