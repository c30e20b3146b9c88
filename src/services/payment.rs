use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;

use crate::config;
use crate::external::{CheckoutLineItem, PaymentGateway};
use crate::models::{Course, CoursePayment, PaymentStatus};
use crate::services::{decode, ServiceError, ServiceResult};
use crate::store::{collections, DocumentStore, CENTRAL_NAMESPACE};
use crate::tenant::TenantResolver;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutRequest {
    pub course_id: Uuid,
    pub student_id: Uuid,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutResponse {
    pub url: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentRecord {
    pub school_id: Uuid,
    pub course_id: Uuid,
    pub student_id: Uuid,
    #[serde(default)]
    pub gateway_txn_id: Option<String>,
    pub amount: i64,
    pub status: PaymentStatus,
}

/// Checkout sessions against the gateway and the central payment ledger the
/// entitlement fan-out reads from.
pub struct PaymentService<S: DocumentStore> {
    store: Arc<S>,
    resolver: Arc<TenantResolver<S>>,
    gateway: Arc<dyn PaymentGateway>,
}

impl<S: DocumentStore> Clone for PaymentService<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            resolver: Arc::clone(&self.resolver),
            gateway: Arc::clone(&self.gateway),
        }
    }
}

impl<S: DocumentStore> PaymentService<S> {
    pub fn new(
        store: Arc<S>,
        resolver: Arc<TenantResolver<S>>,
        gateway: Arc<dyn PaymentGateway>,
    ) -> Self {
        Self {
            store,
            resolver,
            gateway,
        }
    }

    /// Opens a gateway checkout session for a tenant's course. Amounts go to
    /// the gateway in minor units.
    pub async fn create_checkout_session(
        &self,
        tenant: &str,
        request: CheckoutRequest,
    ) -> ServiceResult<CheckoutResponse> {
        let handle = self.resolver.resolve(tenant).await?;
        let doc = self
            .store
            .find_by_id(&handle.database, collections::COURSES, request.course_id)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Course not found".to_string()))?;
        let course: Course = decode(doc)?;
        if course.is_deleted {
            return Err(ServiceError::NotFound("Course not found".to_string()));
        }

        let client_url = &config::config().client_url;
        let session = self
            .gateway
            .create_checkout_session(CheckoutLineItem {
                name: course.course_name,
                thumbnail: course.course_thumbnail,
                unit_amount: course.fee * 100,
                currency: "inr".to_string(),
                success_url: format!(
                    "{client_url}/student/payment-success?courseId={}",
                    course.id
                ),
                cancel_url: format!("{client_url}/student/payment-cancelled"),
            })
            .await
            .map_err(|e| ServiceError::Upstream(e.to_string()))?;

        Ok(CheckoutResponse { url: session.url })
    }

    /// Appends a row to the central ledger. Status is recorded as given;
    /// reads downstream do not distinguish statuses.
    pub async fn record_payment(&self, record: PaymentRecord) -> ServiceResult<CoursePayment> {
        let doc = self
            .store
            .insert(
                CENTRAL_NAMESPACE,
                collections::COURSE_PAYMENTS,
                json!({
                    "schoolId": record.school_id,
                    "courseId": record.course_id,
                    "studentId": record.student_id,
                    "gatewayTxnId": record.gateway_txn_id,
                    "amount": record.amount,
                    "currency": "inr",
                    "status": record.status,
                }),
            )
            .await?;
        decode(doc)
    }

    /// Every ledger row for a student, newest first is not guaranteed; rows
    /// come back in insertion order.
    pub async fn payments_for_student(
        &self,
        student_id: Uuid,
    ) -> ServiceResult<Vec<CoursePayment>> {
        let docs = self
            .store
            .find(
                CENTRAL_NAMESPACE,
                collections::COURSE_PAYMENTS,
                crate::store::Query::new().eq("studentId", student_id.to_string()),
            )
            .await?;
        docs.into_iter()
            .map(decode::<CoursePayment>)
            .collect::<ServiceResult<Vec<_>>>()
    }
}
