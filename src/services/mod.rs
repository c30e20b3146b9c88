//! Service layer: business rules over the document store. Repository-level
//! errors propagate unchanged; domain failures get human-readable messages.

pub mod admin;
pub mod catalog;
pub mod comment;
pub mod composition;
pub mod course_query;
pub mod entitlement;
pub mod payment;
pub mod school;
pub mod student;

use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;

use crate::auth::JwtError;
use crate::store::StoreError;
use crate::tenant::TenantError;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("Upstream failure: {0}")]
    Upstream(String),

    #[error(transparent)]
    Tenant(#[from] TenantError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Jwt(#[from] JwtError),
}

pub type ServiceResult<T> = Result<T, ServiceError>;

/// Decodes a stored document into a typed model. A failure here means the
/// stored shape drifted from the model and is reported as a store-level
/// problem, not a caller mistake.
pub(crate) fn decode<T: DeserializeOwned>(doc: Value) -> ServiceResult<T> {
    serde_json::from_value(doc).map_err(|e| ServiceError::Store(StoreError::Serialization(e)))
}
