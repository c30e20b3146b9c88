use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::auth::{hash_password, issue_access_token, issue_refresh_token, verify_password};
use crate::models::Admin;
use crate::services::{decode, ServiceError, ServiceResult};
use crate::store::{collections, DocumentStore, Query, CENTRAL_NAMESPACE};

#[derive(Debug, Clone, Deserialize)]
pub struct AdminCredentials {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminSession {
    pub admin: Admin,
    pub access_token: String,
    pub refresh_token: String,
}

/// Platform operator accounts in the central namespace.
pub struct AdminService<S: DocumentStore> {
    store: Arc<S>,
}

impl<S: DocumentStore> Clone for AdminService<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}

impl<S: DocumentStore> AdminService<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    pub async fn register(&self, credentials: AdminCredentials) -> ServiceResult<Admin> {
        if credentials.email.trim().is_empty() || !credentials.email.contains('@') {
            return Err(ServiceError::Validation(
                "a valid email is required".to_string(),
            ));
        }
        if credentials.password.len() < 6 {
            return Err(ServiceError::Validation(
                "password must be at least 6 characters".to_string(),
            ));
        }

        if self.find_by_email(&credentials.email).await?.is_some() {
            return Err(ServiceError::Conflict(
                "An admin with this email already exists".to_string(),
            ));
        }

        let doc = self
            .store
            .insert(
                CENTRAL_NAMESPACE,
                collections::ADMINS,
                json!({
                    "email": credentials.email,
                    "password": hash_password(&credentials.password),
                }),
            )
            .await?;
        decode(doc)
    }

    pub async fn login(&self, credentials: AdminCredentials) -> ServiceResult<AdminSession> {
        let admin = self
            .find_by_email(&credentials.email)
            .await?
            .ok_or_else(|| ServiceError::Unauthorized("Invalid email or password".to_string()))?;

        if !verify_password(&credentials.password, &admin.password) {
            return Err(ServiceError::Unauthorized(
                "Invalid email or password".to_string(),
            ));
        }

        let access_token = issue_access_token(admin.id, &admin.email, "admin", None)?;
        let refresh_token = issue_refresh_token(admin.id, &admin.email, "admin", None)?;

        Ok(AdminSession {
            admin,
            access_token,
            refresh_token,
        })
    }

    async fn find_by_email(&self, email: &str) -> ServiceResult<Option<Admin>> {
        let docs = self
            .store
            .find(
                CENTRAL_NAMESPACE,
                collections::ADMINS,
                Query::new().eq("email", email.to_string()),
            )
            .await?;
        docs.into_iter().next().map(decode).transpose()
    }
}
