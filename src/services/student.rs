use std::sync::Arc;

use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::warn;
use uuid::Uuid;

use crate::auth::{hash_password, issue_access_token, issue_refresh_token, verify_password};
use crate::config;
use crate::external::{EmailMessage, Mailer};
use crate::models::Student;
use crate::services::{decode, ServiceError, ServiceResult};
use crate::store::{collections, DocumentStore, Query, CENTRAL_NAMESPACE};

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentRegistration {
    pub full_name: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StudentCredentials {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PasswordReset {
    pub email: String,
    pub token: String,
    pub new_password: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentSession {
    pub student: Student,
    pub access_token: String,
    pub refresh_token: String,
}

/// Students live in the central namespace; one account spans every school.
pub struct StudentService<S: DocumentStore> {
    store: Arc<S>,
    mailer: Arc<dyn Mailer>,
}

impl<S: DocumentStore> Clone for StudentService<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            mailer: Arc::clone(&self.mailer),
        }
    }
}

impl<S: DocumentStore> StudentService<S> {
    pub fn new(store: Arc<S>, mailer: Arc<dyn Mailer>) -> Self {
        Self { store, mailer }
    }

    pub async fn register(&self, input: StudentRegistration) -> ServiceResult<Student> {
        if input.full_name.trim().is_empty() {
            return Err(ServiceError::Validation("fullName is required".to_string()));
        }
        if input.email.trim().is_empty() || !input.email.contains('@') {
            return Err(ServiceError::Validation(
                "a valid email is required".to_string(),
            ));
        }
        if input.password.len() < 6 {
            return Err(ServiceError::Validation(
                "password must be at least 6 characters".to_string(),
            ));
        }

        let existing = self
            .store
            .find(
                CENTRAL_NAMESPACE,
                collections::STUDENTS,
                Query::new().eq("email", input.email.clone()),
            )
            .await?;
        if !existing.is_empty() {
            return Err(ServiceError::Conflict(
                "A student with this email already exists".to_string(),
            ));
        }

        let doc = self
            .store
            .insert(
                CENTRAL_NAMESPACE,
                collections::STUDENTS,
                json!({
                    "fullName": input.full_name,
                    "email": input.email,
                    "password": hash_password(&input.password),
                    "isVerified": false,
                    "resetPasswordToken": null,
                    "resetPasswordExpires": null,
                }),
            )
            .await?;
        decode(doc)
    }

    pub async fn login(&self, credentials: StudentCredentials) -> ServiceResult<StudentSession> {
        let student = self
            .find_by_email(&credentials.email)
            .await?
            .ok_or_else(|| ServiceError::Unauthorized("Invalid email or password".to_string()))?;

        if !verify_password(&credentials.password, &student.password) {
            return Err(ServiceError::Unauthorized(
                "Invalid email or password".to_string(),
            ));
        }

        let access_token = issue_access_token(student.id, &student.email, "student", None)?;
        let refresh_token = issue_refresh_token(student.id, &student.email, "student", None)?;

        Ok(StudentSession {
            student,
            access_token,
            refresh_token,
        })
    }

    pub async fn get_student(&self, student_id: Uuid) -> ServiceResult<Student> {
        let doc = self
            .store
            .find_by_id(CENTRAL_NAMESPACE, collections::STUDENTS, student_id)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Student not found".to_string()))?;
        decode(doc)
    }

    /// Stores a one-time reset token and emails the reset link. Succeeds
    /// even when delivery fails; the token is already persisted.
    pub async fn forgot_password(&self, email: &str) -> ServiceResult<()> {
        let student = self
            .find_by_email(email)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Student not found".to_string()))?;

        let token = Uuid::new_v4().simple().to_string();
        let expires = Utc::now()
            + Duration::minutes(config::config().security.reset_token_expiry_mins);

        self.store
            .update(
                CENTRAL_NAMESPACE,
                collections::STUDENTS,
                student.id,
                json!({
                    "resetPasswordToken": token,
                    "resetPasswordExpires": expires,
                }),
            )
            .await?;

        let link = format!(
            "{}/student/reset-password?email={}&token={token}",
            config::config().client_url,
            student.email
        );
        if let Err(err) = self
            .mailer
            .send(EmailMessage {
                to: student.email.clone(),
                subject: "Password reset".to_string(),
                html: format!("<p>Reset your password: <a href=\"{link}\">{link}</a></p>"),
            })
            .await
        {
            warn!(email = %student.email, error = %err, "reset email failed");
        }

        Ok(())
    }

    /// Consumes the reset token: validates match and expiry, swaps the
    /// password digest, and clears the token fields.
    pub async fn reset_password(&self, reset: PasswordReset) -> ServiceResult<Student> {
        if reset.new_password.len() < 6 {
            return Err(ServiceError::Validation(
                "password must be at least 6 characters".to_string(),
            ));
        }

        let student = self
            .find_by_email(&reset.email)
            .await?
            .ok_or_else(|| {
                ServiceError::Unauthorized("Invalid or expired reset token".to_string())
            })?;

        let valid = student
            .reset_password_token
            .as_deref()
            .is_some_and(|stored| stored == reset.token)
            && student
                .reset_password_expires
                .is_some_and(|expires| expires > Utc::now());
        if !valid {
            return Err(ServiceError::Unauthorized(
                "Invalid or expired reset token".to_string(),
            ));
        }

        let doc = self
            .store
            .update(
                CENTRAL_NAMESPACE,
                collections::STUDENTS,
                student.id,
                json!({
                    "password": hash_password(&reset.new_password),
                    "resetPasswordToken": null,
                    "resetPasswordExpires": null,
                }),
            )
            .await?
            .ok_or_else(|| ServiceError::NotFound("Student not found".to_string()))?;
        decode(doc)
    }

    async fn find_by_email(&self, email: &str) -> ServiceResult<Option<Student>> {
        let docs = self
            .store
            .find(
                CENTRAL_NAMESPACE,
                collections::STUDENTS,
                Query::new().eq("email", email.to_string()),
            )
            .await?;
        docs.into_iter().next().map(decode::<Student>).transpose()
    }
}
