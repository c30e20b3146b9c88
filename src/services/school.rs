use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{info, warn};
use uuid::Uuid;

use crate::auth::{hash_password, issue_access_token, issue_refresh_token, verify_password};
use crate::config;
use crate::external::{EmailMessage, Mailer};
use crate::models::{Pagination, School};
use crate::services::{decode, ServiceError, ServiceResult};
use crate::store::{collections, DocumentStore, Query, SortDirection, CENTRAL_NAMESPACE};
use crate::tenant::{derive_slug, TenantResolver};

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchoolRegistration {
    pub name: String,
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub experience: Option<String>,
    #[serde(default)]
    pub courses_offered: Vec<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub official_contact: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SchoolCredentials {
    pub email: String,
    pub password: String,
}

/// Admin-side profile update. Only present fields change; a newly assigned
/// subdomain also bootstraps the tenant namespace.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchoolUpdate {
    pub name: Option<String>,
    pub experience: Option<String>,
    pub courses_offered: Option<Vec<String>>,
    pub is_verified: Option<bool>,
    pub sub_domain: Option<String>,
    pub image: Option<String>,
    pub cover_image: Option<String>,
    pub address: Option<String>,
    pub official_contact: Option<String>,
}

/// Result of a tenant namespace bootstrap.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TenantInit {
    pub slug: String,
    pub database: String,
    pub already_initialized: bool,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SchoolSession {
    pub school: School,
    pub access_token: String,
    pub refresh_token: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListSchoolsParams {
    pub search: Option<String>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SchoolPage {
    pub schools: Vec<School>,
    pub pagination: Pagination,
}

/// Central directory of schools: registration, login, admin listing and
/// updates, and tenant bootstrap on subdomain assignment.
pub struct SchoolService<S: DocumentStore> {
    store: Arc<S>,
    resolver: Arc<TenantResolver<S>>,
    mailer: Arc<dyn Mailer>,
}

impl<S: DocumentStore> Clone for SchoolService<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            resolver: Arc::clone(&self.resolver),
            mailer: Arc::clone(&self.mailer),
        }
    }
}

impl<S: DocumentStore> SchoolService<S> {
    pub fn new(store: Arc<S>, resolver: Arc<TenantResolver<S>>, mailer: Arc<dyn Mailer>) -> Self {
        Self {
            store,
            resolver,
            mailer,
        }
    }

    pub async fn register(&self, input: SchoolRegistration) -> ServiceResult<School> {
        if input.name.trim().is_empty() {
            return Err(ServiceError::Validation("name is required".to_string()));
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
                collections::SCHOOLS,
                Query::new().eq("email", input.email.clone()),
            )
            .await?;
        if !existing.is_empty() {
            return Err(ServiceError::Conflict(
                "A school with this email already exists".to_string(),
            ));
        }

        let doc = self
            .store
            .insert(
                CENTRAL_NAMESPACE,
                collections::SCHOOLS,
                json!({
                    "name": input.name,
                    "email": input.email,
                    "password": hash_password(&input.password),
                    "experience": input.experience,
                    "coursesOffered": input.courses_offered,
                    "isVerified": false,
                    "subDomain": null,
                    "image": null,
                    "coverImage": null,
                    "address": input.address,
                    "officialContact": input.official_contact,
                }),
            )
            .await?;
        let school: School = decode(doc)?;

        // Failed delivery never fails registration
        if let Err(err) = self
            .mailer
            .send(EmailMessage {
                to: school.email.clone(),
                subject: "Welcome to Eduvia".to_string(),
                html: format!(
                    "<p>Hi {}, your registration was received and is awaiting verification.</p>",
                    school.name
                ),
            })
            .await
        {
            warn!(school = %school.name, error = %err, "welcome email failed");
        }

        Ok(school)
    }

    pub async fn login(&self, credentials: SchoolCredentials) -> ServiceResult<SchoolSession> {
        let docs = self
            .store
            .find(
                CENTRAL_NAMESPACE,
                collections::SCHOOLS,
                Query::new().eq("email", credentials.email.clone()),
            )
            .await?;
        let doc = docs
            .into_iter()
            .next()
            .ok_or_else(|| ServiceError::Unauthorized("Invalid email or password".to_string()))?;
        let school: School = decode(doc)?;

        if !verify_password(&credentials.password, &school.password) {
            return Err(ServiceError::Unauthorized(
                "Invalid email or password".to_string(),
            ));
        }

        let access_token = issue_access_token(
            school.id,
            &school.email,
            "school",
            school.sub_domain.as_deref(),
        )?;
        let refresh_token = issue_refresh_token(
            school.id,
            &school.email,
            "school",
            school.sub_domain.as_deref(),
        )?;

        Ok(SchoolSession {
            school,
            access_token,
            refresh_token,
        })
    }

    /// Admin listing in newest-first order; search matches the school name.
    pub async fn list_schools(&self, params: ListSchoolsParams) -> ServiceResult<SchoolPage> {
        let rules = &config::config().course;
        let limit = params
            .limit
            .unwrap_or(rules.default_page_limit)
            .clamp(1, rules.max_page_limit);
        let page = params.page.unwrap_or(1).max(1);

        let mut filter = Query::new();
        if let Some(search) = &params.search {
            filter = filter.search(&["name"], search);
        }

        let total = self
            .store
            .count(CENTRAL_NAMESPACE, collections::SCHOOLS, filter.clone())
            .await?;
        let rows = self
            .store
            .find(
                CENTRAL_NAMESPACE,
                collections::SCHOOLS,
                filter
                    .sort("createdAt", SortDirection::Desc)
                    .skip(page.saturating_sub(1).saturating_mul(limit))
                    .limit(limit),
            )
            .await?;

        let schools = rows
            .into_iter()
            .map(decode::<School>)
            .collect::<ServiceResult<Vec<_>>>()?;

        Ok(SchoolPage {
            schools,
            pagination: Pagination::new(total, page, limit),
        })
    }

    pub async fn get_school(&self, school_id: Uuid) -> ServiceResult<School> {
        let doc = self
            .store
            .find_by_id(CENTRAL_NAMESPACE, collections::SCHOOLS, school_id)
            .await?
            .ok_or_else(|| ServiceError::NotFound("School not found".to_string()))?;
        decode(doc)
    }

    pub async fn get_by_subdomain(&self, sub_domain: &str) -> ServiceResult<School> {
        let docs = self
            .store
            .find(
                CENTRAL_NAMESPACE,
                collections::SCHOOLS,
                Query::new().eq("subDomain", sub_domain.to_string()),
            )
            .await?;
        let doc = docs
            .into_iter()
            .next()
            .ok_or_else(|| ServiceError::NotFound("School not found".to_string()))?;
        decode(doc)
    }

    /// Applies the patch and, when a subdomain is assigned for the first
    /// time, bootstraps that tenant's namespace so course endpoints work
    /// immediately.
    pub async fn update_school(
        &self,
        school_id: Uuid,
        update: SchoolUpdate,
    ) -> ServiceResult<School> {
        let before = self.get_school(school_id).await?;

        let mut patch = serde_json::Map::new();
        if let Some(name) = &update.name {
            patch.insert("name".to_string(), json!(name));
        }
        if let Some(experience) = &update.experience {
            patch.insert("experience".to_string(), json!(experience));
        }
        if let Some(courses) = &update.courses_offered {
            patch.insert("coursesOffered".to_string(), json!(courses));
        }
        if let Some(verified) = update.is_verified {
            patch.insert("isVerified".to_string(), json!(verified));
        }
        if let Some(sub_domain) = &update.sub_domain {
            patch.insert("subDomain".to_string(), json!(sub_domain));
        }
        if let Some(image) = &update.image {
            patch.insert("image".to_string(), json!(image));
        }
        if let Some(cover) = &update.cover_image {
            patch.insert("coverImage".to_string(), json!(cover));
        }
        if let Some(address) = &update.address {
            patch.insert("address".to_string(), json!(address));
        }
        if let Some(contact) = &update.official_contact {
            patch.insert("officialContact".to_string(), json!(contact));
        }
        if patch.is_empty() {
            return Ok(before);
        }

        let doc = self
            .store
            .update(
                CENTRAL_NAMESPACE,
                collections::SCHOOLS,
                school_id,
                serde_json::Value::Object(patch),
            )
            .await?
            .ok_or_else(|| ServiceError::NotFound("School not found".to_string()))?;
        let school: School = decode(doc)?;

        if before.sub_domain.is_none() {
            if let Some(sub_domain) = school.sub_domain.as_deref() {
                let init = self.init_tenant(sub_domain).await?;
                info!(school = %school.name, slug = %init.slug, "tenant namespace bootstrapped");

                if let Err(err) = self
                    .mailer
                    .send(EmailMessage {
                        to: school.email.clone(),
                        subject: "Your school portal is live".to_string(),
                        html: format!(
                            "<p>{} is now reachable at <a href=\"https://{sub_domain}\">{sub_domain}</a>.</p>",
                            school.name
                        ),
                    })
                    .await
                {
                    warn!(school = %school.name, error = %err, "subdomain email failed");
                }
            }
        }

        if !before.is_verified && school.is_verified {
            if let Err(err) = self
                .mailer
                .send(EmailMessage {
                    to: school.email.clone(),
                    subject: "Your school is verified".to_string(),
                    html: format!("<p>{} has been verified.</p>", school.name),
                })
                .await
            {
                warn!(school = %school.name, error = %err, "verification email failed");
            }
        }

        Ok(school)
    }

    /// Resolves the subdomain into a tenant namespace, creating it if this
    /// is the first contact, and reports which case applied.
    pub async fn init_tenant(&self, sub_domain: &str) -> ServiceResult<TenantInit> {
        let slug = derive_slug(sub_domain)?;
        let (handle, already_initialized) = self.resolver.resolve_with_status(&slug).await?;
        Ok(TenantInit {
            slug: handle.slug,
            database: handle.database,
            already_initialized,
        })
    }
}
