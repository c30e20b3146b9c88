use std::collections::HashSet;
use std::sync::Arc;

use serde::Serialize;
use tracing::warn;
use uuid::Uuid;

use crate::models::{Course, CoursePayment, School};
use crate::services::{decode, ServiceError, ServiceResult};
use crate::store::{collections, DocumentStore, Query, CENTRAL_NAMESPACE};
use crate::tenant::{derive_slug, TenantResolver};

/// One resolved (tenant, course) pair a student has paid towards.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Entitlement {
    pub tenant_slug: String,
    pub course: Course,
}

/// Resolves a global student to their per-school courses by joining the
/// central payments collection against the schools directory, then probing
/// each tenant namespace.
pub struct EntitlementService<S: DocumentStore> {
    store: Arc<S>,
    resolver: Arc<TenantResolver<S>>,
}

impl<S: DocumentStore> Clone for EntitlementService<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            resolver: Arc::clone(&self.resolver),
        }
    }
}

impl<S: DocumentStore> EntitlementService<S> {
    pub fn new(store: Arc<S>, resolver: Arc<TenantResolver<S>>) -> Self {
        Self { store, resolver }
    }

    /// Fan-out in first-seen payment order. A failed tenant lookup is
    /// logged and skipped so every resolvable entitlement still comes back;
    /// only the central payments query itself fails hard.
    ///
    /// Payments are matched regardless of status, and zero payment rows is
    /// reported as an error rather than an empty list.
    pub async fn find_entitlements_for_student(
        &self,
        student_id: Uuid,
    ) -> ServiceResult<Vec<Entitlement>> {
        let payments = self
            .store
            .find(
                CENTRAL_NAMESPACE,
                collections::COURSE_PAYMENTS,
                Query::new().eq("studentId", student_id.to_string()),
            )
            .await?;

        if payments.is_empty() {
            return Err(ServiceError::NotFound(
                "No course payments found for this student".to_string(),
            ));
        }

        let mut seen: HashSet<(Uuid, Uuid)> = HashSet::new();
        let mut entitlements = Vec::new();

        for doc in payments {
            let payment: CoursePayment = match decode(doc) {
                Ok(p) => p,
                Err(err) => {
                    warn!(%student_id, error = %err, "skipping malformed payment record");
                    continue;
                }
            };

            if !seen.insert((payment.school_id, payment.course_id)) {
                continue;
            }

            match self.resolve_entitlement(&payment).await {
                Ok(Some(entitlement)) => entitlements.push(entitlement),
                Ok(None) => {}
                Err(err) => {
                    warn!(
                        school_id = %payment.school_id,
                        course_id = %payment.course_id,
                        error = %err,
                        "skipping unresolvable entitlement"
                    );
                }
            }
        }

        Ok(entitlements)
    }

    async fn resolve_entitlement(
        &self,
        payment: &CoursePayment,
    ) -> ServiceResult<Option<Entitlement>> {
        let Some(doc) = self
            .store
            .find_by_id(CENTRAL_NAMESPACE, collections::SCHOOLS, payment.school_id)
            .await?
        else {
            warn!(school_id = %payment.school_id, "school record missing, skipping");
            return Ok(None);
        };
        let school: School = decode(doc)?;

        let Some(sub_domain) = school.sub_domain.as_deref() else {
            warn!(school = %school.name, "school has no subdomain yet, skipping");
            return Ok(None);
        };

        let slug = derive_slug(sub_domain)?;
        let handle = self.resolver.resolve(&slug).await?;

        let Some(doc) = self
            .store
            .find_by_id(&handle.database, collections::COURSES, payment.course_id)
            .await?
        else {
            warn!(course_id = %payment.course_id, tenant = %slug, "course missing in tenant, skipping");
            return Ok(None);
        };
        let course: Course = decode(doc)?;

        Ok(Some(Entitlement {
            tenant_slug: handle.slug,
            course,
        }))
    }
}
