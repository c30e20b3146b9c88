use std::sync::Arc;

use crate::external::{Mailer, PaymentGateway};
use crate::services::admin::AdminService;
use crate::services::catalog::CatalogService;
use crate::services::comment::CommentService;
use crate::services::composition::CourseCompositionService;
use crate::services::course_query::CourseQueryService;
use crate::services::entitlement::EntitlementService;
use crate::services::payment::PaymentService;
use crate::services::school::SchoolService;
use crate::services::student::StudentService;
use crate::store::DocumentStore;
use crate::tenant::TenantResolver;

/// Shared application state handed to every handler. All services sit behind
/// the same store and resolver instances so tenant handles are cached once
/// per process.
pub struct AppState<S: DocumentStore> {
    pub store: Arc<S>,
    pub resolver: Arc<TenantResolver<S>>,
    pub schools: SchoolService<S>,
    pub students: StudentService<S>,
    pub admins: AdminService<S>,
    pub composition: CourseCompositionService<S>,
    pub courses: CourseQueryService<S>,
    pub catalog: CatalogService<S>,
    pub comments: CommentService<S>,
    pub payments: PaymentService<S>,
    pub entitlements: EntitlementService<S>,
}

impl<S: DocumentStore> Clone for AppState<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            resolver: Arc::clone(&self.resolver),
            schools: self.schools.clone(),
            students: self.students.clone(),
            admins: self.admins.clone(),
            composition: self.composition.clone(),
            courses: self.courses.clone(),
            catalog: self.catalog.clone(),
            comments: self.comments.clone(),
            payments: self.payments.clone(),
            entitlements: self.entitlements.clone(),
        }
    }
}

impl<S: DocumentStore> AppState<S> {
    pub fn new(store: Arc<S>, mailer: Arc<dyn Mailer>, gateway: Arc<dyn PaymentGateway>) -> Self {
        let resolver = Arc::new(TenantResolver::new(Arc::clone(&store)));
        Self {
            schools: SchoolService::new(
                Arc::clone(&store),
                Arc::clone(&resolver),
                Arc::clone(&mailer),
            ),
            students: StudentService::new(Arc::clone(&store), mailer),
            admins: AdminService::new(Arc::clone(&store)),
            composition: CourseCompositionService::new(Arc::clone(&store), Arc::clone(&resolver)),
            courses: CourseQueryService::new(Arc::clone(&store), Arc::clone(&resolver)),
            catalog: CatalogService::new(Arc::clone(&store), Arc::clone(&resolver)),
            comments: CommentService::new(Arc::clone(&store), Arc::clone(&resolver)),
            payments: PaymentService::new(Arc::clone(&store), Arc::clone(&resolver), gateway),
            entitlements: EntitlementService::new(Arc::clone(&store), Arc::clone(&resolver)),
            store,
            resolver,
        }
    }
}
