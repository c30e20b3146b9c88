//! Document-store abstraction with per-tenant namespacing.
//!
//! A namespace maps to one physical database. Consistency between collections
//! is application-managed; the only concurrency boundary is the store's own
//! transaction, which is always scoped to a single namespace.

pub mod memory;
pub mod postgres;
pub mod query;

use async_trait::async_trait;
use chrono::Utc;
use serde_json::{json, Value};
use thiserror::Error;
use uuid::Uuid;

pub use query::{Query, SortDirection};

/// The central namespace: schools directory, global student roster, and
/// course payments. Everything else lives in per-school namespaces.
pub const CENTRAL_NAMESPACE: &str = "eduvia_main";

pub mod collections {
    pub const SCHOOLS: &str = "schools";
    pub const STUDENTS: &str = "students";
    pub const ADMINS: &str = "admins";
    pub const COURSE_PAYMENTS: &str = "course_payments";
    pub const COURSES: &str = "courses";
    pub const SECTIONS: &str = "sections";
    pub const VIDEOS: &str = "videos";
    pub const EXAMS: &str = "exams";
    pub const QUESTIONS: &str = "questions";
    pub const COMMENTS: &str = "comments";
}

/// Collections provisioned in every tenant namespace.
pub const TENANT_COLLECTIONS: &[&str] = &[
    collections::COURSES,
    collections::SECTIONS,
    collections::VIDEOS,
    collections::EXAMS,
    collections::QUESTIONS,
    collections::COMMENTS,
    collections::STUDENTS,
];

pub const CENTRAL_COLLECTIONS: &[&str] = &[
    collections::SCHOOLS,
    collections::STUDENTS,
    collections::ADMINS,
    collections::COURSE_PAYMENTS,
];

pub fn collections_for(namespace: &str) -> &'static [&'static str] {
    if namespace == CENTRAL_NAMESPACE {
        CENTRAL_COLLECTIONS
    } else {
        TENANT_COLLECTIONS
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Invalid namespace: {0}")]
    InvalidNamespace(String),

    #[error("Unknown namespace: {0}")]
    UnknownNamespace(String),

    #[error("Unknown collection: {0}")]
    UnknownCollection(String),

    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    #[error("Write to {collection} failed: {message}")]
    WriteFailed { collection: String, message: String },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Missing configuration: {0}")]
    ConfigMissing(&'static str),

    #[error("Invalid database URL")]
    InvalidDatabaseUrl,

    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

/// Backend-neutral document operations. Documents are JSON objects carrying
/// `id`, `createdAt`, and `updatedAt` fields stamped by the store.
#[async_trait]
pub trait DocumentStore: Send + Sync + 'static {
    /// Create-or-reuse the namespace and its collections. Idempotent:
    /// registering an already-known namespace succeeds without side effects.
    async fn register_namespace(&self, namespace: &str) -> Result<(), StoreError>;

    async fn insert(
        &self,
        namespace: &str,
        collection: &str,
        doc: Value,
    ) -> Result<Value, StoreError>;

    async fn find_by_id(
        &self,
        namespace: &str,
        collection: &str,
        id: Uuid,
    ) -> Result<Option<Value>, StoreError>;

    /// Shallow-merges `patch` into the stored document. Returns the updated
    /// document, or `None` when the id does not resolve.
    async fn update(
        &self,
        namespace: &str,
        collection: &str,
        id: Uuid,
        patch: Value,
    ) -> Result<Option<Value>, StoreError>;

    async fn find(
        &self,
        namespace: &str,
        collection: &str,
        query: Query,
    ) -> Result<Vec<Value>, StoreError>;

    async fn count(
        &self,
        namespace: &str,
        collection: &str,
        query: Query,
    ) -> Result<i64, StoreError>;

    /// Open a multi-collection transaction scoped to one namespace.
    async fn begin(&self, namespace: &str) -> Result<Box<dyn StoreSession>, StoreError>;
}

/// Writes buffered under one transaction. `commit` applies every write or
/// none; dropping a session without calling `commit` must leave the
/// namespace untouched.
#[async_trait]
pub trait StoreSession: Send {
    async fn insert(&mut self, collection: &str, doc: Value) -> Result<Value, StoreError>;

    async fn update(&mut self, collection: &str, id: Uuid, patch: Value)
        -> Result<(), StoreError>;

    async fn commit(self: Box<Self>) -> Result<(), StoreError>;

    async fn rollback(self: Box<Self>) -> Result<(), StoreError>;
}

/// Stamps a fresh document with id and timestamps. Returns the id alongside
/// the finished document.
pub(crate) fn stamp_new(doc: Value) -> Result<(Uuid, Value), StoreError> {
    let mut doc = match doc {
        Value::Object(map) => Value::Object(map),
        other => {
            return Err(StoreError::InvalidQuery(format!(
                "documents must be JSON objects, got {other}"
            )))
        }
    };
    let id = Uuid::new_v4();
    let now = Utc::now();
    let map = doc.as_object_mut().expect("checked above");
    map.insert("id".to_string(), json!(id));
    map.insert("createdAt".to_string(), json!(now));
    map.insert("updatedAt".to_string(), json!(now));
    Ok((id, doc))
}

/// Adds an `updatedAt` stamp to a patch before it is merged.
pub(crate) fn stamp_patch(patch: Value) -> Result<Value, StoreError> {
    let mut patch = match patch {
        Value::Object(map) => Value::Object(map),
        other => {
            return Err(StoreError::InvalidQuery(format!(
                "patches must be JSON objects, got {other}"
            )))
        }
    };
    patch
        .as_object_mut()
        .expect("checked above")
        .insert("updatedAt".to_string(), json!(Utc::now()));
    Ok(patch)
}

/// Shallow merge: every top-level key of `patch` replaces the stored value.
pub(crate) fn merge_doc(doc: &mut Value, patch: &Value) {
    if let (Some(target), Some(source)) = (doc.as_object_mut(), patch.as_object()) {
        for (key, value) in source {
            target.insert(key.clone(), value.clone());
        }
    }
}

/// Extracts the stamped id from a stored document.
pub fn doc_id(doc: &Value) -> Result<Uuid, StoreError> {
    doc.get("id")
        .and_then(Value::as_str)
        .and_then(|s| Uuid::parse_str(s).ok())
        .ok_or_else(|| StoreError::InvalidQuery("document has no id".to_string()))
}
