//! In-process store binding. Backs the test suite and local runs without a
//! Postgres instance; write faults can be injected to exercise transaction
//! rollback paths.

use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::store::query::{Query, SortDirection};
use crate::store::{
    collections_for, doc_id, merge_doc, stamp_new, stamp_patch, DocumentStore, StoreError,
    StoreSession,
};

type Collection = Vec<Value>;
type Namespace = HashMap<String, Collection>;

#[derive(Clone, Default)]
pub struct MemoryStore {
    namespaces: Arc<RwLock<HashMap<String, Namespace>>>,
    insert_faults: Arc<RwLock<HashSet<String>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every subsequent insert into `collection` fail until cleared.
    pub async fn fail_inserts_into(&self, collection: &str) {
        self.insert_faults
            .write()
            .await
            .insert(collection.to_string());
    }

    pub async fn clear_insert_faults(&self) {
        self.insert_faults.write().await.clear();
    }

    async fn check_insert_fault(&self, collection: &str) -> Result<(), StoreError> {
        if self.insert_faults.read().await.contains(collection) {
            return Err(StoreError::WriteFailed {
                collection: collection.to_string(),
                message: "injected fault".to_string(),
            });
        }
        Ok(())
    }
}

fn collection<'a>(
    namespaces: &'a HashMap<String, Namespace>,
    namespace: &str,
    name: &str,
) -> Result<&'a Collection, StoreError> {
    namespaces
        .get(namespace)
        .ok_or_else(|| StoreError::UnknownNamespace(namespace.to_string()))?
        .get(name)
        .ok_or_else(|| StoreError::UnknownCollection(name.to_string()))
}

fn collection_mut<'a>(
    namespaces: &'a mut HashMap<String, Namespace>,
    namespace: &str,
    name: &str,
) -> Result<&'a mut Collection, StoreError> {
    namespaces
        .get_mut(namespace)
        .ok_or_else(|| StoreError::UnknownNamespace(namespace.to_string()))?
        .get_mut(name)
        .ok_or_else(|| StoreError::UnknownCollection(name.to_string()))
}

fn matches(query: &Query, doc: &Value) -> bool {
    for (field, expected) in query.eq_clauses() {
        if doc.get(field).unwrap_or(&Value::Null) != expected {
            return false;
        }
    }
    if let Some((fields, term)) = query.search_clause() {
        let needle = term.to_lowercase();
        let hit = fields.iter().any(|field| {
            doc.get(field)
                .and_then(Value::as_str)
                .map(|s| s.to_lowercase().contains(&needle))
                .unwrap_or(false)
        });
        if !hit {
            return false;
        }
    }
    true
}

/// Orders scalar JSON values; nulls and missing fields sort first so they do
/// not interleave with real values.
fn compare_values(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Null, Value::Null) => Ordering::Equal,
        (Value::Null, _) => Ordering::Less,
        (_, Value::Null) => Ordering::Greater,
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        (Value::Number(x), Value::Number(y)) => x
            .as_f64()
            .partial_cmp(&y.as_f64())
            .unwrap_or(Ordering::Equal),
        (Value::String(x), Value::String(y)) => x.cmp(y),
        _ => Ordering::Equal,
    }
}

fn apply_query(docs: &Collection, query: &Query) -> Vec<Value> {
    let mut rows: Vec<Value> = docs.iter().filter(|d| matches(query, d)).cloned().collect();

    if let Some((field, direction)) = query.sort_clause() {
        // sort_by is stable, so ties keep natural storage order
        rows.sort_by(|a, b| {
            let ordering = compare_values(
                a.get(field).unwrap_or(&Value::Null),
                b.get(field).unwrap_or(&Value::Null),
            );
            match direction {
                SortDirection::Asc => ordering,
                SortDirection::Desc => ordering.reverse(),
            }
        });
    }

    let skip = query.skip_clause().unwrap_or(0).max(0) as usize;
    let mut rows: Vec<Value> = rows.into_iter().skip(skip).collect();
    if let Some(limit) = query.limit_clause() {
        rows.truncate(limit.max(0) as usize);
    }
    rows
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn register_namespace(&self, namespace: &str) -> Result<(), StoreError> {
        if namespace.is_empty() {
            return Err(StoreError::InvalidNamespace(namespace.to_string()));
        }
        let mut namespaces = self.namespaces.write().await;
        let ns = namespaces.entry(namespace.to_string()).or_default();
        for name in collections_for(namespace) {
            ns.entry((*name).to_string()).or_default();
        }
        Ok(())
    }

    async fn insert(
        &self,
        namespace: &str,
        collection_name: &str,
        doc: Value,
    ) -> Result<Value, StoreError> {
        self.check_insert_fault(collection_name).await?;
        let (_, doc) = stamp_new(doc)?;
        let mut namespaces = self.namespaces.write().await;
        collection_mut(&mut namespaces, namespace, collection_name)?.push(doc.clone());
        Ok(doc)
    }

    async fn find_by_id(
        &self,
        namespace: &str,
        collection_name: &str,
        id: Uuid,
    ) -> Result<Option<Value>, StoreError> {
        let namespaces = self.namespaces.read().await;
        let docs = collection(&namespaces, namespace, collection_name)?;
        Ok(docs
            .iter()
            .find(|d| doc_id(d).map(|did| did == id).unwrap_or(false))
            .cloned())
    }

    async fn update(
        &self,
        namespace: &str,
        collection_name: &str,
        id: Uuid,
        patch: Value,
    ) -> Result<Option<Value>, StoreError> {
        let patch = stamp_patch(patch)?;
        let mut namespaces = self.namespaces.write().await;
        let docs = collection_mut(&mut namespaces, namespace, collection_name)?;
        for doc in docs.iter_mut() {
            if doc_id(doc).map(|did| did == id).unwrap_or(false) {
                merge_doc(doc, &patch);
                return Ok(Some(doc.clone()));
            }
        }
        Ok(None)
    }

    async fn find(
        &self,
        namespace: &str,
        collection_name: &str,
        query: Query,
    ) -> Result<Vec<Value>, StoreError> {
        query.validate_fields()?;
        let namespaces = self.namespaces.read().await;
        let docs = collection(&namespaces, namespace, collection_name)?;
        Ok(apply_query(docs, &query))
    }

    async fn count(
        &self,
        namespace: &str,
        collection_name: &str,
        query: Query,
    ) -> Result<i64, StoreError> {
        query.validate_fields()?;
        let namespaces = self.namespaces.read().await;
        let docs = collection(&namespaces, namespace, collection_name)?;
        Ok(docs.iter().filter(|d| matches(&query, d)).count() as i64)
    }

    async fn begin(&self, namespace: &str) -> Result<Box<dyn StoreSession>, StoreError> {
        {
            let namespaces = self.namespaces.read().await;
            if !namespaces.contains_key(namespace) {
                return Err(StoreError::UnknownNamespace(namespace.to_string()));
            }
        }
        Ok(Box::new(MemorySession {
            store: self.clone(),
            namespace: namespace.to_string(),
            ops: Vec::new(),
        }))
    }
}

enum BufferedOp {
    Insert { collection: String, doc: Value },
    Update {
        collection: String,
        id: Uuid,
        patch: Value,
    },
}

/// Buffers writes and applies them under a single write lock on commit, so a
/// session either lands entirely or not at all.
struct MemorySession {
    store: MemoryStore,
    namespace: String,
    ops: Vec<BufferedOp>,
}

#[async_trait]
impl StoreSession for MemorySession {
    async fn insert(&mut self, collection_name: &str, doc: Value) -> Result<Value, StoreError> {
        self.store.check_insert_fault(collection_name).await?;
        let (_, doc) = stamp_new(doc)?;
        self.ops.push(BufferedOp::Insert {
            collection: collection_name.to_string(),
            doc: doc.clone(),
        });
        Ok(doc)
    }

    async fn update(
        &mut self,
        collection_name: &str,
        id: Uuid,
        patch: Value,
    ) -> Result<(), StoreError> {
        let patch = stamp_patch(patch)?;
        self.ops.push(BufferedOp::Update {
            collection: collection_name.to_string(),
            id,
            patch,
        });
        Ok(())
    }

    async fn commit(self: Box<Self>) -> Result<(), StoreError> {
        let mut namespaces = self.store.namespaces.write().await;

        // Validate every target up front; a bad op must not leave earlier
        // inserts behind. Updates may point at docs buffered in this session.
        let mut buffered: HashSet<(String, Uuid)> = HashSet::new();
        for op in &self.ops {
            match op {
                BufferedOp::Insert { collection: name, doc } => {
                    collection(&namespaces, &self.namespace, name)?;
                    buffered.insert((name.clone(), doc_id(doc)?));
                }
                BufferedOp::Update {
                    collection: name,
                    id,
                    ..
                } => {
                    let exists = buffered.contains(&(name.clone(), *id))
                        || collection(&namespaces, &self.namespace, name)?
                            .iter()
                            .any(|d| doc_id(d).map(|did| did == *id).unwrap_or(false));
                    if !exists {
                        return Err(StoreError::WriteFailed {
                            collection: name.clone(),
                            message: format!("update target {id} not found"),
                        });
                    }
                }
            }
        }

        for op in self.ops {
            match op {
                BufferedOp::Insert { collection, doc } => {
                    collection_mut(&mut namespaces, &self.namespace, &collection)?.push(doc);
                }
                BufferedOp::Update {
                    collection,
                    id,
                    patch,
                } => {
                    let docs = collection_mut(&mut namespaces, &self.namespace, &collection)?;
                    let target = docs
                        .iter_mut()
                        .find(|d| doc_id(d).map(|did| did == id).unwrap_or(false));
                    match target {
                        Some(doc) => merge_doc(doc, &patch),
                        None => {
                            return Err(StoreError::WriteFailed {
                                collection,
                                message: format!("update target {id} not found"),
                            })
                        }
                    }
                }
            }
        }
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<(), StoreError> {
        // Nothing was applied yet; dropping the buffer is the rollback.
        Ok(())
    }
}
