//! Postgres binding: one database per namespace, one lazily created pool per
//! database, documents in per-collection JSONB tables.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use sqlx::postgres::PgPoolOptions;
use sqlx::{PgPool, Postgres, Row, Transaction};
use tokio::sync::RwLock;
use tracing::info;
use uuid::Uuid;

use crate::config;
use crate::store::query::{Query, SortDirection};
use crate::store::{
    collections_for, stamp_new, stamp_patch, DocumentStore, StoreError, StoreSession,
    CENTRAL_NAMESPACE,
};

#[derive(Clone)]
pub struct PgStore {
    pools: Arc<RwLock<HashMap<String, PgPool>>>,
}

impl PgStore {
    pub fn new() -> Self {
        Self {
            pools: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Pings the central database to ensure connectivity.
    pub async fn health_check(&self) -> Result<(), StoreError> {
        let pool = self.pool(CENTRAL_NAMESPACE).await?;
        sqlx::query("SELECT 1").execute(&pool).await?;
        Ok(())
    }

    /// Close and remove all pools (e.g., on shutdown).
    pub async fn close_all(&self) {
        let mut pools = self.pools.write().await;
        for (name, pool) in pools.drain() {
            pool.close().await;
            info!("Closed database pool: {}", name);
        }
    }

    /// Get existing pool or create a new one lazily.
    async fn pool(&self, database_name: &str) -> Result<PgPool, StoreError> {
        if !Self::is_valid_db_name(database_name) {
            return Err(StoreError::InvalidNamespace(database_name.to_string()));
        }

        // Fast path: try read lock
        {
            let pools = self.pools.read().await;
            if let Some(pool) = pools.get(database_name) {
                return Ok(pool.clone());
            }
        }

        let connection_string = Self::build_connection_string(database_name)?;
        let db_config = &config::config().database;
        let pool = PgPoolOptions::new()
            .max_connections(db_config.max_connections)
            .acquire_timeout(Duration::from_secs(db_config.connection_timeout_secs))
            .connect(&connection_string)
            .await?;

        {
            let mut pools = self.pools.write().await;
            pools.insert(database_name.to_string(), pool.clone());
        }

        info!("Created database pool for: {}", database_name);
        Ok(pool)
    }

    /// Build connection string by swapping the DB name in DATABASE_URL's path.
    fn build_connection_string(database_name: &str) -> Result<String, StoreError> {
        let base = std::env::var("DATABASE_URL")
            .map_err(|_| StoreError::ConfigMissing("DATABASE_URL"))?;

        let mut url = url::Url::parse(&base).map_err(|_| StoreError::InvalidDatabaseUrl)?;
        url.set_path(&format!("/{database_name}"));
        Ok(url.to_string())
    }

    /// Validate database names. Accepts the central database, "postgres" for
    /// admin operations, and `school_` namespaces derived from tenant slugs.
    fn is_valid_db_name(name: &str) -> bool {
        if name == CENTRAL_NAMESPACE || name == "postgres" {
            return true;
        }
        match name.strip_prefix("school_") {
            Some(rest) => {
                !rest.is_empty()
                    && rest
                        .chars()
                        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
            }
            None => false,
        }
    }

    fn quote_identifier(name: &str) -> String {
        format!("\"{}\"", name.replace('"', "\"\""))
    }

    /// Create the physical database when it does not exist yet.
    async fn ensure_database(&self, database_name: &str) -> Result<(), StoreError> {
        let admin_pool = self.pool("postgres").await?;
        let exists: Option<(i32,)> =
            sqlx::query_as("SELECT 1 FROM pg_database WHERE datname = $1")
                .bind(database_name)
                .fetch_optional(&admin_pool)
                .await?;
        if exists.is_none() {
            let query = format!("CREATE DATABASE {}", Self::quote_identifier(database_name));
            sqlx::query(&query).execute(&admin_pool).await?;
            info!("Created database: {}", database_name);
        }
        Ok(())
    }
}

impl Default for PgStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Renders one Query into a WHERE/ORDER/LIMIT tail. All user values are bound
/// as text against `doc->>'field'`; field names are validated beforehand.
fn render_query(query: &Query) -> Result<(String, Vec<String>), StoreError> {
    query.validate_fields()?;

    let mut clauses: Vec<String> = Vec::new();
    let mut params: Vec<String> = Vec::new();

    for (field, value) in query.eq_clauses() {
        if value.is_null() {
            clauses.push(format!("(doc->>'{field}') IS NULL"));
            continue;
        }
        let rendered = match value {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        };
        params.push(rendered);
        clauses.push(format!("doc->>'{field}' = ${}", params.len()));
    }

    if let Some((fields, term)) = query.search_clause() {
        let escaped = term.replace('\\', "\\\\").replace('%', "\\%").replace('_', "\\_");
        params.push(format!("%{escaped}%"));
        let idx = params.len();
        let ors: Vec<String> = fields
            .iter()
            .map(|f| format!("doc->>'{f}' ILIKE ${idx}"))
            .collect();
        clauses.push(format!("({})", ors.join(" OR ")));
    }

    let mut sql = String::new();
    if !clauses.is_empty() {
        sql.push_str(" WHERE ");
        sql.push_str(&clauses.join(" AND "));
    }

    if let Some((field, direction)) = query.sort_clause() {
        // `doc->` keeps the JSONB value so numbers compare numerically, not
        // as text. NULLS placement matches the in-memory binding, which puts
        // missing fields first ascending and last descending.
        let dir = match direction {
            SortDirection::Asc => "ASC NULLS FIRST",
            SortDirection::Desc => "DESC NULLS LAST",
        };
        sql.push_str(&format!(" ORDER BY doc->'{field}' {dir}, seq ASC"));
    } else {
        sql.push_str(" ORDER BY seq ASC");
    }

    if let Some(limit) = query.limit_clause() {
        sql.push_str(&format!(" LIMIT {}", limit.max(0)));
    }
    if let Some(skip) = query.skip_clause() {
        sql.push_str(&format!(" OFFSET {}", skip.max(0)));
    }

    Ok((sql, params))
}

#[async_trait]
impl DocumentStore for PgStore {
    async fn register_namespace(&self, namespace: &str) -> Result<(), StoreError> {
        if !Self::is_valid_db_name(namespace) {
            return Err(StoreError::InvalidNamespace(namespace.to_string()));
        }
        self.ensure_database(namespace).await?;
        let pool = self.pool(namespace).await?;
        for collection in collections_for(namespace) {
            let ddl = format!(
                "CREATE TABLE IF NOT EXISTS {} (\
                 seq BIGSERIAL, \
                 id UUID PRIMARY KEY, \
                 doc JSONB NOT NULL)",
                Self::quote_identifier(collection)
            );
            sqlx::query(&ddl).execute(&pool).await?;
        }
        Ok(())
    }

    async fn insert(
        &self,
        namespace: &str,
        collection: &str,
        doc: Value,
    ) -> Result<Value, StoreError> {
        let (id, doc) = stamp_new(doc)?;
        let pool = self.pool(namespace).await?;
        let sql = format!(
            "INSERT INTO {} (id, doc) VALUES ($1, $2)",
            Self::quote_identifier(collection)
        );
        sqlx::query(&sql).bind(id).bind(&doc).execute(&pool).await?;
        Ok(doc)
    }

    async fn find_by_id(
        &self,
        namespace: &str,
        collection: &str,
        id: Uuid,
    ) -> Result<Option<Value>, StoreError> {
        let pool = self.pool(namespace).await?;
        let sql = format!(
            "SELECT doc FROM {} WHERE id = $1",
            Self::quote_identifier(collection)
        );
        let row = sqlx::query(&sql).bind(id).fetch_optional(&pool).await?;
        row.map(|r| r.try_get::<Value, _>("doc"))
            .transpose()
            .map_err(StoreError::from)
    }

    async fn update(
        &self,
        namespace: &str,
        collection: &str,
        id: Uuid,
        patch: Value,
    ) -> Result<Option<Value>, StoreError> {
        let patch = stamp_patch(patch)?;
        let pool = self.pool(namespace).await?;
        let sql = format!(
            "UPDATE {} SET doc = doc || $2 WHERE id = $1 RETURNING doc",
            Self::quote_identifier(collection)
        );
        let row = sqlx::query(&sql)
            .bind(id)
            .bind(&patch)
            .fetch_optional(&pool)
            .await?;
        row.map(|r| r.try_get::<Value, _>("doc"))
            .transpose()
            .map_err(StoreError::from)
    }

    async fn find(
        &self,
        namespace: &str,
        collection: &str,
        query: Query,
    ) -> Result<Vec<Value>, StoreError> {
        let pool = self.pool(namespace).await?;
        let (tail, params) = render_query(&query)?;
        let sql = format!(
            "SELECT doc FROM {}{tail}",
            Self::quote_identifier(collection)
        );
        let mut q = sqlx::query(&sql);
        for p in &params {
            q = q.bind(p);
        }
        let rows = q.fetch_all(&pool).await?;
        rows.into_iter()
            .map(|r| r.try_get::<Value, _>("doc").map_err(StoreError::from))
            .collect()
    }

    async fn count(
        &self,
        namespace: &str,
        collection: &str,
        query: Query,
    ) -> Result<i64, StoreError> {
        let pool = self.pool(namespace).await?;
        let (tail, params) = render_query(&query.without_page())?;
        let sql = format!(
            "SELECT COUNT(*) AS count FROM {}{tail}",
            Self::quote_identifier(collection)
        );
        let mut q = sqlx::query(&sql);
        for p in &params {
            q = q.bind(p);
        }
        let row = q.fetch_one(&pool).await?;
        let count: i64 = row.try_get("count")?;
        Ok(count)
    }

    async fn begin(&self, namespace: &str) -> Result<Box<dyn StoreSession>, StoreError> {
        let pool = self.pool(namespace).await?;
        let tx = pool.begin().await?;
        Ok(Box::new(PgSession { tx }))
    }
}

struct PgSession {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl StoreSession for PgSession {
    async fn insert(&mut self, collection: &str, doc: Value) -> Result<Value, StoreError> {
        let (id, doc) = stamp_new(doc)?;
        let sql = format!(
            "INSERT INTO {} (id, doc) VALUES ($1, $2)",
            PgStore::quote_identifier(collection)
        );
        sqlx::query(&sql)
            .bind(id)
            .bind(&doc)
            .execute(&mut *self.tx)
            .await?;
        Ok(doc)
    }

    async fn update(
        &mut self,
        collection: &str,
        id: Uuid,
        patch: Value,
    ) -> Result<(), StoreError> {
        let patch = stamp_patch(patch)?;
        let sql = format!(
            "UPDATE {} SET doc = doc || $2 WHERE id = $1",
            PgStore::quote_identifier(collection)
        );
        let result = sqlx::query(&sql)
            .bind(id)
            .bind(&patch)
            .execute(&mut *self.tx)
            .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::WriteFailed {
                collection: collection.to_string(),
                message: format!("update target {id} not found"),
            });
        }
        Ok(())
    }

    async fn commit(self: Box<Self>) -> Result<(), StoreError> {
        self.tx.commit().await.map_err(StoreError::from)
    }

    async fn rollback(self: Box<Self>) -> Result<(), StoreError> {
        self.tx.rollback().await.map_err(StoreError::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn validates_db_names() {
        assert!(PgStore::is_valid_db_name("eduvia_main"));
        assert!(PgStore::is_valid_db_name("school_gamersclub"));
        assert!(PgStore::is_valid_db_name("school_math_academy"));
        assert!(!PgStore::is_valid_db_name("school_"));
        assert!(!PgStore::is_valid_db_name("gamersclub"));
        assert!(!PgStore::is_valid_db_name("school_Gamers"));
        assert!(!PgStore::is_valid_db_name("school_x; DROP DATABASE"));
    }

    #[test]
    fn renders_filters_search_and_pagination() {
        let query = Query::new()
            .eq("isDeleted", false)
            .search(&["courseName", "description"], "alg")
            .sort("createdAt", SortDirection::Desc)
            .skip(20)
            .limit(10);
        let (tail, params) = render_query(&query).expect("render");

        assert!(tail.contains("doc->>'isDeleted' = $1"));
        assert!(tail.contains("doc->>'courseName' ILIKE $2"));
        assert!(tail.contains("ORDER BY doc->'createdAt' DESC NULLS LAST"));
        assert!(tail.ends_with("LIMIT 10 OFFSET 20"));
        assert_eq!(params, vec!["false".to_string(), "%alg%".to_string()]);
    }

    #[test]
    fn sort_orders_by_jsonb_value_not_text() {
        // Text ordering would put "500" after "4000"; the JSONB projection
        // compares numbers numerically.
        let (tail, _) = render_query(&Query::new().sort("fee", SortDirection::Asc)).expect("render");
        assert!(tail.contains("ORDER BY doc->'fee' ASC NULLS FIRST"));
        assert!(!tail.contains("doc->>'fee'"));
    }

    #[test]
    fn render_rejects_bad_sort_field() {
        let query = Query::new().sort("createdAt'; --", SortDirection::Asc);
        assert!(render_query(&query).is_err());
    }

    #[test]
    fn eq_null_renders_is_null() {
        let (tail, params) = render_query(&Query::new().eq("subDomain", json!(null))).expect("render");
        assert!(tail.contains("(doc->>'subDomain') IS NULL"));
        assert!(params.is_empty());
    }
}
