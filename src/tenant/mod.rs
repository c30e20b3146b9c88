//! Tenant identity: slug derivation from subdomain values and the
//! process-wide slug -> namespace handle cache.

use std::collections::HashMap;
use std::sync::Arc;

use thiserror::Error;
use tokio::sync::RwLock;
use tracing::info;

use crate::store::{DocumentStore, StoreError, CENTRAL_NAMESPACE};

#[derive(Debug, Error)]
pub enum TenantError {
    #[error("Invalid tenant identifier: {0}")]
    InvalidSlug(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Resolved context for one tenant's collections.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamespaceHandle {
    pub slug: String,
    pub database: String,
}

/// Derives the tenant slug from a subdomain value. The value may be a bare
/// label (`gamersclub`), a full URL (`https://gamersclub.eduvia.space`), or a
/// dev URL with a port (`http://gamersclub.localhost:5173`); in every case the
/// slug is the first dot-delimited label of the host.
pub fn derive_slug(input: &str) -> Result<String, TenantError> {
    let input = input.trim();
    if input.is_empty() {
        return Err(TenantError::InvalidSlug("empty tenant identifier".to_string()));
    }

    let host = if input.contains("://") {
        url::Url::parse(input)
            .ok()
            .and_then(|u| u.host_str().map(str::to_string))
            .ok_or_else(|| TenantError::InvalidSlug(input.to_string()))?
    } else {
        // No scheme: treat the input as already being the host
        input.to_string()
    };

    let label = host.split('.').next().unwrap_or_default();
    normalize_slug(label)
}

/// Lower-cases, collapses whitespace runs to underscores, and validates the
/// result as a safe namespace key. Slugs also come from free-text school
/// names, so this is the only path onto a database identifier.
pub fn normalize_slug(label: &str) -> Result<String, TenantError> {
    let slug = label
        .trim()
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("_");

    let safe = !slug.is_empty()
        && slug
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_' || c == '-');
    if !safe {
        return Err(TenantError::InvalidSlug(label.to_string()));
    }
    Ok(slug)
}

/// Maps a slug to the physical database name. Hyphens are legal in host
/// labels but not in our database identifiers.
fn database_for(slug: &str) -> String {
    format!("school_{}", slug.replace('-', "_"))
}

/// Process-wide slug -> handle cache. Populated lazily, never evicted;
/// entries live for the process lifetime. Concurrent first-resolution of the
/// same slug may register the namespace more than once, which is safe because
/// registration is idempotent, and the cache slot converges to one handle.
pub struct TenantResolver<S: DocumentStore> {
    store: Arc<S>,
    handles: RwLock<HashMap<String, NamespaceHandle>>,
}

impl<S: DocumentStore> TenantResolver<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self {
            store,
            handles: RwLock::new(HashMap::new()),
        }
    }

    /// Resolve a tenant identifier (slug, subdomain, or subdomain URL) to its
    /// namespace handle, creating and registering the namespace on first use.
    pub async fn resolve(&self, tenant: &str) -> Result<NamespaceHandle, TenantError> {
        let (handle, _) = self.resolve_with_status(tenant).await?;
        Ok(handle)
    }

    /// Like [`resolve`](Self::resolve), additionally reporting whether this
    /// process had already resolved the slug.
    pub async fn resolve_with_status(
        &self,
        tenant: &str,
    ) -> Result<(NamespaceHandle, bool), TenantError> {
        let slug = derive_slug(tenant)?;

        {
            let handles = self.handles.read().await;
            if let Some(handle) = handles.get(&slug) {
                return Ok((handle.clone(), true));
            }
        }

        let handle = NamespaceHandle {
            database: database_for(&slug),
            slug: slug.clone(),
        };
        self.store.register_namespace(&handle.database).await?;

        let mut handles = self.handles.write().await;
        let entry = handles.entry(slug).or_insert_with(|| {
            info!("Registered tenant namespace: {}", handle.database);
            handle.clone()
        });
        Ok((entry.clone(), false))
    }

    /// Register the central namespace. Called once at startup (and by test
    /// setups); idempotent like every registration.
    pub async fn ensure_central(&self) -> Result<(), TenantError> {
        self.store.register_namespace(CENTRAL_NAMESPACE).await?;
        Ok(())
    }
}
