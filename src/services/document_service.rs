//! Document operations behind the tenant gate.
//!
//! Every operation validates the raw tenant token, binds it for the span of
//! the unit of work, checks admission, and only then touches the cache and
//! the backend store. Reads go through the search cache; committed writes
//! invalidate the writing tenant's cached pages before returning, so a read
//! that starts after a write completes can never observe the stale pages.

use std::sync::Arc;

use tracing::info;

use crate::cache::SearchCache;
use crate::cache_key::SearchKey;
use crate::config::GateConfig;
use crate::context::{self, TenantId};
use crate::errors::GateError;
use crate::models::{Document, NewDocument, SearchPage};
use crate::services::rate_limiter_service::RateLimiter;
use crate::store::DocumentStore;

pub struct DocumentService<S> {
    store: S,
    rate_limiter: Arc<RateLimiter>,
    search_cache: SearchCache,
}

impl<S: DocumentStore> DocumentService<S> {
    pub fn new(store: S, config: GateConfig) -> Self {
        info!("Initializing document service");
        Self {
            rate_limiter: Arc::new(RateLimiter::new(
                config.max_requests_per_window,
                config.window_length,
            )),
            search_cache: SearchCache::new(config.cache_ttl, config.cache_capacity),
            store,
        }
    }

    pub fn rate_limiter(&self) -> &RateLimiter {
        &self.rate_limiter
    }

    pub fn search_cache(&self) -> &SearchCache {
        &self.search_cache
    }

    /// Searches the tenant's documents with paging and caching.
    pub async fn search_documents(
        &self,
        tenant: &str,
        query: &str,
        page: u32,
        size: u32,
    ) -> Result<SearchPage, GateError> {
        let tenant = TenantId::new(tenant)?;
        context::scope(tenant, self.search_inner(query, page, size)).await
    }

    async fn search_inner(
        &self,
        query: &str,
        page: u32,
        size: u32,
    ) -> Result<SearchPage, GateError> {
        let tenant = context::current()?;
        self.check_rate_limit(&tenant)?;

        let key = SearchKey::new(&tenant, query, page, size);
        if let Some(cached) = self.search_cache.get(&key) {
            return Ok(cached);
        }

        // fetch outside any cache lock; a failed fetch populates nothing
        let fetched = self.store.search(&tenant, query, page, size).await?;
        self.search_cache.put(key, fetched.clone());
        Ok(fetched)
    }

    /// Retrieves one document by id for the tenant. By-id reads are not
    /// cached; only search pages are.
    pub async fn get_document(
        &self,
        tenant: &str,
        id: i64,
    ) -> Result<Option<Document>, GateError> {
        let tenant = TenantId::new(tenant)?;
        context::scope(tenant, self.get_inner(id)).await
    }

    async fn get_inner(&self, id: i64) -> Result<Option<Document>, GateError> {
        let tenant = context::current()?;
        self.check_rate_limit(&tenant)?;
        Ok(self.store.find_by_id(&tenant, id).await?)
    }

    /// Creates a document for the tenant and invalidates the tenant's
    /// cached search pages once the write has committed.
    pub async fn create_document(
        &self,
        tenant: &str,
        draft: NewDocument,
    ) -> Result<Document, GateError> {
        let tenant = TenantId::new(tenant)?;
        context::scope(tenant, self.create_inner(draft)).await
    }

    async fn create_inner(&self, draft: NewDocument) -> Result<Document, GateError> {
        let tenant = context::current()?;
        self.check_rate_limit(&tenant)?;

        // a failed write leaves the store unchanged, so the cache stays
        let stored = self.store.insert(&tenant, draft).await?;
        self.search_cache.invalidate_tenant(&tenant);
        Ok(stored)
    }

    /// Deletes the tenant's document by id. Invalidates on any committed
    /// outcome, including a no-op delete.
    pub async fn delete_document(&self, tenant: &str, id: i64) -> Result<bool, GateError> {
        let tenant = TenantId::new(tenant)?;
        context::scope(tenant, self.delete_inner(id)).await
    }

    async fn delete_inner(&self, id: i64) -> Result<bool, GateError> {
        let tenant = context::current()?;
        self.check_rate_limit(&tenant)?;

        let deleted = self.store.delete(&tenant, id).await?;
        self.search_cache.invalidate_tenant(&tenant);
        Ok(deleted)
    }

    fn check_rate_limit(&self, tenant: &TenantId) -> Result<(), GateError> {
        if self.rate_limiter.allow(tenant) {
            Ok(())
        } else {
            Err(GateError::RateLimited {
                tenant: tenant.as_str().to_string(),
            })
        }
    }
}
