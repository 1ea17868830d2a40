//! Backend store collaborator seam.
//!
//! The gate treats persistence as opaque: every call either returns
//! tenant-scoped data or an opaque failure that is propagated unchanged.

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;

use crate::context::TenantId;
use crate::models::{Document, NewDocument, SearchPage};

#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Full-text search over the tenant's documents, paged.
    async fn search(
        &self,
        tenant: &TenantId,
        query: &str,
        page: u32,
        size: u32,
    ) -> Result<SearchPage>;

    /// Fetch one document by id, scoped to the tenant.
    async fn find_by_id(&self, tenant: &TenantId, id: i64) -> Result<Option<Document>>;

    /// Persist a new document for the tenant.
    async fn insert(&self, tenant: &TenantId, draft: NewDocument) -> Result<Document>;

    /// Delete the tenant's document by id. Returns whether a record existed.
    async fn delete(&self, tenant: &TenantId, id: i64) -> Result<bool>;
}

// Shared store handles work wherever an owned store does.
#[async_trait]
impl<T> DocumentStore for Arc<T>
where
    T: DocumentStore + ?Sized,
{
    async fn search(
        &self,
        tenant: &TenantId,
        query: &str,
        page: u32,
        size: u32,
    ) -> Result<SearchPage> {
        (**self).search(tenant, query, page, size).await
    }

    async fn find_by_id(&self, tenant: &TenantId, id: i64) -> Result<Option<Document>> {
        (**self).find_by_id(tenant, id).await
    }

    async fn insert(&self, tenant: &TenantId, draft: NewDocument) -> Result<Document> {
        (**self).insert(tenant, draft).await
    }

    async fn delete(&self, tenant: &TenantId, id: i64) -> Result<bool> {
        (**self).delete(tenant, id).await
    }
}
