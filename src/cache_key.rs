//! Cache key construction for tenant-scoped search results.
//!
//! Every key carries its tenant component, so the cache can be partitioned
//! and invalidated per tenant without inspecting values.

use std::fmt;

use crate::context::TenantId;

/// Composite key for one page of cached search results.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SearchKey {
    pub tenant: TenantId,
    pub query: String,
    pub page: u32,
    pub size: u32,
}

impl SearchKey {
    pub fn new(tenant: &TenantId, query: &str, page: u32, size: u32) -> Self {
        Self {
            tenant: tenant.clone(),
            query: query.to_string(),
            page,
            size,
        }
    }
}

impl fmt::Display for SearchKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}:{}:{}",
            self.tenant, self.query, self.page, self.size
        )
    }
}
