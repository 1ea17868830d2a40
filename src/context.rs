//! Tenant identity and the per-unit-of-work tenant binding.
//!
//! The binding is a tokio task-local established by wrapping the unit of
//! work in [`scope`]. It is dropped when the scoped future finishes on any
//! path (return, error, cancellation, panic), so no caller ever has to
//! remember to clear it, and concurrent tasks never observe each other's
//! tenant.

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use tracing::warn;

use crate::errors::GateError;

/// Opaque tenant identifier. Non-empty by construction; no internal
/// structure is interpreted.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TenantId(Arc<str>);

impl TenantId {
    /// Validates and wraps a raw tenant token supplied by the request layer.
    pub fn new(raw: &str) -> Result<Self, GateError> {
        if raw.trim().is_empty() {
            return Err(GateError::InvalidTenant);
        }
        Ok(Self(Arc::from(raw)))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TenantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

tokio::task_local! {
    static ACTIVE_TENANT: TenantId;
}

/// Runs `fut` with `tenant` bound as the active tenant for the calling task.
///
/// The binding lives exactly as long as `fut` does.
pub async fn scope<F>(tenant: TenantId, fut: F) -> F::Output
where
    F: Future,
{
    if ACTIVE_TENANT.try_with(|_| ()).is_ok() {
        // Nested scopes shadow correctly, but a second establishment inside
        // one unit of work is almost always a composition bug upstream.
        warn!(tenant = %tenant, "tenant scope established while another binding is active");
    }
    ACTIVE_TENANT.scope(tenant, fut).await
}

/// Returns the tenant bound to the current task.
pub fn current() -> Result<TenantId, GateError> {
    ACTIVE_TENANT
        .try_with(|tenant| tenant.clone())
        .map_err(|_| GateError::NoTenantBound)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tenant_id_rejects_empty_and_whitespace() {
        assert!(matches!(TenantId::new(""), Err(GateError::InvalidTenant)));
        assert!(matches!(
            TenantId::new("   \t"),
            Err(GateError::InvalidTenant)
        ));
        assert!(TenantId::new("tenant-1").is_ok());
    }

    #[tokio::test]
    async fn test_current_inside_and_outside_scope() {
        assert!(matches!(current(), Err(GateError::NoTenantBound)));

        let tenant = TenantId::new("t1").unwrap();
        let seen = scope(tenant.clone(), async { current().unwrap() }).await;
        assert_eq!(seen, tenant);

        // Binding is gone once the scoped future completes
        assert!(matches!(current(), Err(GateError::NoTenantBound)));
    }

    #[tokio::test]
    async fn test_binding_cleared_on_error_path() {
        let tenant = TenantId::new("t1").unwrap();
        let result: Result<(), GateError> = scope(tenant, async {
            let _ = current()?;
            Err(GateError::RateLimited {
                tenant: "t1".to_string(),
            })
        })
        .await;
        assert!(result.is_err());
        assert!(matches!(current(), Err(GateError::NoTenantBound)));
    }

    #[tokio::test]
    async fn test_concurrent_tasks_see_only_their_own_tenant() {
        let a = tokio::spawn(scope(TenantId::new("tenant-a").unwrap(), async {
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
            current().unwrap().as_str().to_string()
        }));
        let b = tokio::spawn(scope(TenantId::new("tenant-b").unwrap(), async {
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
            current().unwrap().as_str().to_string()
        }));

        assert_eq!(a.await.unwrap(), "tenant-a");
        assert_eq!(b.await.unwrap(), "tenant-b");
    }
}
