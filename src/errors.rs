use thiserror::Error;

// ============================================================================
// ERROR TYPES
// ============================================================================

/// Errors surfaced by the tenant gate.
///
/// `RateLimited` is an expected, retryable outcome for the caller, not an
/// internal failure. `Backend` wraps whatever the store collaborator
/// returned, unchanged.
#[derive(Debug, Error)]
pub enum GateError {
    #[error("Invalid tenant identifier: empty or whitespace-only")]
    InvalidTenant,

    #[error("No tenant bound to the current unit of work")]
    NoTenantBound,

    #[error("Rate limit exceeded for tenant: {tenant}")]
    RateLimited { tenant: String },

    #[error("Backend error: {0}")]
    Backend(#[from] anyhow::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rate_limited_message_names_tenant() {
        let err = GateError::RateLimited {
            tenant: "acme".to_string(),
        };
        assert_eq!(err.to_string(), "Rate limit exceeded for tenant: acme");
    }

    #[test]
    fn test_backend_error_wraps_source() {
        let err: GateError = anyhow::anyhow!("connection refused").into();
        assert!(matches!(err, GateError::Backend(_)));
        assert!(err.to_string().contains("connection refused"));
    }
}
