pub mod document_service;
pub mod rate_limiter_service;

pub use document_service::DocumentService;
pub use rate_limiter_service::RateLimiter;
