use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A stored document, always owned by exactly one tenant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id: i64,
    pub tenant_id: String,
    pub title: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

/// Payload for creating a document. The store assigns id and timestamp.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewDocument {
    pub title: String,
    pub content: String,
}

/// One page of search results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchPage {
    pub items: Vec<Document>,
    pub page: u32,
    pub size: u32,
    pub total: u64,
}
