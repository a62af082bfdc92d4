//! Wire types for the document backend's JSON contract.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A document as listed by `GET /documents/`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentRecord {
    pub id: String,
    pub filename: String,
    pub upload_date: String,
    pub chunk_count: u64,
    #[serde(default)]
    pub status: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DocumentList {
    pub documents: Vec<DocumentRecord>,
    #[serde(default)]
    pub total_count: Option<usize>,
}

/// Detail view returned by `GET /documents/{id}/info`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentInfo {
    pub id: String,
    pub filename: String,
    pub upload_date: String,
    pub chunk_count: u64,
    #[serde(default)]
    pub vector_store_info: Option<Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UploadReceipt {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub document_id: Option<String>,
}

/// Body of `POST /query/` and `POST /query-stream/`.
///
/// `conversation_id` is serialized as `null` for a fresh conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QueryRequest {
    pub question: String,
    pub conversation_id: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QueryResponse {
    pub response: String,
    #[serde(default)]
    pub conversation_id: Option<String>,
    #[serde(default)]
    pub context_used: Option<u64>,
}

/// One `data:` payload from `/query-stream/`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StreamEvent {
    ConversationId { conversation_id: String },
    Typing { status: String },
    Content { chunk: String },
    Complete { response: String },
}

#[derive(Debug, Clone, Deserialize)]
pub struct HistoryMessage {
    pub message: String,
    pub is_user: bool,
    #[serde(default)]
    pub timestamp: Option<String>,
}

/// Stored conversation from `GET /conversations/{id}`.
#[derive(Debug, Clone, Deserialize)]
pub struct ConversationHistory {
    pub conversation_id: String,
    #[serde(default)]
    pub messages: Vec<HistoryMessage>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HealthStatus {
    pub status: String,
    #[serde(default)]
    pub timestamp: Option<String>,
}
