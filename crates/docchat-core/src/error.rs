use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

/// Failure talking to the document backend.
///
/// Transport problems (connection refused, bad JSON) and application
/// problems (non-2xx with a `{detail}` body) are kept apart so callers can
/// pick the right wording for the user.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("network error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("backend returned {status}{}", .detail.as_deref().map(|d| format!(": {d}")).unwrap_or_default())]
    Status { status: u16, detail: Option<String> },

    #[error("could not read file: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid backend URL: {0}")]
    InvalidBaseUrl(String),

    #[error("malformed stream event: {0}")]
    Stream(String),
}

impl ApiError {
    /// Text to show the user. Server-provided detail wins; a status error
    /// without detail falls back to `fallback`.
    pub fn user_message(&self, fallback: &str) -> String {
        match self {
            ApiError::Status { detail: Some(detail), .. } => detail.clone(),
            ApiError::Status { detail: None, .. } => fallback.to_string(),
            other => other.to_string(),
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

#[derive(Deserialize)]
struct ErrorBody {
    detail: Option<Value>,
}

/// Pull the `detail` field out of an error body.
///
/// FastAPI sends either a plain string or a list of validation errors with
/// `msg` fields; anything else is rendered as compact JSON.
pub fn extract_detail(body: &str) -> Option<String> {
    let parsed: ErrorBody = serde_json::from_str(body).ok()?;
    match parsed.detail? {
        Value::String(s) if !s.trim().is_empty() => Some(s),
        Value::String(_) | Value::Null => None,
        Value::Array(items) => {
            let msgs: Vec<String> = items
                .iter()
                .filter_map(|item| item.get("msg").and_then(Value::as_str).map(str::to_string))
                .collect();
            if msgs.is_empty() {
                None
            } else {
                Some(msgs.join("; "))
            }
        }
        other => Some(other.to_string()),
    }
}
