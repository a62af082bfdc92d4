use std::path::PathBuf;

use futures_util::StreamExt;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Response, Url};
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::error::{extract_detail, ApiError};
use crate::models::{
    ConversationHistory, DocumentInfo, DocumentList, HealthStatus, QueryRequest, QueryResponse,
    StreamEvent, UploadReceipt,
};
use crate::sse::SseDecoder;

pub const DEFAULT_BACKEND_URL: &str = "http://localhost:8000";

/// A file queued for `POST /upload-pdf/`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadRequest {
    pub path: PathBuf,
    pub password: Option<String>,
}

impl UploadRequest {
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "document.pdf".to_string())
    }
}

/// HTTP client for the document backend.
#[derive(Clone, Debug)]
pub struct BackendClient {
    client: Client,
    base_url: Url,
}

impl BackendClient {
    pub fn new(base_url: &str) -> Result<Self, ApiError> {
        let base_url = Url::parse(base_url.trim_end_matches('/'))
            .map_err(|e| ApiError::InvalidBaseUrl(format!("{base_url}: {e}")))?;
        if base_url.cannot_be_a_base() {
            return Err(ApiError::InvalidBaseUrl(base_url.to_string()));
        }

        Ok(Self {
            client: Client::new(),
            base_url,
        })
    }

    pub fn base_url(&self) -> &str {
        self.base_url.as_str()
    }

    /// Build `base/segment/...`. An empty trailing segment yields a trailing slash,
    /// which the backend's collection routes require.
    fn endpoint(&self, segments: &[&str]) -> Result<Url, ApiError> {
        let mut url = self.base_url.clone();
        {
            let mut path = url
                .path_segments_mut()
                .map_err(|_| ApiError::InvalidBaseUrl(self.base_url.to_string()))?;
            path.pop_if_empty();
            path.extend(segments);
        }
        Ok(url)
    }

    pub async fn upload_pdf(&self, request: &UploadRequest) -> Result<UploadReceipt, ApiError> {
        let url = self.endpoint(&["upload-pdf", ""])?;
        let bytes = tokio::fs::read(&request.path).await?;

        let part = Part::bytes(bytes)
            .file_name(request.file_name())
            .mime_str("application/pdf")?;
        let mut form = Form::new().part("file", part);
        if let Some(password) = request.password.as_deref().filter(|p| !p.is_empty()) {
            form = form.text("password", password.to_string());
        }

        debug!(file = %request.path.display(), "uploading document");
        let response = self.client.post(url).multipart(form).send().await?;
        decode(response).await
    }

    pub async fn list_documents(&self) -> Result<DocumentList, ApiError> {
        let url = self.endpoint(&["documents", ""])?;
        debug!("fetching document list");
        let response = self.client.get(url).send().await?;
        decode(response).await
    }

    pub async fn document_info(&self, id: &str) -> Result<DocumentInfo, ApiError> {
        let url = self.endpoint(&["documents", id, "info"])?;
        debug!(document = id, "fetching document info");
        let response = self.client.get(url).send().await?;
        decode(response).await
    }

    pub async fn delete_document(&self, id: &str) -> Result<(), ApiError> {
        let url = self.endpoint(&["documents", id])?;
        debug!(document = id, "deleting document");
        let response = self.client.delete(url).send().await?;
        check(response).await?;
        Ok(())
    }

    pub async fn query(&self, request: &QueryRequest) -> Result<QueryResponse, ApiError> {
        let url = self.endpoint(&["query", ""])?;
        debug!(conversation = ?request.conversation_id, "sending query");
        let response = self.client.post(url).json(request).send().await?;
        decode(response).await
    }

    /// Stream a query through `/query-stream/`, handing each event to `on_event`
    /// as it arrives. The assembled response is returned once the stream ends.
    pub async fn query_stream<F>(
        &self,
        request: &QueryRequest,
        mut on_event: F,
    ) -> Result<QueryResponse, ApiError>
    where
        F: FnMut(&StreamEvent),
    {
        let url = self.endpoint(&["query-stream", ""])?;
        debug!(conversation = ?request.conversation_id, "sending streaming query");
        let response = check(self.client.post(url).json(request).send().await?).await?;

        let mut result = QueryResponse::default();
        let mut completed = false;
        let mut decoder = SseDecoder::new();
        let mut body = response.bytes_stream();

        let mut handle = |payload: String, result: &mut QueryResponse| -> Result<(), ApiError> {
            let event: StreamEvent = serde_json::from_str(&payload)
                .map_err(|e| ApiError::Stream(format!("{e}: {payload}")))?;
            match &event {
                StreamEvent::ConversationId { conversation_id } => {
                    result.conversation_id = Some(conversation_id.clone());
                }
                StreamEvent::Content { chunk } => {
                    if !completed {
                        result.response.push_str(chunk);
                    }
                }
                StreamEvent::Complete { response } => {
                    result.response = response.clone();
                    completed = true;
                }
                StreamEvent::Typing { .. } => {}
            }
            on_event(&event);
            Ok(())
        };

        while let Some(chunk) = body.next().await {
            for payload in decoder.push(&chunk?) {
                handle(payload, &mut result)?;
            }
        }
        if let Some(payload) = decoder.finish() {
            handle(payload, &mut result)?;
        }

        Ok(result)
    }

    pub async fn conversation(&self, id: &str) -> Result<ConversationHistory, ApiError> {
        let url = self.endpoint(&["conversations", id])?;
        debug!(conversation = id, "fetching conversation history");
        let response = self.client.get(url).send().await?;
        decode(response).await
    }

    pub async fn health(&self) -> Result<HealthStatus, ApiError> {
        let url = self.endpoint(&["health"])?;
        let response = self.client.get(url).send().await?;
        decode(response).await
    }
}

/// Turn a non-2xx response into `ApiError::Status`, reading `{detail}` if present.
async fn check(response: Response) -> Result<Response, ApiError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    Err(ApiError::Status {
        status: status.as_u16(),
        detail: extract_detail(&body),
    })
}

async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, ApiError> {
    Ok(check(response).await?.json::<T>().await?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_paths() {
        let client = BackendClient::new("http://localhost:8000/").unwrap();
        assert_eq!(
            client.endpoint(&["upload-pdf", ""]).unwrap().as_str(),
            "http://localhost:8000/upload-pdf/"
        );
        assert_eq!(
            client.endpoint(&["documents", "abc", "info"]).unwrap().as_str(),
            "http://localhost:8000/documents/abc/info"
        );
    }

    #[test]
    fn test_endpoint_under_prefix_and_escaping() {
        let client = BackendClient::new("http://example.com/rag").unwrap();
        assert_eq!(
            client.endpoint(&["documents", "a b/c"]).unwrap().as_str(),
            "http://example.com/rag/documents/a%20b%2Fc"
        );
    }

    #[test]
    fn test_invalid_base_url() {
        assert!(matches!(BackendClient::new("not a url"), Err(ApiError::InvalidBaseUrl(_))));
        assert!(matches!(BackendClient::new("mailto:me@example.com"), Err(ApiError::InvalidBaseUrl(_))));
    }
}
