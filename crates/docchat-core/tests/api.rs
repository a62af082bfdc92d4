use std::io::Write;

use docchat_core::{ApiError, BackendClient, QueryRequest, StreamEvent, UploadRequest};
use serde_json::json;
use wiremock::matchers::{body_json, body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client(server: &MockServer) -> BackendClient {
    BackendClient::new(&server.uri()).unwrap()
}

#[tokio::test]
async fn test_list_documents() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/documents/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "documents": [
                {"id": "d1", "filename": "handbook.pdf", "upload_date": "2024-05-01T10:00:00.5",
                 "chunk_count": 17, "status": "processed"}
            ],
            "total_count": 1
        })))
        .expect(1)
        .mount(&server)
        .await;

    let list = client(&server).list_documents().await.unwrap();
    assert_eq!(list.total_count, Some(1));
    assert_eq!(list.documents[0].filename, "handbook.pdf");
    assert_eq!(list.documents[0].chunk_count, 17);
}

#[tokio::test]
async fn test_upload_sends_multipart_file_and_password() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/upload-pdf/"))
        .and(body_string_contains("name=\"file\"; filename=\"report.pdf\""))
        .and(body_string_contains("name=\"password\""))
        .and(body_string_contains("hunter2"))
        .and(body_string_contains("%PDF-1.4"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "message": "PDF processed successfully",
            "document_id": "new-doc"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let file_path = dir.path().join("report.pdf");
    let mut file = std::fs::File::create(&file_path).unwrap();
    file.write_all(b"%PDF-1.4 fake body").unwrap();

    let receipt = client(&server)
        .upload_pdf(&UploadRequest { path: file_path, password: Some("hunter2".into()) })
        .await
        .unwrap();
    assert_eq!(receipt.document_id.as_deref(), Some("new-doc"));
}

#[tokio::test]
async fn test_upload_error_detail_is_surfaced() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/upload-pdf/"))
        .respond_with(
            ResponseTemplate::new(400).set_body_json(json!({"detail": "Only PDF files are allowed"})),
        )
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let file_path = dir.path().join("notes.pdf");
    std::fs::write(&file_path, b"not really").unwrap();

    let err = client(&server)
        .upload_pdf(&UploadRequest { path: file_path, password: None })
        .await
        .unwrap_err();
    assert_eq!(err.status(), Some(400));
    assert_eq!(err.user_message("fallback"), "Only PDF files are allowed");
}

#[tokio::test]
async fn test_upload_missing_file_is_io_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let err = client(&server)
        .upload_pdf(&UploadRequest { path: "/definitely/not/here.pdf".into(), password: None })
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::Io(_)));
}

#[tokio::test]
async fn test_query_carries_conversation_id() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/query/"))
        .and(body_json(json!({"question": "Summarise it", "conversation_id": "conv-7"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "response": "It is about **rust**.",
            "conversation_id": "conv-7",
            "context_used": 812
        })))
        .expect(1)
        .mount(&server)
        .await;

    let response = client(&server)
        .query(&QueryRequest {
            question: "Summarise it".into(),
            conversation_id: Some("conv-7".into()),
        })
        .await
        .unwrap();
    assert_eq!(response.response, "It is about **rust**.");
    assert_eq!(response.context_used, Some(812));
}

#[tokio::test]
async fn test_query_fresh_conversation_sends_null() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/query/"))
        .and(body_json(json!({"question": "hi", "conversation_id": null})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "response": "hello",
            "conversation_id": "fresh"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let response = client(&server)
        .query(&QueryRequest { question: "hi".into(), conversation_id: None })
        .await
        .unwrap();
    assert_eq!(response.conversation_id.as_deref(), Some("fresh"));
}

#[tokio::test]
async fn test_document_info_and_delete() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/documents/d1/info"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "d1",
            "filename": "handbook.pdf",
            "upload_date": "2024-05-01T10:00:00",
            "chunk_count": 17,
            "vector_store_info": {"chunks": 17}
        })))
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/documents/d1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"message": "Document deleted successfully"})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/documents/gone"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({"detail": "Document not found"})))
        .mount(&server)
        .await;

    let backend = client(&server);
    let info = backend.document_info("d1").await.unwrap();
    assert_eq!(info.vector_store_info, Some(json!({"chunks": 17})));

    backend.delete_document("d1").await.unwrap();
    let err = backend.delete_document("gone").await.unwrap_err();
    assert_eq!(err.user_message("Failed to delete document"), "Document not found");
}

#[tokio::test]
async fn test_query_stream_assembles_response() {
    let server = MockServer::start().await;
    let body = concat!(
        "data: {\"type\": \"conversation_id\", \"conversation_id\": \"s-1\"}\n\n",
        "data: {\"type\": \"typing\", \"status\": \"start\"}\n\n",
        "data: {\"type\": \"content\", \"chunk\": \"Hello \"}\n\n",
        "data: {\"type\": \"content\", \"chunk\": \"there\"}\n\n",
        "data: {\"type\": \"typing\", \"status\": \"end\"}\n\n",
        "data: {\"type\": \"complete\", \"response\": \"Hello there\"}\n\n",
    );
    Mock::given(method("POST"))
        .and(path("/query-stream/"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(body, "text/event-stream"))
        .mount(&server)
        .await;

    let mut seen = Vec::new();
    let response = client(&server)
        .query_stream(&QueryRequest { question: "hi".into(), conversation_id: None }, |event| {
            seen.push(event.clone())
        })
        .await
        .unwrap();

    assert_eq!(response.response, "Hello there");
    assert_eq!(response.conversation_id.as_deref(), Some("s-1"));
    assert_eq!(seen.len(), 6);
    assert_eq!(seen[2], StreamEvent::Content { chunk: "Hello ".into() });
}

#[tokio::test]
async fn test_conversation_history_and_health() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/conversations/c-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "conversation_id": "c-1",
            "messages": [
                {"message": "q", "is_user": true, "timestamp": "2024-05-01T10:00:00"},
                {"message": "a", "is_user": false, "timestamp": "2024-05-01T10:00:01"}
            ]
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/health"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "healthy",
            "timestamp": "2024-05-01T10:00:00"
        })))
        .mount(&server)
        .await;

    let backend = client(&server);
    let history = backend.conversation("c-1").await.unwrap();
    assert_eq!(history.messages.len(), 2);
    assert!(history.messages[0].is_user);

    let health = backend.health().await.unwrap();
    assert_eq!(health.status, "healthy");
}

#[tokio::test]
async fn test_unreachable_backend_is_transport_error() {
    // Nothing listens on port 9 on a test machine
    let backend = BackendClient::new("http://127.0.0.1:9").unwrap();
    let err = backend.list_documents().await.unwrap_err();
    assert!(matches!(err, ApiError::Transport(_)));
}
