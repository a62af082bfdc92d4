//! Background requests.
//!
//! Every backend call runs on its own tokio task and reports back through the
//! app event channel; the UI loop is the only owner of `App`.

use tokio::sync::mpsc::UnboundedSender;
use tracing::error;

use docchat_core::{
    ApiError, BackendClient, ConversationHistory, DocumentInfo, DocumentList, HealthStatus,
    OutgoingQuery, QueryResponse, StreamEvent, Ticket, UploadReceipt, UploadRequest, UploadStage,
};

use crate::tui::AppEvent;

#[derive(Debug)]
pub enum BackendEvent {
    Documents(Result<DocumentList, ApiError>),
    DocumentInfo(Result<DocumentInfo, ApiError>),
    Deleted { filename: String, result: Result<(), ApiError> },
    UploadProgress(UploadStage),
    UploadFinished(Result<UploadReceipt, ApiError>),
    CloseUploadPanel,
    QueryEvent { ticket: Ticket, event: StreamEvent },
    QueryFinished { ticket: Ticket, result: Result<QueryResponse, ApiError> },
    History(Result<ConversationHistory, ApiError>),
    Health(Result<HealthStatus, ApiError>),
}

fn send(tx: &UnboundedSender<AppEvent>, event: BackendEvent) {
    // The receiver only goes away when the app is shutting down
    let _ = tx.send(AppEvent::Backend(event));
}

pub fn refresh_documents(client: &BackendClient, tx: &UnboundedSender<AppEvent>) {
    let client = client.clone();
    let tx = tx.clone();
    tokio::spawn(async move {
        let result = client.list_documents().await;
        if let Err(e) = &result {
            error!(error = %e, "failed to fetch documents");
        }
        send(&tx, BackendEvent::Documents(result));
    });
}

pub fn document_info(client: &BackendClient, tx: &UnboundedSender<AppEvent>, id: String) {
    let client = client.clone();
    let tx = tx.clone();
    tokio::spawn(async move {
        let result = client.document_info(&id).await;
        if let Err(e) = &result {
            error!(document = %id, error = %e, "failed to fetch document info");
        }
        send(&tx, BackendEvent::DocumentInfo(result));
    });
}

pub fn delete_document(
    client: &BackendClient,
    tx: &UnboundedSender<AppEvent>,
    id: String,
    filename: String,
) {
    let client = client.clone();
    let tx = tx.clone();
    tokio::spawn(async move {
        let result = client.delete_document(&id).await;
        if let Err(e) = &result {
            error!(document = %id, error = %e, "failed to delete document");
        }
        send(&tx, BackendEvent::Deleted { filename, result });
    });
}

pub fn upload(client: &BackendClient, tx: &UnboundedSender<AppEvent>, request: UploadRequest) {
    let client = client.clone();
    let tx = tx.clone();
    tokio::spawn(async move {
        send(&tx, BackendEvent::UploadProgress(UploadStage::Reading));
        let result = match tokio::fs::metadata(&request.path).await {
            Ok(_) => {
                send(&tx, BackendEvent::UploadProgress(UploadStage::Processing));
                client.upload_pdf(&request).await
            }
            Err(e) => Err(ApiError::Io(e)),
        };
        if let Err(e) = &result {
            error!(file = %request.path.display(), error = %e, "upload failed");
        }
        send(&tx, BackendEvent::UploadFinished(result));
    });
}

pub fn close_upload_panel_later(tx: &UnboundedSender<AppEvent>) {
    let tx = tx.clone();
    tokio::spawn(async move {
        tokio::time::sleep(docchat_core::upload::UPLOAD_CLOSE_DELAY).await;
        send(&tx, BackendEvent::CloseUploadPanel);
    });
}

pub fn query(
    client: &BackendClient,
    tx: &UnboundedSender<AppEvent>,
    outgoing: OutgoingQuery,
    stream: bool,
) {
    let client = client.clone();
    let tx = tx.clone();
    tokio::spawn(async move {
        let OutgoingQuery { ticket, request } = outgoing;
        let result = if stream {
            let events = tx.clone();
            client
                .query_stream(&request, move |event| {
                    send(&events, BackendEvent::QueryEvent { ticket, event: event.clone() });
                })
                .await
        } else {
            client.query(&request).await
        };
        if let Err(e) = &result {
            error!(error = %e, "query failed");
        }
        send(&tx, BackendEvent::QueryFinished { ticket, result });
    });
}

pub fn conversation(client: &BackendClient, tx: &UnboundedSender<AppEvent>, id: String) {
    let client = client.clone();
    let tx = tx.clone();
    tokio::spawn(async move {
        let result = client.conversation(&id).await;
        if let Err(e) = &result {
            error!(conversation = %id, error = %e, "failed to load conversation");
        }
        send(&tx, BackendEvent::History(result));
    });
}

pub fn health(client: &BackendClient, tx: &UnboundedSender<AppEvent>) {
    let client = client.clone();
    let tx = tx.clone();
    tokio::spawn(async move {
        send(&tx, BackendEvent::Health(client.health().await));
    });
}
