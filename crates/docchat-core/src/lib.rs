pub mod api;
pub mod chat;
pub mod config;
pub mod error;
pub mod models;
pub mod notify;
pub mod registry;
pub mod session;
pub mod sse;
pub mod state;
pub mod text;
pub mod upload;
pub mod view;

// Re-export main types for convenience
pub use api::{BackendClient, UploadRequest, DEFAULT_BACKEND_URL};
pub use chat::{ChatFlow, OutgoingQuery, Outcome, SendRejected};
pub use config::Config;
pub use error::ApiError;
pub use models::{
    ConversationHistory, DocumentInfo, DocumentList, DocumentRecord, HealthStatus, QueryRequest,
    QueryResponse, StreamEvent, UploadReceipt,
};
pub use notify::{Toast, ToastKind, ToastPhase, ToastTiming, Toasts};
pub use registry::{DocumentRegistry, DocumentRow, PendingDelete, RegistrySummary};
pub use session::{Session, Ticket};
pub use state::{ChatMessage, ChatRole};
pub use upload::{UploadFlow, UploadRejected, UploadStage};
pub use view::{Modal, ModalKind, ModalStack};
