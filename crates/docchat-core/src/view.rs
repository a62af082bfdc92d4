//! Declarative modal state. The front end draws whatever is on the stack;
//! nothing here knows about a rendering surface.

use crate::models::DocumentInfo;
use crate::registry::PendingDelete;

#[derive(Debug, Clone, PartialEq)]
pub enum Modal {
    Upload,
    Documents,
    SystemInfo,
    DocumentDetail(DocumentInfo),
    ConfirmDelete(PendingDelete),
}

impl Modal {
    pub fn kind(&self) -> ModalKind {
        match self {
            Modal::Upload => ModalKind::Upload,
            Modal::Documents => ModalKind::Documents,
            Modal::SystemInfo => ModalKind::SystemInfo,
            Modal::DocumentDetail(_) => ModalKind::DocumentDetail,
            Modal::ConfirmDelete(_) => ModalKind::ConfirmDelete,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModalKind {
    Upload,
    Documents,
    SystemInfo,
    DocumentDetail,
    ConfirmDelete,
}

/// Open panels, topmost last. Detail and confirmation panels sit on top of
/// the document list and are discarded when closed.
#[derive(Debug, Default)]
pub struct ModalStack {
    stack: Vec<Modal>,
}

impl ModalStack {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a panel. The singleton panels (upload, documents, system info)
    /// are moved to the top rather than opened twice.
    pub fn open(&mut self, modal: Modal) {
        let kind = modal.kind();
        if matches!(kind, ModalKind::Upload | ModalKind::Documents | ModalKind::SystemInfo) {
            self.stack.retain(|m| m.kind() != kind);
        }
        self.stack.push(modal);
    }

    pub fn top(&self) -> Option<&Modal> {
        self.stack.last()
    }

    pub fn top_kind(&self) -> Option<ModalKind> {
        self.top().map(Modal::kind)
    }

    pub fn close_top(&mut self) -> Option<Modal> {
        self.stack.pop()
    }

    /// Close every panel of `kind`.
    pub fn close(&mut self, kind: ModalKind) {
        self.stack.retain(|m| m.kind() != kind);
    }

    pub fn is_open(&self, kind: ModalKind) -> bool {
        self.stack.iter().any(|m| m.kind() == kind)
    }

    pub fn is_empty(&self) -> bool {
        self.stack.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Modal> {
        self.stack.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn info(id: &str) -> DocumentInfo {
        DocumentInfo {
            id: id.into(),
            filename: format!("{id}.pdf"),
            upload_date: "2024-05-01T10:00:00".into(),
            chunk_count: 3,
            vector_store_info: None,
        }
    }

    #[test]
    fn test_detail_stacks_on_documents() {
        let mut modals = ModalStack::new();
        modals.open(Modal::Documents);
        modals.open(Modal::DocumentDetail(info("a")));
        assert_eq!(modals.top_kind(), Some(ModalKind::DocumentDetail));

        modals.close_top();
        assert_eq!(modals.top_kind(), Some(ModalKind::Documents));
        modals.close_top();
        assert!(modals.is_empty());
    }

    #[test]
    fn test_singletons_move_to_top() {
        let mut modals = ModalStack::new();
        modals.open(Modal::Upload);
        modals.open(Modal::Documents);
        modals.open(Modal::Upload);
        assert_eq!(modals.iter().count(), 2);
        assert_eq!(modals.top_kind(), Some(ModalKind::Upload));

        modals.close(ModalKind::Upload);
        assert!(!modals.is_open(ModalKind::Upload));
        assert!(modals.is_open(ModalKind::Documents));
    }
}
