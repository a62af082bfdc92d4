//! Local view of the backend's document list.
//!
//! The cache is only ever replaced by a fresh fetch; deletions go through the
//! server and are followed by a refresh.

use crate::models::{DocumentList, DocumentRecord};
use crate::text::{format_upload_date, sanitize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RegistrySummary {
    pub documents: usize,
    pub chunks: u64,
}

/// A delete waiting for the user to say yes or no.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingDelete {
    pub id: String,
    pub filename: String,
}

/// One row of the document list, ready to draw.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentRow {
    pub id: String,
    pub filename: String,
    pub uploaded: String,
    pub chunks: u64,
}

#[derive(Debug, Default)]
pub struct DocumentRegistry {
    documents: Vec<DocumentRecord>,
    total_count: usize,
    loaded: bool,
    pending_delete: Option<PendingDelete>,
}

impl DocumentRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the cache wholesale with a fetched list.
    pub fn apply(&mut self, list: DocumentList) {
        self.total_count = list.total_count.unwrap_or(list.documents.len());
        self.documents = list.documents;
        self.loaded = true;
    }

    pub fn documents(&self) -> &[DocumentRecord] {
        &self.documents
    }

    pub fn get(&self, id: &str) -> Option<&DocumentRecord> {
        self.documents.iter().find(|d| d.id == id)
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    pub fn summary(&self) -> RegistrySummary {
        RegistrySummary {
            documents: self.total_count,
            chunks: self.documents.iter().map(|d| d.chunk_count).sum(),
        }
    }

    pub fn rows(&self) -> Vec<DocumentRow> {
        self.documents
            .iter()
            .map(|d| DocumentRow {
                id: d.id.clone(),
                filename: sanitize(&d.filename),
                uploaded: format_upload_date(&d.upload_date),
                chunks: d.chunk_count,
            })
            .collect()
    }

    /// Ask for confirmation before deleting `id`. Unknown ids are ignored.
    pub fn request_delete(&mut self, id: &str) -> Option<&PendingDelete> {
        let doc = self.get(id)?;
        self.pending_delete = Some(PendingDelete {
            id: doc.id.clone(),
            filename: sanitize(&doc.filename),
        });
        self.pending_delete.as_ref()
    }

    pub fn pending_delete(&self) -> Option<&PendingDelete> {
        self.pending_delete.as_ref()
    }

    /// The user agreed: hand back the id to delete.
    pub fn confirm_delete(&mut self) -> Option<PendingDelete> {
        self.pending_delete.take()
    }

    pub fn cancel_delete(&mut self) {
        self.pending_delete = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: &str, name: &str, chunks: u64) -> DocumentRecord {
        DocumentRecord {
            id: id.into(),
            filename: name.into(),
            upload_date: "2024-05-01T10:00:00".into(),
            chunk_count: chunks,
            status: Some("processed".into()),
        }
    }

    #[test]
    fn test_summary_counts() {
        let mut registry = DocumentRegistry::new();
        assert!(!registry.is_loaded());
        assert_eq!(registry.summary(), RegistrySummary::default());

        registry.apply(DocumentList {
            documents: vec![record("a", "one.pdf", 10), record("b", "two.pdf", 32)],
            total_count: Some(2),
        });
        assert_eq!(registry.summary(), RegistrySummary { documents: 2, chunks: 42 });
        assert_eq!(registry.rows()[1].uploaded, "2024-05-01 10:00");
    }

    #[test]
    fn test_refresh_replaces_wholesale() {
        let mut registry = DocumentRegistry::new();
        registry.apply(DocumentList { documents: vec![record("a", "one.pdf", 1)], total_count: None });
        assert_eq!(registry.summary().documents, 1);

        registry.apply(DocumentList::default());
        assert!(registry.is_empty());
        assert!(registry.is_loaded());
        assert_eq!(registry.summary(), RegistrySummary::default());
    }

    #[test]
    fn test_delete_needs_confirmation() {
        let mut registry = DocumentRegistry::new();
        registry.apply(DocumentList { documents: vec![record("a", "one.pdf", 1)], total_count: Some(1) });

        assert!(registry.request_delete("missing").is_none());
        assert_eq!(registry.request_delete("a").map(|p| p.filename.as_str()), Some("one.pdf"));
        registry.cancel_delete();
        assert!(registry.confirm_delete().is_none());

        registry.request_delete("a");
        assert_eq!(registry.confirm_delete().map(|p| p.id), Some("a".to_string()));
        // Cache is untouched until the next refresh
        assert_eq!(registry.documents().len(), 1);
    }
}
