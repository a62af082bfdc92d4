//! Upload flow: drop validation, coarse progress milestones and the
//! one-upload-at-a-time rule.

use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::api::UploadRequest;
use crate::error::ApiError;
use crate::models::UploadReceipt;

pub const UPLOAD_FAILED: &str = "Upload failed. Please try again.";

/// How long the upload panel lingers after a successful upload.
pub const UPLOAD_CLOSE_DELAY: Duration = Duration::from_millis(1500);

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum UploadStage {
    #[default]
    Idle,
    Starting,
    Reading,
    Processing,
    Succeeded,
    Failed(String),
}

impl UploadStage {
    pub fn message(&self) -> &str {
        match self {
            UploadStage::Idle => "",
            UploadStage::Starting => "Starting upload...",
            UploadStage::Reading => "Reading file...",
            UploadStage::Processing => "Processing PDF...",
            UploadStage::Succeeded => "Upload successful!",
            UploadStage::Failed(msg) => msg,
        }
    }

    pub fn progress_percent(&self) -> u16 {
        match self {
            UploadStage::Idle | UploadStage::Failed(_) => 0,
            UploadStage::Starting => 10,
            UploadStage::Reading => 25,
            UploadStage::Processing => 50,
            UploadStage::Succeeded => 100,
        }
    }

    pub fn is_in_flight(&self) -> bool {
        matches!(self, UploadStage::Starting | UploadStage::Reading | UploadStage::Processing)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadRejected {
    NotPdf(PathBuf),
    Busy,
    EmptyPath,
}

impl std::fmt::Display for UploadRejected {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UploadRejected::NotPdf(path) => {
                let name = path.file_name().map(|n| n.to_string_lossy()).unwrap_or_default();
                write!(f, "Only PDF files are supported ({name})")
            }
            UploadRejected::Busy => write!(f, "An upload is already in progress"),
            UploadRejected::EmptyPath => write!(f, "Choose a file to upload"),
        }
    }
}

#[derive(Debug, Default)]
pub struct UploadFlow {
    stage: UploadStage,
}

impl UploadFlow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stage(&self) -> &UploadStage {
        &self.stage
    }

    pub fn is_busy(&self) -> bool {
        self.stage.is_in_flight()
    }

    /// Dropped files must look like PDFs; the picker path is trusted.
    pub fn validate_drop(path: &Path) -> Result<(), UploadRejected> {
        if has_pdf_extension(path) {
            Ok(())
        } else {
            Err(UploadRejected::NotPdf(path.to_path_buf()))
        }
    }

    pub fn begin(&mut self, path: PathBuf, password: &str) -> Result<UploadRequest, UploadRejected> {
        if self.is_busy() {
            return Err(UploadRejected::Busy);
        }
        if path.as_os_str().is_empty() {
            return Err(UploadRejected::EmptyPath);
        }

        self.stage = UploadStage::Starting;
        Ok(UploadRequest {
            path,
            password: Some(password.to_string()).filter(|p| !p.is_empty()),
        })
    }

    /// Move to a later milestone. Ignored once the upload has settled.
    pub fn advance(&mut self, stage: UploadStage) {
        if self.is_busy() {
            self.stage = stage;
        }
    }

    /// Settle the upload, returning the receipt on success or the message to show.
    pub fn finish(&mut self, result: Result<UploadReceipt, ApiError>) -> Result<UploadReceipt, String> {
        match result {
            Ok(receipt) => {
                self.stage = UploadStage::Succeeded;
                Ok(receipt)
            }
            Err(err) => {
                let message = err.user_message(UPLOAD_FAILED);
                self.stage = UploadStage::Failed(message.clone());
                Err(message)
            }
        }
    }

    pub fn reset(&mut self) {
        if !self.is_busy() {
            self.stage = UploadStage::Idle;
        }
    }
}

pub fn has_pdf_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case("pdf"))
        .unwrap_or(false)
}

/// Turn text a terminal pasted for a dragged file into a path.
///
/// Handles surrounding quotes, `file://` URIs (with `%20` escapes) and
/// backslash-escaped spaces. Returns `None` for blank or multi-line text.
pub fn parse_dropped_path(text: &str) -> Option<PathBuf> {
    let text = text.trim();
    if text.is_empty() || text.contains('\n') {
        return None;
    }

    let unquoted = text
        .strip_prefix('\'')
        .and_then(|t| t.strip_suffix('\''))
        .or_else(|| text.strip_prefix('"').and_then(|t| t.strip_suffix('"')))
        .unwrap_or(text);

    let path = match unquoted.strip_prefix("file://") {
        Some(rest) => rest.replace("%20", " "),
        None => unquoted.replace("\\ ", " "),
    };

    Some(PathBuf::from(path))
}

/// Decide whether pasted text is a dragged-in file.
///
/// It is when it names an existing file, or when it names a PDF and is
/// written as a path (absolute, `~/...` or a `file://` URI). A sentence that
/// merely mentions `thesis.pdf` is not a drop. A leading `~` is expanded.
pub fn dropped_file(text: &str) -> Option<PathBuf> {
    let path = parse_dropped_path(text)?;
    if path.is_file() {
        return Some(path);
    }

    let unquoted = text.trim().trim_matches(|c| c == '\'' || c == '"');
    let written_as_path =
        path.is_absolute() || unquoted.starts_with("~/") || unquoted.starts_with("file://");
    if !(written_as_path && has_pdf_extension(&path)) {
        return None;
    }

    match (path.strip_prefix("~"), dirs::home_dir()) {
        (Ok(rest), Some(home)) => Some(home.join(rest)),
        _ => Some(path),
    }
}
