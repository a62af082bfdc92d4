use std::path::{Path, PathBuf};
use std::time::Instant;

use ratatui::layout::Rect;
use ratatui::widgets::ListState;
use tokio::sync::mpsc::UnboundedSender;
use tracing::{info, warn};

use docchat_core::upload::dropped_file;
use docchat_core::{
    BackendClient, ChatFlow, DocumentRegistry, HealthStatus, Modal, ModalKind, ModalStack,
    Outcome, SendRejected, ToastKind, ToastTiming, Toasts, UploadFlow, UploadStage,
};

use crate::tasks::{self, BackendEvent};
use crate::tui::AppEvent;

/// Tallest the chat input may grow, borders included.
pub const MAX_INPUT_HEIGHT: u16 = 8;
const MIN_INPUT_HEIGHT: u16 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    Input,
    Transcript,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UploadField {
    #[default]
    Path,
    Password,
}

/// The upload panel's two text fields.
#[derive(Debug, Default)]
pub struct UploadForm {
    pub path: String,
    pub password: String,
    pub field: UploadField,
}

impl UploadForm {
    pub fn active_mut(&mut self) -> &mut String {
        match self.field {
            UploadField::Path => &mut self.path,
            UploadField::Password => &mut self.password,
        }
    }

    pub fn toggle_field(&mut self) {
        self.field = match self.field {
            UploadField::Path => UploadField::Password,
            UploadField::Password => UploadField::Path,
        };
    }
}

/// Startup options that are not backend state.
#[derive(Debug, Clone, Default)]
pub struct Settings {
    pub stream: bool,
    pub toast_timing: ToastTiming,
    pub log_path: Option<PathBuf>,
}

pub struct App {
    // Core state
    pub should_quit: bool,
    pub focus: Focus,

    // Chat state
    pub chat: ChatFlow,
    pub input: String,
    pub input_cursor: usize, // cursor position in input, in chars
    pub transcript_scroll: u16,
    pub transcript_height: u16, // inner height of the transcript, set during render
    pub transcript_width: u16,

    // Documents
    pub registry: DocumentRegistry,
    pub documents_state: ListState,

    // Upload
    pub upload: UploadFlow,
    pub upload_form: UploadForm,

    // Overlays
    pub modals: ModalStack,
    pub toasts: Toasts,
    pub health: Option<Result<HealthStatus, String>>,

    // Animation state
    pub animation_frame: u8, // 0-2 for ellipsis animation

    // Panel areas for mouse hit-testing (updated during render)
    pub transcript_area: Option<Rect>,
    pub modal_area: Option<Rect>,

    // Wiring
    pub client: BackendClient,
    pub tx: UnboundedSender<AppEvent>,
    pub settings: Settings,
}

impl App {
    pub fn new(client: BackendClient, tx: UnboundedSender<AppEvent>, settings: Settings) -> Self {
        Self {
            should_quit: false,
            focus: Focus::Input,

            chat: ChatFlow::new(),
            input: String::new(),
            input_cursor: 0,
            transcript_scroll: 0,
            transcript_height: 0,
            transcript_width: 0,

            registry: DocumentRegistry::new(),
            documents_state: ListState::default(),

            upload: UploadFlow::new(),
            upload_form: UploadForm::default(),

            modals: ModalStack::new(),
            toasts: Toasts::new(settings.toast_timing),
            health: None,

            animation_frame: 0,

            transcript_area: None,
            modal_area: None,

            client,
            tx,
            settings,
        }
    }

    pub fn notify(&mut self, message: impl Into<String>, kind: ToastKind) {
        self.toasts.notify(message, kind);
    }

    // Document registry

    pub fn refresh_documents(&self) {
        tasks::refresh_documents(&self.client, &self.tx);
    }

    pub fn open_documents(&mut self) {
        self.modals.open(Modal::Documents);
        self.refresh_documents();
    }

    pub fn selected_document_id(&self) -> Option<String> {
        self.documents_state
            .selected()
            .and_then(|i| self.registry.documents().get(i))
            .map(|d| d.id.clone())
    }

    pub fn show_document_info(&self, id: String) {
        tasks::document_info(&self.client, &self.tx, id);
    }

    /// Ask before deleting; nothing is sent until the user confirms.
    pub fn request_delete(&mut self, id: &str) {
        if let Some(pending) = self.registry.request_delete(id).cloned() {
            self.modals.open(Modal::ConfirmDelete(pending));
        }
    }

    pub fn confirm_delete(&mut self) {
        self.modals.close(ModalKind::ConfirmDelete);
        if let Some(pending) = self.registry.confirm_delete() {
            // The detail panel for a document being deleted is now meaningless
            self.modals.close(ModalKind::DocumentDetail);
            tasks::delete_document(&self.client, &self.tx, pending.id, pending.filename);
        }
    }

    pub fn decline_delete(&mut self) {
        self.registry.cancel_delete();
        self.modals.close(ModalKind::ConfirmDelete);
    }

    pub fn documents_nav_down(&mut self) {
        let len = self.registry.documents().len();
        if len > 0 {
            let i = self.documents_state.selected().map(|i| i + 1).unwrap_or(0);
            self.documents_state.select(Some(i.min(len - 1)));
        }
    }

    pub fn documents_nav_up(&mut self) {
        let i = self.documents_state.selected().unwrap_or(0);
        self.documents_state.select(Some(i.saturating_sub(1)));
    }

    // Upload flow

    pub fn open_upload(&mut self) {
        self.upload.reset();
        self.modals.open(Modal::Upload);
    }

    /// Upload the file named in the panel's path field (picker semantics: no type check).
    pub fn submit_upload(&mut self) {
        let path = PathBuf::from(self.upload_form.path.trim());
        self.start_upload(path);
    }

    /// Terminal equivalent of dropping a file on the window.
    pub fn drop_file(&mut self, path: &Path) {
        if let Err(rejected) = UploadFlow::validate_drop(path) {
            warn!(path = %path.display(), "rejected dropped file");
            self.notify(rejected.to_string(), ToastKind::Error);
            return;
        }
        self.upload_form.path = path.display().to_string();
        self.modals.open(Modal::Upload);
        self.start_upload(path.to_path_buf());
    }

    fn start_upload(&mut self, path: PathBuf) {
        match self.upload.begin(path, &self.upload_form.password) {
            Ok(request) => tasks::upload(&self.client, &self.tx, request),
            Err(rejected) => self.notify(rejected.to_string(), ToastKind::Warning),
        }
    }

    /// Pasted text that names a dropped file starts an upload; anything else
    /// is typed into whichever field has focus.
    pub fn handle_paste(&mut self, text: &str) {
        if let Some(path) = dropped_file(text) {
            self.drop_file(&path);
            return;
        }

        if self.modals.top_kind() == Some(ModalKind::Upload) {
            self.upload_form.active_mut().push_str(text.trim_end_matches(['\r', '\n']));
        } else if self.modals.is_empty() {
            self.focus = Focus::Input;
            for c in text.chars().filter(|c| *c != '\r') {
                self.insert_char(c);
            }
        }
    }

    // Chat flow

    pub fn send_message(&mut self) {
        match self.chat.send(&self.input) {
            Ok(outgoing) => {
                self.input.clear();
                self.input_cursor = 0;
                self.scroll_transcript_to_bottom();
                tasks::query(&self.client, &self.tx, outgoing, self.settings.stream);
            }
            Err(SendRejected::Empty) => {}
            Err(SendRejected::Busy) => {
                self.notify("Still waiting for the previous answer", ToastKind::Info);
            }
        }
    }

    pub fn start_new_chat(&mut self) {
        self.chat.start_new_chat();
        self.transcript_scroll = 0;
    }

    pub fn resume_conversation(&self, id: String) {
        tasks::conversation(&self.client, &self.tx, id);
    }

    pub fn open_system_info(&mut self) {
        self.modals.open(Modal::SystemInfo);
        self.health = None;
        tasks::health(&self.client, &self.tx);
    }

    // Input editing

    pub fn insert_char(&mut self, c: char) {
        let byte_pos = char_to_byte_index(&self.input, self.input_cursor);
        self.input.insert(byte_pos, c);
        self.input_cursor += 1;
    }

    pub fn delete_char_before_cursor(&mut self) {
        if self.input_cursor > 0 {
            self.input_cursor -= 1;
            let byte_pos = char_to_byte_index(&self.input, self.input_cursor);
            self.input.remove(byte_pos);
        }
    }

    pub fn delete_char_at_cursor(&mut self) {
        if self.input_cursor < self.input.chars().count() {
            let byte_pos = char_to_byte_index(&self.input, self.input_cursor);
            self.input.remove(byte_pos);
        }
    }

    /// Rows the input box needs: one per line plus borders, capped.
    pub fn input_height(&self) -> u16 {
        let lines = u16::try_from(self.input.split('\n').count()).unwrap_or(u16::MAX);
        lines.saturating_add(2).clamp(MIN_INPUT_HEIGHT, MAX_INPUT_HEIGHT)
    }

    // Backend results

    pub fn apply_backend_event(&mut self, event: BackendEvent) {
        match event {
            BackendEvent::Documents(Ok(list)) => {
                self.registry.apply(list);
                let len = self.registry.documents().len();
                match self.documents_state.selected() {
                    _ if len == 0 => self.documents_state.select(None),
                    Some(i) if i >= len => self.documents_state.select(Some(len - 1)),
                    None => self.documents_state.select(Some(0)),
                    _ => {}
                }
            }
            BackendEvent::Documents(Err(e)) => {
                self.notify(e.user_message("Failed to fetch documents"), ToastKind::Error);
            }
            BackendEvent::DocumentInfo(Ok(info)) => {
                self.modals.open(Modal::DocumentDetail(info));
            }
            BackendEvent::DocumentInfo(Err(e)) => {
                self.notify(e.user_message("Failed to get document info"), ToastKind::Error);
            }
            BackendEvent::Deleted { filename, result: Ok(()) } => {
                info!(filename = %filename, "document deleted");
                self.notify(format!("Deleted {filename}"), ToastKind::Success);
                self.refresh_documents();
            }
            BackendEvent::Deleted { result: Err(e), .. } => {
                self.notify(e.user_message("Failed to delete document"), ToastKind::Error);
            }
            BackendEvent::UploadProgress(stage) => self.upload.advance(stage),
            BackendEvent::UploadFinished(result) => match self.upload.finish(result) {
                Ok(receipt) => {
                    info!(document = ?receipt.document_id, "upload complete");
                    let message = receipt
                        .message
                        .clone()
                        .unwrap_or_else(|| UploadStage::Succeeded.message().to_string());
                    self.notify(message, ToastKind::Success);
                    self.upload_form = UploadForm::default();
                    tasks::close_upload_panel_later(&self.tx);
                    self.refresh_documents();
                    self.start_new_chat();
                    self.chat.session_mut().set_active_document(receipt.document_id);
                }
                Err(message) => {
                    self.notify(message, ToastKind::Error);
                    if !self.modals.is_open(ModalKind::Upload) {
                        self.modals.open(Modal::Upload);
                    }
                }
            },
            BackendEvent::CloseUploadPanel => {
                // A retry may have started since; only close a settled panel
                if !self.upload.is_busy() {
                    self.modals.close(ModalKind::Upload);
                    self.upload.reset();
                }
            }
            BackendEvent::QueryEvent { ticket, event } => {
                if self.chat.apply_stream_event(ticket, &event) == Outcome::Applied {
                    self.scroll_transcript_to_bottom();
                }
            }
            BackendEvent::QueryFinished { ticket, result } => {
                if self.chat.complete(ticket, result) == Outcome::Applied {
                    self.scroll_transcript_to_bottom();
                }
            }
            BackendEvent::History(Ok(history)) => {
                self.chat.resume(history);
                self.scroll_transcript_to_bottom();
            }
            BackendEvent::History(Err(e)) => {
                self.notify(e.user_message("Failed to load conversation"), ToastKind::Error);
            }
            BackendEvent::Health(result) => {
                self.health = Some(result.map_err(|e| e.user_message("Backend unavailable")));
            }
        }
    }

    /// Tick animation frame and expire toasts (called by Tick event)
    pub fn tick(&mut self) {
        if self.chat.is_thinking() {
            self.animation_frame = (self.animation_frame + 1) % 3;
        }
        self.toasts.prune(Instant::now());
    }

    /// Scroll the transcript so the newest entry (or "Thinking...") is visible
    pub fn scroll_transcript_to_bottom(&mut self) {
        // Use actual width for wrap calculation, default to 50 if not rendered yet
        let wrap_width = if self.transcript_width > 0 {
            self.transcript_width as usize
        } else {
            50
        };

        let mut total_lines: u16 = 0;
        for msg in self.chat.transcript() {
            total_lines = total_lines.saturating_add(1); // Role line
            for line in msg.content.lines() {
                // Use character count, not byte length, for proper UTF-8 handling
                let char_count = line.chars().count();
                total_lines = total_lines.saturating_add((char_count / wrap_width + 1) as u16);
            }
            total_lines = total_lines.saturating_add(1); // Blank line after message
        }
        if self.chat.is_thinking() {
            total_lines = total_lines.saturating_add(2);
        }

        let visible_height = if self.transcript_height > 0 {
            self.transcript_height
        } else {
            20
        };

        self.transcript_scroll = total_lines.saturating_sub(visible_height);
    }
}

/// Convert a character index to a byte index for UTF-8 safe string operations
pub fn char_to_byte_index(s: &str, char_idx: usize) -> usize {
    s.char_indices()
        .nth(char_idx)
        .map(|(i, _)| i)
        .unwrap_or(s.len())
}
