use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseButton, MouseEvent, MouseEventKind};
use ratatui::layout::Rect;

use docchat_core::ModalKind;

use crate::app::{App, Focus};
use crate::tui::AppEvent;

pub fn handle_event(app: &mut App, event: AppEvent) {
    match event {
        AppEvent::Key(key) => handle_key(app, key),
        AppEvent::Mouse(mouse) => handle_mouse(app, mouse),
        AppEvent::Paste(text) => app.handle_paste(&text),
        AppEvent::Resize(_, _) => {}
        AppEvent::Tick => app.tick(),
        AppEvent::Backend(event) => app.apply_backend_event(event),
    }
}

fn handle_key(app: &mut App, key: KeyEvent) {
    // Global keys that work in any mode
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        app.should_quit = true;
        return;
    }

    match app.modals.top_kind() {
        Some(ModalKind::Upload) => handle_upload_modal(app, key),
        Some(ModalKind::Documents) => handle_documents_modal(app, key),
        Some(ModalKind::DocumentDetail) => handle_detail_modal(app, key),
        Some(ModalKind::ConfirmDelete) => handle_confirm_modal(app, key),
        Some(ModalKind::SystemInfo) => handle_system_modal(app, key),
        None => {
            if handle_shortcut(app, key) {
                return;
            }
            match app.focus {
                Focus::Input => handle_input(app, key),
                Focus::Transcript => handle_transcript(app, key),
            }
        }
    }
}

/// Ctrl shortcuts available from the main screen regardless of focus.
fn handle_shortcut(app: &mut App, key: KeyEvent) -> bool {
    if !key.modifiers.contains(KeyModifiers::CONTROL) {
        return false;
    }
    match key.code {
        KeyCode::Char('n') => app.start_new_chat(),
        KeyCode::Char('u') => app.open_upload(),
        KeyCode::Char('o') => app.open_documents(),
        KeyCode::Char('t') => app.open_system_info(),
        _ => return false,
    }
    true
}

fn handle_input(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => app.focus = Focus::Transcript,
        // Shift+Enter inserts a newline; Alt+Enter too, for terminals that hide Shift
        KeyCode::Enter
            if key.modifiers.intersects(KeyModifiers::SHIFT | KeyModifiers::ALT) =>
        {
            app.insert_char('\n');
        }
        KeyCode::Enter => app.send_message(),
        KeyCode::Backspace => app.delete_char_before_cursor(),
        KeyCode::Delete => app.delete_char_at_cursor(),
        KeyCode::Left => {
            app.input_cursor = app.input_cursor.saturating_sub(1);
        }
        KeyCode::Right => {
            let char_count = app.input.chars().count();
            app.input_cursor = (app.input_cursor + 1).min(char_count);
        }
        KeyCode::Home => app.input_cursor = 0,
        KeyCode::End => app.input_cursor = app.input.chars().count(),
        KeyCode::PageUp => app.transcript_scroll = app.transcript_scroll.saturating_sub(5),
        KeyCode::PageDown => app.transcript_scroll = app.transcript_scroll.saturating_add(5),
        KeyCode::Tab => app.focus = Focus::Transcript,
        KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => app.insert_char(c),
        _ => {}
    }
}

fn handle_transcript(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Char('q') => app.should_quit = true,
        KeyCode::Char('j') | KeyCode::Down => {
            app.transcript_scroll = app.transcript_scroll.saturating_add(1);
        }
        KeyCode::Char('k') | KeyCode::Up => {
            app.transcript_scroll = app.transcript_scroll.saturating_sub(1);
        }
        KeyCode::PageDown => app.transcript_scroll = app.transcript_scroll.saturating_add(5),
        KeyCode::PageUp => app.transcript_scroll = app.transcript_scroll.saturating_sub(5),
        KeyCode::Char('g') => app.transcript_scroll = 0,
        KeyCode::Char('G') => app.scroll_transcript_to_bottom(),
        KeyCode::Char('n') => app.start_new_chat(),
        KeyCode::Char('u') => app.open_upload(),
        KeyCode::Char('o') => app.open_documents(),
        KeyCode::Char('s') => app.open_system_info(),
        KeyCode::Tab | KeyCode::Char('i') | KeyCode::Enter => {
            app.focus = Focus::Input;
            // Cursor at end of existing text
            app.input_cursor = app.input.chars().count();
        }
        _ => {}
    }
}

fn handle_upload_modal(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => {
            app.modals.close_top();
        }
        KeyCode::Tab | KeyCode::BackTab | KeyCode::Down | KeyCode::Up => {
            app.upload_form.toggle_field();
        }
        KeyCode::Enter => app.submit_upload(),
        KeyCode::Backspace => {
            app.upload_form.active_mut().pop();
        }
        KeyCode::Char(c) => app.upload_form.active_mut().push(c),
        _ => {}
    }
}

fn handle_documents_modal(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc | KeyCode::Char('q') => {
            app.modals.close_top();
        }
        KeyCode::Char('j') | KeyCode::Down => app.documents_nav_down(),
        KeyCode::Char('k') | KeyCode::Up => app.documents_nav_up(),
        KeyCode::Enter | KeyCode::Char('i') => {
            if let Some(id) = app.selected_document_id() {
                app.show_document_info(id);
            }
        }
        KeyCode::Char('d') | KeyCode::Delete => {
            if let Some(id) = app.selected_document_id() {
                app.request_delete(&id);
            }
        }
        KeyCode::Char('r') => app.refresh_documents(),
        KeyCode::Char('u') => app.open_upload(),
        _ => {}
    }
}

fn handle_detail_modal(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc | KeyCode::Char('q') | KeyCode::Enter => {
            app.modals.close_top();
        }
        KeyCode::Char('d') | KeyCode::Delete => {
            let id = match app.modals.top() {
                Some(docchat_core::Modal::DocumentDetail(info)) => info.id.clone(),
                _ => return,
            };
            app.request_delete(&id);
        }
        _ => {}
    }
}

fn handle_confirm_modal(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Char('y') | KeyCode::Char('Y') | KeyCode::Enter => app.confirm_delete(),
        KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => app.decline_delete(),
        _ => {}
    }
}

fn handle_system_modal(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc | KeyCode::Char('q') | KeyCode::Enter => {
            app.modals.close_top();
        }
        KeyCode::Char('r') => app.open_system_info(),
        _ => {}
    }
}

/// Check if a point is within a rectangle
fn point_in_rect(x: u16, y: u16, rect: Rect) -> bool {
    x >= rect.x && x < rect.x + rect.width && y >= rect.y && y < rect.y + rect.height
}

fn handle_mouse(app: &mut App, mouse: MouseEvent) {
    let x = mouse.column;
    let y = mouse.row;

    match mouse.kind {
        // Clicking outside the open panel closes it
        MouseEventKind::Down(MouseButton::Left) => {
            if app.modals.is_empty() {
                return;
            }
            let inside = app.modal_area.map(|r| point_in_rect(x, y, r)).unwrap_or(false);
            if !inside {
                if app.modals.top_kind() == Some(ModalKind::ConfirmDelete) {
                    app.decline_delete();
                } else {
                    app.modals.close_top();
                }
            }
        }
        MouseEventKind::ScrollDown => {
            let in_transcript = app.transcript_area.map(|r| point_in_rect(x, y, r)).unwrap_or(false);
            if app.modals.top_kind() == Some(ModalKind::Documents) {
                app.documents_nav_down();
            } else if app.modals.is_empty() && in_transcript {
                app.transcript_scroll = app.transcript_scroll.saturating_add(3);
            }
        }
        MouseEventKind::ScrollUp => {
            let in_transcript = app.transcript_area.map(|r| point_in_rect(x, y, r)).unwrap_or(false);
            if app.modals.top_kind() == Some(ModalKind::Documents) {
                app.documents_nav_up();
            } else if app.modals.is_empty() && in_transcript {
                app.transcript_scroll = app.transcript_scroll.saturating_sub(3);
            }
        }
        _ => {}
    }
}
