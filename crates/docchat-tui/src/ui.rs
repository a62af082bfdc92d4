use std::time::Instant;

use ratatui::{
    Frame,
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Clear, Gauge, List, ListItem, Paragraph, Wrap},
};

use docchat_core::text::{format_upload_date, pretty_json, sanitize};
use docchat_core::{
    ChatRole, DocumentInfo, Modal, PendingDelete, ToastKind, ToastPhase, UploadStage,
};

use crate::app::{App, Focus, UploadField};

const WELCOME: [&str; 4] = [
    "Welcome! Ask anything about your uploaded documents.",
    "",
    "Upload a PDF with Ctrl+U, or drag a PDF file onto this terminal.",
    "Browse uploaded documents with Ctrl+O.",
];

/// Parse a line of text and convert **bold** markdown to styled spans
fn parse_markdown_line(text: &str) -> Line<'static> {
    let mut spans: Vec<Span<'static>> = Vec::new();
    let mut chars = text.chars().peekable();
    let mut current_text = String::new();

    while let Some(c) = chars.next() {
        if c == '*' && chars.peek() == Some(&'*') {
            // Consume the second *
            chars.next();

            // Push any accumulated plain text
            if !current_text.is_empty() {
                spans.push(Span::raw(std::mem::take(&mut current_text)));
            }

            // Find closing **
            let mut bold_text = String::new();
            let mut found_close = false;
            while let Some(c) = chars.next() {
                if c == '*' && chars.peek() == Some(&'*') {
                    chars.next();
                    found_close = true;
                    break;
                }
                bold_text.push(c);
            }

            if found_close && !bold_text.is_empty() {
                spans.push(Span::styled(
                    bold_text,
                    Style::default().add_modifier(Modifier::BOLD),
                ));
            } else {
                // No closing **, treat as literal
                current_text.push_str("**");
                current_text.push_str(&bold_text);
            }
        } else {
            current_text.push(c);
        }
    }

    if !current_text.is_empty() {
        spans.push(Span::raw(current_text));
    }

    Line::from(spans)
}

pub fn render(app: &mut App, frame: &mut Frame) {
    let area = frame.area();

    // Main layout: header, transcript, upload status, input, footer
    let status_height = if app.upload.stage() == &UploadStage::Idle { 0 } else { 1 };
    let [header_area, body_area, status_area, input_area, footer_area] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Min(0),
        Constraint::Length(status_height),
        Constraint::Length(app.input_height()),
        Constraint::Length(1),
    ])
    .areas(area);

    render_header(app, frame, header_area);
    render_transcript(app, frame, body_area);
    if status_height > 0 {
        render_upload_status(app, frame, status_area);
    }
    render_input(app, frame, input_area);
    render_footer(app, frame, footer_area);

    // Panels in stacking order; only the topmost takes clicks
    app.modal_area = None;
    let modals: Vec<Modal> = app.modals.iter().cloned().collect();
    for modal in &modals {
        let modal_area = match modal {
            Modal::Upload => render_upload_modal(app, frame, area),
            Modal::Documents => render_documents_modal(app, frame, area),
            Modal::SystemInfo => render_system_modal(app, frame, area),
            Modal::DocumentDetail(info) => render_detail_modal(info, frame, area),
            Modal::ConfirmDelete(pending) => render_confirm_modal(pending, frame, area),
        };
        app.modal_area = Some(modal_area);
    }

    render_toasts(app, frame, area);
}

/// Centered popup of at most `width` x `height`, cleared underneath.
fn popup(frame: &mut Frame, area: Rect, width: u16, height: u16) -> Rect {
    let popup_width = width.min(area.width.saturating_sub(4));
    let popup_height = height.min(area.height.saturating_sub(2));
    let popup_x = area.x + (area.width.saturating_sub(popup_width)) / 2;
    let popup_y = area.y + (area.height.saturating_sub(popup_height)) / 2;
    let popup_area = Rect::new(popup_x, popup_y, popup_width, popup_height);

    // Clear the area behind the popup
    frame.render_widget(Clear, popup_area);
    popup_area
}

fn render_header(app: &App, frame: &mut Frame, area: Rect) {
    let summary = app.registry.summary();
    let counts = if app.registry.is_loaded() {
        format!(" {} documents | {} chunks ", summary.documents, summary.chunks)
    } else {
        " documents not loaded ".to_string()
    };

    let conversation = match app.chat.session().conversation_id() {
        Some(id) => format!(" conversation {} ", short_id(id)),
        None => " new conversation ".to_string(),
    };

    let title = Line::from(vec![
        Span::styled(" docchat ", Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)),
        Span::styled(counts, Style::default().fg(Color::White)),
        Span::styled(conversation, Style::default().fg(Color::Gray)),
        Span::raw(" "),
        Span::styled(
            format!("v{}", env!("CARGO_PKG_VERSION")),
            Style::default().fg(Color::Gray),
        ),
    ]);

    let header = Paragraph::new(title).style(Style::default().bg(Color::DarkGray));
    frame.render_widget(header, area);
}

fn short_id(id: &str) -> String {
    let id = sanitize(id);
    if id.chars().count() > 8 {
        id.chars().take(8).collect()
    } else {
        id
    }
}

fn render_transcript(app: &mut App, frame: &mut Frame, area: Rect) {
    // Store area for mouse hit-testing and scroll calculations (inner size minus borders)
    app.transcript_area = Some(area);
    app.transcript_height = area.height.saturating_sub(2);
    app.transcript_width = area.width.saturating_sub(2);

    let focused = app.focus == Focus::Transcript && app.modals.is_empty();
    let border_color = if focused { Color::Cyan } else { Color::DarkGray };
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color))
        .title(" Chat ");

    let transcript = app.chat.transcript();
    if transcript.is_empty() && !app.chat.is_thinking() {
        let lines: Vec<Line> = WELCOME
            .iter()
            .enumerate()
            .map(|(i, text)| {
                let style = if i == 0 {
                    Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)
                } else {
                    Style::default().fg(Color::Gray)
                };
                Line::from(Span::styled(*text, style))
            })
            .collect();
        let welcome = Paragraph::new(Text::from(lines))
            .block(block)
            .wrap(Wrap { trim: true });
        frame.render_widget(welcome, area);
        return;
    }

    let mut lines: Vec<Line> = Vec::new();
    for msg in transcript {
        let time = msg.timestamp.format("%H:%M").to_string();
        match msg.role {
            ChatRole::User => {
                lines.push(Line::from(vec![
                    Span::styled("You", Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)),
                    Span::styled(format!(" {time}"), Style::default().fg(Color::DarkGray)),
                ]));
                for line in msg.content.lines() {
                    lines.push(Line::from(line.to_string()));
                }
            }
            ChatRole::Assistant => {
                lines.push(Line::from(vec![
                    Span::styled("AI", Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)),
                    Span::styled(format!(" {time}"), Style::default().fg(Color::DarkGray)),
                ]));
                for line in msg.content.lines() {
                    lines.push(parse_markdown_line(line));
                }
            }
            ChatRole::Error => {
                for line in msg.content.lines() {
                    lines.push(Line::from(Span::styled(
                        line.to_string(),
                        Style::default().fg(Color::Red),
                    )));
                }
            }
        }
        lines.push(Line::default());
    }

    if app.chat.is_thinking() {
        lines.push(Line::from(Span::styled(
            "AI",
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
        )));
        // Animated ellipsis: cycles through ".", "..", "..."
        let dots = ".".repeat((app.animation_frame as usize) + 1);
        lines.push(Line::from(Span::styled(
            format!("Thinking{dots}"),
            Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
        )));
    }

    let chat = Paragraph::new(Text::from(lines))
        .block(block)
        .wrap(Wrap { trim: false })
        .scroll((app.transcript_scroll, 0));
    frame.render_widget(chat, area);
}

fn render_upload_status(app: &App, frame: &mut Frame, area: Rect) {
    let stage = app.upload.stage();
    let color = match stage {
        UploadStage::Failed(_) => Color::Red,
        UploadStage::Succeeded => Color::Green,
        _ => Color::Yellow,
    };
    let gauge = Gauge::default()
        .gauge_style(Style::default().fg(color).bg(Color::Black))
        .percent(stage.progress_percent())
        .label(format!("{} {}%", stage.message(), stage.progress_percent()));
    frame.render_widget(gauge, area);
}

fn render_input(app: &App, frame: &mut Frame, area: Rect) {
    let editing = app.focus == Focus::Input && app.modals.is_empty();
    let border_color = if editing { Color::Yellow } else { Color::DarkGray };
    let title = if app.chat.is_waiting() {
        " Ask (waiting for answer) "
    } else {
        " Ask (Enter send, Shift+Enter newline) "
    };
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color))
        .title(title);

    let inner_width = area.width.saturating_sub(2) as usize;
    let inner_height = area.height.saturating_sub(2) as usize;

    // Cursor row/column from the text before it
    let before: String = app.input.chars().take(app.input_cursor).collect();
    let cursor_row = before.matches('\n').count();
    let cursor_col = before.rsplit('\n').next().map(|l| l.chars().count()).unwrap_or(0);

    // Scroll so the cursor stays visible in both directions
    let row_offset = (cursor_row + 1).saturating_sub(inner_height.max(1));
    let col_offset = if inner_width == 0 {
        0
    } else {
        (cursor_col + 1).saturating_sub(inner_width)
    };

    let visible: Vec<Line> = app
        .input
        .split('\n')
        .skip(row_offset)
        .take(inner_height)
        .map(|line| Line::from(line.chars().skip(col_offset).take(inner_width).collect::<String>()))
        .collect();

    let input = Paragraph::new(Text::from(visible))
        .style(Style::default().fg(Color::Cyan))
        .block(block);
    frame.render_widget(input, area);

    if editing {
        frame.set_cursor_position((
            area.x + 1 + (cursor_col - col_offset) as u16,
            area.y + 1 + (cursor_row - row_offset) as u16,
        ));
    }
}

fn render_footer(app: &App, frame: &mut Frame, area: Rect) {
    // Key style: dark background with bright text for visibility on both light/dark terminals
    let key_style = Style::default().bg(Color::DarkGray).fg(Color::White);
    let label_style = Style::default().bg(Color::Black).fg(Color::White);

    let hint = |key: &'static str, label: &'static str| {
        [Span::styled(key, key_style), Span::styled(label, label_style)]
    };

    let hints: Vec<Span> = match app.modals.top() {
        Some(Modal::Upload) => [hint(" Tab ", " field "), hint(" Enter ", " upload "), hint(" Esc ", " close ")].concat(),
        Some(Modal::Documents) => [
            hint(" j/k ", " nav "),
            hint(" Enter ", " info "),
            hint(" d ", " delete "),
            hint(" r ", " refresh "),
            hint(" u ", " upload "),
            hint(" Esc ", " close "),
        ]
        .concat(),
        Some(Modal::DocumentDetail(_)) => [hint(" d ", " delete "), hint(" Esc ", " close ")].concat(),
        Some(Modal::ConfirmDelete(_)) => [hint(" y ", " delete "), hint(" n ", " keep ")].concat(),
        Some(Modal::SystemInfo) => [hint(" r ", " refresh "), hint(" Esc ", " close ")].concat(),
        None => match app.focus {
            Focus::Input => [
                hint(" Enter ", " send "),
                hint(" C-n ", " new chat "),
                hint(" C-u ", " upload "),
                hint(" C-o ", " documents "),
                hint(" C-t ", " info "),
                hint(" Esc ", " scroll "),
            ]
            .concat(),
            Focus::Transcript => [
                hint(" j/k ", " scroll "),
                hint(" i ", " type "),
                hint(" n ", " new chat "),
                hint(" u ", " upload "),
                hint(" o ", " documents "),
                hint(" s ", " info "),
                hint(" q ", " quit "),
            ]
            .concat(),
        },
    };

    let footer = Paragraph::new(Line::from(hints)).style(Style::default().bg(Color::Black));
    frame.render_widget(footer, area);
}

fn render_upload_modal(app: &App, frame: &mut Frame, area: Rect) -> Rect {
    let popup_area = popup(frame, area, 64, 11);
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan))
        .title(" Upload PDF ");
    let inner = block.inner(popup_area);
    frame.render_widget(block, popup_area);

    let [path_area, password_area, _, progress_area, message_area] = Layout::vertical([
        Constraint::Length(3),
        Constraint::Length(3),
        Constraint::Length(1),
        Constraint::Length(1),
        Constraint::Min(0),
    ])
    .areas(inner);

    let field = |title: &'static str, value: String, active: bool| {
        let color = if active { Color::Yellow } else { Color::DarkGray };
        Paragraph::new(value).block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(color))
                .title(title),
        )
    };

    let form = &app.upload_form;
    let path_active = form.field == UploadField::Path;
    let path_width = path_area.width.saturating_sub(2) as usize;
    let path_len = form.path.chars().count();
    let visible_path: String = form.path.chars().skip((path_len + 1).saturating_sub(path_width)).collect();
    frame.render_widget(field(" File path ", visible_path.clone(), path_active), path_area);
    frame.render_widget(
        field(" Password (optional) ", "*".repeat(form.password.chars().count()), !path_active),
        password_area,
    );

    let stage = app.upload.stage();
    let color = match stage {
        UploadStage::Failed(_) => Color::Red,
        UploadStage::Succeeded => Color::Green,
        _ => Color::Yellow,
    };
    frame.render_widget(
        Gauge::default()
            .gauge_style(Style::default().fg(color))
            .percent(stage.progress_percent()),
        progress_area,
    );
    frame.render_widget(
        Paragraph::new(stage.message().to_string())
            .style(Style::default().fg(color))
            .wrap(Wrap { trim: true }),
        message_area,
    );

    // Cursor in the active field
    let (field_area, len) = if path_active {
        (path_area, visible_path.chars().count())
    } else {
        (password_area, form.password.chars().count())
    };
    let max_x = field_area.width.saturating_sub(2) as usize;
    frame.set_cursor_position((
        field_area.x + 1 + len.min(max_x) as u16,
        field_area.y + 1,
    ));

    popup_area
}

fn render_documents_modal(app: &mut App, frame: &mut Frame, area: Rect) -> Rect {
    let popup_area = popup(frame, area, 80, 20);
    let summary = app.registry.summary();
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan))
        .title(format!(
            " Documents: {} | Chunks: {} ",
            summary.documents, summary.chunks
        ));

    if app.registry.is_empty() {
        let text = if app.registry.is_loaded() {
            "No documents uploaded yet.\n\nPress u to upload a PDF."
        } else {
            "Loading documents..."
        };
        let placeholder = Paragraph::new(text)
            .style(Style::default().fg(Color::DarkGray))
            .block(block)
            .wrap(Wrap { trim: true });
        frame.render_widget(placeholder, popup_area);
        return popup_area;
    }

    let name_width = (popup_area.width as usize).saturating_sub(36).max(10);
    let items: Vec<ListItem> = app
        .registry
        .rows()
        .into_iter()
        .map(|row| {
            let name: String = row.filename.chars().take(name_width).collect();
            ListItem::new(Line::from(vec![
                Span::styled(format!("{name:<name_width$}"), Style::default().fg(Color::White)),
                Span::styled(format!(" {:>6} chunks ", row.chunks), Style::default().fg(Color::Yellow)),
                Span::styled(row.uploaded, Style::default().fg(Color::DarkGray)),
            ]))
        })
        .collect();

    let list = List::new(items)
        .block(block)
        .highlight_style(
            Style::default()
                .bg(Color::Blue)
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol("> ");

    frame.render_stateful_widget(list, popup_area, &mut app.documents_state);
    popup_area
}

fn render_detail_modal(info: &DocumentInfo, frame: &mut Frame, area: Rect) -> Rect {
    let popup_area = popup(frame, area, 70, 16);
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Magenta))
        .title(" Document details ");

    let label = Style::default().fg(Color::DarkGray);
    let mut lines = vec![
        Line::from(vec![Span::styled("Name      ", label), Span::raw(sanitize(&info.filename))]),
        Line::from(vec![Span::styled("ID        ", label), Span::raw(sanitize(&info.id))]),
        Line::from(vec![Span::styled("Uploaded  ", label), Span::raw(format_upload_date(&info.upload_date))]),
        Line::from(vec![Span::styled("Chunks    ", label), Span::raw(info.chunk_count.to_string())]),
    ];
    if let Some(stats) = &info.vector_store_info {
        lines.push(Line::default());
        lines.push(Line::from(Span::styled("Vector store", label)));
        for line in pretty_json(stats).lines() {
            lines.push(Line::from(format!("  {line}")));
        }
    }

    let paragraph = Paragraph::new(Text::from(lines))
        .block(block)
        .wrap(Wrap { trim: false });
    frame.render_widget(paragraph, popup_area);
    popup_area
}

fn render_confirm_modal(pending: &PendingDelete, frame: &mut Frame, area: Rect) -> Rect {
    let popup_area = popup(frame, area, 56, 7);
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Red))
        .title(" Delete document ");

    let text = Text::from(vec![
        Line::from(format!("Delete \"{}\"?", pending.filename)),
        Line::from(Span::styled(
            "Its chunks are removed from the index. This cannot be undone.",
            Style::default().fg(Color::DarkGray),
        )),
        Line::default(),
        Line::from(vec![
            Span::styled(" y ", Style::default().bg(Color::Red).fg(Color::White)),
            Span::raw(" delete   "),
            Span::styled(" n ", Style::default().bg(Color::DarkGray).fg(Color::White)),
            Span::raw(" keep"),
        ]),
    ]);
    frame.render_widget(
        Paragraph::new(text).block(block).wrap(Wrap { trim: true }),
        popup_area,
    );
    popup_area
}

fn render_system_modal(app: &App, frame: &mut Frame, area: Rect) -> Rect {
    let popup_area = popup(frame, area, 70, 14);
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan))
        .title(" System info ");

    let label = Style::default().fg(Color::DarkGray);
    let health = match &app.health {
        None => Span::styled("checking...", Style::default().fg(Color::Yellow)),
        Some(Ok(status)) => Span::styled(sanitize(&status.status), Style::default().fg(Color::Green)),
        Some(Err(message)) => Span::styled(message.clone(), Style::default().fg(Color::Red)),
    };
    let summary = app.registry.summary();
    let session = app.chat.session();
    let active_document = session
        .active_document()
        .map(|id| {
            app.registry
                .get(id)
                .map(|d| sanitize(&d.filename))
                .unwrap_or_else(|| sanitize(id))
        })
        .unwrap_or_else(|| "none".to_string());
    let log_path = app
        .settings
        .log_path
        .as_ref()
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| "disabled".to_string());

    let row = |name: &'static str, value: Span<'static>| Line::from(vec![Span::styled(name, label), value]);
    let lines = vec![
        row("Backend       ", Span::raw(app.client.base_url().to_string())),
        row("Health        ", health),
        row("Documents     ", Span::raw(summary.documents.to_string())),
        row("Chunks        ", Span::raw(summary.chunks.to_string())),
        row(
            "Conversation  ",
            Span::raw(session.conversation_id().map(sanitize).unwrap_or_else(|| "none".to_string())),
        ),
        row("Last upload   ", Span::raw(active_document)),
        row(
            "Responses     ",
            Span::raw(if app.settings.stream { "streamed" } else { "whole" }),
        ),
        row("Log file      ", Span::raw(log_path)),
        row("Version       ", Span::raw(env!("CARGO_PKG_VERSION"))),
    ];

    frame.render_widget(
        Paragraph::new(Text::from(lines)).block(block).wrap(Wrap { trim: false }),
        popup_area,
    );
    popup_area
}

fn render_toasts(app: &App, frame: &mut Frame, area: Rect) {
    let now = Instant::now();
    let width = 44.min(area.width);
    let mut y = area.y.saturating_add(1);

    for (toast, phase) in app.toasts.visible(now) {
        let text_width = width.saturating_sub(2).max(1) as usize;
        let rows = u16::try_from(toast.message.chars().count() / text_width + 1).unwrap_or(u16::MAX);
        let height = rows.saturating_add(2);
        if y.saturating_add(height) > area.bottom() {
            break;
        }

        let color = match toast.kind {
            ToastKind::Info => Color::Blue,
            ToastKind::Success => Color::Green,
            ToastKind::Warning => Color::Yellow,
            ToastKind::Error => Color::Red,
        };
        let mut style = Style::default().fg(color);
        if phase == ToastPhase::Fading {
            style = style.add_modifier(Modifier::DIM);
        }

        let toast_area = Rect::new(area.x + area.width - width, y, width, height);
        frame.render_widget(Clear, toast_area);
        frame.render_widget(
            Paragraph::new(toast.message.clone())
                .style(style)
                .block(Block::default().borders(Borders::ALL).border_style(style))
                .wrap(Wrap { trim: true }),
            toast_area,
        );
        y += height;
    }
}
