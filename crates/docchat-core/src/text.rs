//! Display helpers for text that comes from the backend.

use std::sync::OnceLock;

use chrono::NaiveDateTime;
use regex::Regex;

fn escape_sequences() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        // CSI sequences, OSC sequences (BEL or ST terminated), then any other two-byte ESC form
        Regex::new(r"\x1b\[[0-?]*[ -/]*[@-~]|\x1b\][^\x07\x1b]*(?:\x07|\x1b\\)?|\x1b[@-_]?")
            .expect("static regex")
    })
}

/// Strip terminal escape sequences and control characters so backend text
/// can only ever be drawn, never interpreted by the terminal.
/// Newlines and tabs survive; carriage returns are dropped.
pub fn sanitize(text: &str) -> String {
    let without_escapes = escape_sequences().replace_all(text, "");
    without_escapes
        .chars()
        .filter(|c| *c == '\n' || *c == '\t' || !c.is_control())
        .collect()
}

/// Render a backend `upload_date` (naive UTC ISO-8601) as `YYYY-MM-DD HH:MM`.
/// Unparseable input is shown sanitised but otherwise untouched.
pub fn format_upload_date(raw: &str) -> String {
    let trimmed = raw.trim_end_matches('Z');
    NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%dT%H:%M:%S%.f")
        .map(|dt| dt.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|_| sanitize(raw))
}

/// Pretty JSON for display, sanitized. Falls back to the compact form.
pub fn pretty_json(value: &serde_json::Value) -> String {
    let text = serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string());
    sanitize(&text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_strips_ansi() {
        assert_eq!(sanitize("\x1b[31mred\x1b[0m text"), "red text");
        assert_eq!(sanitize("title\x1b]0;pwned\x07 ok"), "title ok");
        assert_eq!(sanitize("a\x1b]8;;http://x\x1b\\link\x1b]8;;\x1b\\b"), "alinkb");
    }

    #[test]
    fn test_sanitize_keeps_layout_characters() {
        assert_eq!(sanitize("line one\nline\ttwo\r\n"), "line one\nline\ttwo\n");
        assert_eq!(sanitize("bell\x07 and nul\0"), "bell and nul");
        assert_eq!(sanitize("<b>markup</b> stays literal"), "<b>markup</b> stays literal");
    }

    #[test]
    fn test_pretty_json_escapes_control_characters() {
        let value = serde_json::json!({"index": "faiss\u{1b}[2J", "vectors": 12});
        let text = pretty_json(&value);
        assert!(text.contains("\"vectors\": 12"));
        assert!(!text.contains('\x1b'));
        assert!(text.contains("faiss\\u001b[2J"));
    }

    #[test]
    fn test_format_upload_date() {
        assert_eq!(format_upload_date("2024-05-01T10:03:44.123456"), "2024-05-01 10:03");
        assert_eq!(format_upload_date("2024-05-01T10:03:44"), "2024-05-01 10:03");
        assert_eq!(format_upload_date("yesterday"), "yesterday");
    }
}
