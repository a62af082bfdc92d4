//! UI-agnostic application state types
//!
//! Shared between the chat flow and whichever front end renders it; nothing
//! here depends on a UI framework.

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

use crate::text::sanitize;

/// A message in the chat transcript
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
    pub timestamp: DateTime<Local>,
}

/// Who a transcript entry belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChatRole {
    User,
    Assistant,
    /// Inline failure notice, shown in the conversation instead of a toast
    Error,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self::at(ChatRole::User, content.into(), Local::now())
    }

    /// Assistant text is sanitised on the way in.
    pub fn assistant(content: &str) -> Self {
        Self::at(ChatRole::Assistant, sanitize(content), Local::now())
    }

    pub fn error(content: &str) -> Self {
        Self::at(ChatRole::Error, sanitize(content), Local::now())
    }

    pub fn at(role: ChatRole, content: String, timestamp: DateTime<Local>) -> Self {
        Self { role, content, timestamp }
    }

    pub fn is_user(&self) -> bool {
        self.role == ChatRole::User
    }
}
