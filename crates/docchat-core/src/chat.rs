//! Chat flow: transcript, "thinking" placeholder and conversation tracking.
//!
//! The flow never performs I/O itself. `send` hands back the request to
//! issue, and the caller reports the outcome through `complete` (or
//! `apply_stream_event` for streamed answers) together with the ticket it
//! was given. Tickets from before a `start_new_chat` are ignored.

use chrono::{Local, NaiveDateTime, TimeZone, Utc};
use tracing::{debug, warn};

use crate::error::ApiError;
use crate::models::{ConversationHistory, QueryRequest, QueryResponse, StreamEvent};
use crate::session::{Session, Ticket};
use crate::state::{ChatMessage, ChatRole};
use crate::text::sanitize;

pub const QUERY_FAILED: &str = "Sorry, I couldn't get a response. Please try again.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendRejected {
    /// Nothing but whitespace was typed
    Empty,
    /// A previous question is still waiting for its answer
    Busy,
}

/// A query the caller must send to the backend.
#[derive(Debug, Clone)]
pub struct OutgoingQuery {
    pub ticket: Ticket,
    pub request: QueryRequest,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Applied,
    /// The response belonged to a conversation that has since been reset
    Stale,
}

#[derive(Debug)]
struct Pending {
    ticket: Ticket,
    // Transcript index of a partially streamed answer
    streamed: Option<usize>,
}

#[derive(Debug, Default)]
pub struct ChatFlow {
    session: Session,
    transcript: Vec<ChatMessage>,
    pending: Option<Pending>,
}

impl ChatFlow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut Session {
        &mut self.session
    }

    pub fn transcript(&self) -> &[ChatMessage] {
        &self.transcript
    }

    /// True while the placeholder should be drawn: a query is out and no
    /// streamed text has replaced the placeholder yet.
    pub fn is_thinking(&self) -> bool {
        matches!(self.pending, Some(Pending { streamed: None, .. }))
    }

    pub fn is_waiting(&self) -> bool {
        self.pending.is_some()
    }

    pub fn send(&mut self, input: &str) -> Result<OutgoingQuery, SendRejected> {
        let question = input.trim();
        if question.is_empty() {
            return Err(SendRejected::Empty);
        }
        if self.pending.is_some() {
            return Err(SendRejected::Busy);
        }

        self.transcript.push(ChatMessage::user(question));
        let ticket = self.session.ticket();
        self.pending = Some(Pending { ticket, streamed: None });

        Ok(OutgoingQuery {
            ticket,
            request: QueryRequest {
                question: question.to_string(),
                conversation_id: self.session.conversation_id().map(str::to_string),
            },
        })
    }

    /// Apply one streamed event. Content chunks grow an assistant message
    /// that takes the placeholder's place.
    pub fn apply_stream_event(&mut self, ticket: Ticket, event: &StreamEvent) -> Outcome {
        if !self.session.is_current(ticket) {
            return Outcome::Stale;
        }

        match event {
            StreamEvent::ConversationId { conversation_id } => {
                self.session.adopt_conversation(Some(conversation_id));
            }
            StreamEvent::Content { chunk } => {
                let Some(pending) = self.pending.as_mut() else {
                    return Outcome::Applied;
                };
                match pending.streamed {
                    Some(idx) => self.transcript[idx].content.push_str(&sanitize(chunk)),
                    None => {
                        self.transcript.push(ChatMessage::assistant(chunk));
                        pending.streamed = Some(self.transcript.len() - 1);
                    }
                }
            }
            StreamEvent::Complete { response } => {
                if let Some(idx) = self.pending.as_ref().and_then(|p| p.streamed) {
                    self.transcript[idx].content = sanitize(response);
                }
            }
            StreamEvent::Typing { .. } => {}
        }
        Outcome::Applied
    }

    /// Settle the outstanding query.
    pub fn complete(
        &mut self,
        ticket: Ticket,
        result: Result<QueryResponse, ApiError>,
    ) -> Outcome {
        if !self.session.is_current(ticket) {
            warn!("dropping response from a previous chat session");
            return Outcome::Stale;
        }

        let streamed = self.pending.take().and_then(|p| p.streamed);
        match result {
            Ok(response) => {
                match streamed {
                    Some(idx) => self.transcript[idx].content = sanitize(&response.response),
                    None => self.transcript.push(ChatMessage::assistant(&response.response)),
                }
                if self.session.adopt_conversation(response.conversation_id.as_deref()) {
                    debug!(conversation = ?self.session.conversation_id(), "conversation started");
                }
            }
            Err(err) => {
                // A half-streamed answer is replaced by the error entry
                if let Some(idx) = streamed {
                    self.transcript.remove(idx);
                }
                let detail = err.user_message(QUERY_FAILED);
                self.transcript.push(ChatMessage::error(&format!("Error: {detail}")));
            }
        }
        Outcome::Applied
    }

    /// Clear the transcript and the conversation. In-flight queries keep
    /// running but their responses will be reported stale.
    pub fn start_new_chat(&mut self) {
        self.session.reset();
        self.transcript.clear();
        self.pending = None;
    }

    /// Replace the transcript with a stored conversation and continue it.
    pub fn resume(&mut self, history: ConversationHistory) {
        self.start_new_chat();
        self.session.adopt_conversation(Some(&history.conversation_id));
        self.transcript = history
            .messages
            .into_iter()
            .map(|msg| {
                let role = if msg.is_user { ChatRole::User } else { ChatRole::Assistant };
                let timestamp = msg
                    .timestamp
                    .as_deref()
                    .and_then(|ts| NaiveDateTime::parse_from_str(ts, "%Y-%m-%dT%H:%M:%S%.f").ok())
                    .map(|naive| Utc.from_utc_datetime(&naive).with_timezone(&Local))
                    .unwrap_or_else(Local::now);
                ChatMessage::at(role, sanitize(&msg.message), timestamp)
            })
            .collect();
    }
}
