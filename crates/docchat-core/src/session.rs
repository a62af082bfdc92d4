//! Session context shared by the chat and upload flows.
//!
//! Holds what used to be page-global state: the conversation identifier and
//! the document the user most recently uploaded. A generation counter tags
//! every outgoing query so responses from a reset session can be dropped.

/// Identifies the session a request was sent from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ticket {
    generation: u64,
}

#[derive(Debug, Default)]
pub struct Session {
    conversation_id: Option<String>,
    active_document: Option<String>,
    generation: u64,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn conversation_id(&self) -> Option<&str> {
        self.conversation_id.as_deref()
    }

    pub fn active_document(&self) -> Option<&str> {
        self.active_document.as_deref()
    }

    pub fn set_active_document(&mut self, id: Option<String>) {
        self.active_document = id;
    }

    pub fn ticket(&self) -> Ticket {
        Ticket { generation: self.generation }
    }

    pub fn is_current(&self, ticket: Ticket) -> bool {
        ticket.generation == self.generation
    }

    /// Take the server's conversation id if it is new or changed.
    /// Returns true when the stored id was updated.
    pub fn adopt_conversation(&mut self, id: Option<&str>) -> bool {
        match id {
            Some(id) if !id.is_empty() && self.conversation_id.as_deref() != Some(id) => {
                self.conversation_id = Some(id.to_string());
                true
            }
            _ => false,
        }
    }

    /// Forget the conversation and document context and invalidate every
    /// outstanding ticket.
    pub fn reset(&mut self) {
        self.conversation_id = None;
        self.active_document = None;
        self.generation = self.generation.wrapping_add(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_adopt_only_new_ids() {
        let mut session = Session::new();
        assert!(session.adopt_conversation(Some("c-1")));
        assert!(!session.adopt_conversation(Some("c-1")));
        assert!(!session.adopt_conversation(None));
        assert!(!session.adopt_conversation(Some("")));
        assert_eq!(session.conversation_id(), Some("c-1"));
        assert!(session.adopt_conversation(Some("c-2")));
        assert_eq!(session.conversation_id(), Some("c-2"));
    }

    #[test]
    fn test_reset_invalidates_tickets() {
        let mut session = Session::new();
        session.adopt_conversation(Some("c-1"));
        session.set_active_document(Some("doc-9".into()));
        let ticket = session.ticket();
        assert!(session.is_current(ticket));

        session.reset();
        assert!(!session.is_current(ticket));
        assert!(session.is_current(session.ticket()));
        assert_eq!(session.conversation_id(), None);
        assert_eq!(session.active_document(), None);
    }
}
