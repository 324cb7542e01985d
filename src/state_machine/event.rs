//! Events that can occur in a conversation

use crate::gateway::{ChatInfo, SessionHandle};
use crate::session_ref::ConversationReference;
use chrono::{DateTime, Utc};

/// Events that trigger state transitions
#[derive(Debug, Clone)]
pub enum Event {
    // Upstream events
    UserMessage {
        text: String,
        /// Sender display name
        from_name: String,
        /// Where replies to this message go
        reference: ConversationReference,
        received_at: DateTime<Utc>,
    },

    // Gateway events
    ChatRequested {
        session: SessionHandle,
    },
    ChatRequestFailed {
        reference: ConversationReference,
        message: String,
    },

    // Poller events
    PollResult {
        session: SessionHandle,
        /// Reply target decoded from the parked session reference
        target: ConversationReference,
        info: ChatInfo,
    },
}

impl Event {
    pub fn user_message(
        text: impl Into<String>,
        from_name: impl Into<String>,
        reference: ConversationReference,
    ) -> Self {
        Event::UserMessage {
            text: text.into(),
            from_name: from_name.into(),
            reference,
            received_at: Utc::now(),
        }
    }
}
