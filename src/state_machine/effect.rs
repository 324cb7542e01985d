//! Effects produced by state transitions

use crate::gateway::SessionHandle;
use crate::session_ref::ConversationReference;
use crate::transcript::TranscriptLine;
use crate::upstream::OutboundReply;

/// Effects to be executed after state transition
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Deliver a message into the upstream conversation
    Send { reply: OutboundReply },

    /// Append a line to the transcript
    AppendTranscript { line: TranscriptLine },

    /// Forward a visitor line to the live agent
    PostLine { session: SessionHandle, text: String },

    /// Ask the gateway for a live chat (answers with `ChatRequested` or
    /// `ChatRequestFailed`)
    RequestChat {
        visitor_name: String,
        reference: ConversationReference,
    },
}

impl Effect {
    pub fn send(
        to: ConversationReference,
        from_name: impl Into<String>,
        text: impl Into<String>,
    ) -> Self {
        Effect::Send {
            reply: OutboundReply::new(to, from_name, text),
        }
    }

    pub fn append(line: TranscriptLine) -> Self {
        Effect::AppendTranscript { line }
    }
}
