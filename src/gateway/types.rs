//! Common types for live-chat gateway interactions

use crate::context_data::ContextDataProvider;
use crate::transcript::TranscriptLine;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Opaque identifier of an active live-chat session (the gateway's chat context)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionHandle(String);

impl SessionHandle {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Escalation request, built once per escalation
#[derive(Clone)]
pub struct ChatSpec {
    /// Agent skill group to route the chat to
    pub skill: String,
    pub transcript: Vec<TranscriptLine>,
    pub visitor_name: String,
    pub context_data: Arc<dyn ContextDataProvider>,
}

impl fmt::Debug for ChatSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChatSpec")
            .field("skill", &self.skill)
            .field("transcript_len", &self.transcript.len())
            .field("visitor_name", &self.visitor_name)
            .finish_non_exhaustive()
    }
}

/// Who wrote a relayed line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LineSource {
    System,
    Agent,
    Visitor,
    #[serde(other)]
    Unrecognized,
}

/// Live-chat session state as reported by the gateway
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatState {
    Waiting,
    Chatting,
    Ended,
    #[serde(other)]
    Unrecognized,
}

/// A single event reported by a poll
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ChatEvent {
    Line {
        source: LineSource,
        #[serde(default)]
        text: String,
    },
    State {
        #[serde(default)]
        state: Option<ChatState>,
    },
    #[serde(other)]
    Unrecognized,
}

#[cfg(test)]
impl ChatEvent {
    pub fn line(source: LineSource, text: impl Into<String>) -> Self {
        ChatEvent::Line {
            source,
            text: text.into(),
        }
    }

    pub fn state(state: ChatState) -> Self {
        ChatEvent::State { state: Some(state) }
    }
}

/// Result of one poll: events that arrived since the previous poll
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatInfo {
    #[serde(default)]
    pub agent_name: String,
    #[serde(default)]
    pub state: Option<ChatState>,
    #[serde(default, rename = "chatEvents", alias = "events")]
    pub events: Vec<ChatEvent>,
}

impl ChatInfo {
    pub fn has_events(&self) -> bool {
        !self.events.is_empty()
    }
}
