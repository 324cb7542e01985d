//! Conversation state types

use crate::gateway::SessionHandle;
use crate::session_ref::SessionReference;
use serde::Serialize;

/// Number of answers the reset confirmation accepts before giving up
pub const MAX_CONFIRM_ATTEMPTS: u32 = 3;

/// Where the conversation is in its escalation lifecycle
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EscalationState {
    /// Bot-only handling
    Idle,

    /// A "reset" prompt is waiting for a yes/no answer
    AwaitingResetConfirm { attempts_left: u32 },

    /// Handed over to a live agent. `session` is `None` only while the chat
    /// request is in flight.
    Escalating {
        session: Option<SessionHandle>,
        reference: SessionReference,
    },

    /// The live session ended; routing behaves like `Idle`
    Ended,
}

impl EscalationState {
    pub fn type_name(&self) -> &'static str {
        match self {
            EscalationState::Idle => "idle",
            EscalationState::AwaitingResetConfirm { .. } => "awaiting_reset_confirm",
            EscalationState::Escalating { .. } => "escalating",
            EscalationState::Ended => "ended",
        }
    }
}

/// The session the poller should be watching
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveSession {
    pub session: SessionHandle,
    pub reference: SessionReference,
}

/// Full per-conversation state owned by the runtime
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConvState {
    pub phase: EscalationState,
    /// Number the next echo reply is prefixed with
    pub next_count: u32,
}

impl Default for ConvState {
    fn default() -> Self {
        Self {
            phase: EscalationState::Idle,
            next_count: 1,
        }
    }
}

impl ConvState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_phase(&self, phase: EscalationState) -> Self {
        Self {
            phase,
            next_count: self.next_count,
        }
    }

    pub fn active_session(&self) -> Option<ActiveSession> {
        match &self.phase {
            EscalationState::Escalating {
                session: Some(session),
                reference,
            } => Some(ActiveSession {
                session: session.clone(),
                reference: reference.clone(),
            }),
            _ => None,
        }
    }

    pub fn has_active_session(&self) -> bool {
        matches!(
            self.phase,
            EscalationState::Escalating {
                session: Some(_),
                ..
            }
        )
    }
}

/// Static per-conversation settings
#[derive(Debug, Clone)]
pub struct ConvContext {
    /// Name bot lines carry in the transcript
    pub bot_name: String,
    pub skill: String,
}

impl ConvContext {
    pub fn new(bot_name: impl Into<String>, skill: impl Into<String>) -> Self {
        Self {
            bot_name: bot_name.into(),
            skill: skill.into(),
        }
    }
}
