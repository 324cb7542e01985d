//! Pure state transition function
//!
//! Given the same state, context and event this always produces the same new
//! state and effects. All I/O happens in the runtime that executes the effects.

use super::dialog::{self, Route};
use super::state::MAX_CONFIRM_ATTEMPTS;
use super::{ConvContext, ConvState, Effect, EscalationState, Event};
use crate::gateway::{ChatEvent, ChatInfo, ChatState, LineSource};
use crate::session_ref::{ConversationReference, SessionReference};
use crate::transcript::TranscriptLine;
use chrono::{DateTime, Utc};
use thiserror::Error;

/// Result of a state transition
#[derive(Debug)]
pub struct TransitionResult {
    pub new_state: ConvState,
    pub effects: Vec<Effect>,
}

impl TransitionResult {
    pub fn new(state: ConvState) -> Self {
        Self {
            new_state: state,
            effects: vec![],
        }
    }

    pub fn with_effect(mut self, effect: Effect) -> Self {
        self.effects.push(effect);
        self
    }

    pub fn with_effects(mut self, effects: impl IntoIterator<Item = Effect>) -> Self {
        self.effects.extend(effects);
        self
    }
}

/// Errors that can occur during transition
#[derive(Debug, Error)]
pub enum TransitionError {
    #[error("Still waiting for the live chat request to complete")]
    EscalationPending,
    #[error("A live chat session is already active")]
    SessionAlreadyActive,
    #[error("Cannot park reply reference: {0}")]
    InvalidReference(String),
    #[error("Invalid transition: {0}")]
    InvalidTransition(String),
}

/// Pure transition function
pub fn transition(
    state: &ConvState,
    context: &ConvContext,
    event: Event,
) -> Result<TransitionResult, TransitionError> {
    match (&state.phase, event) {
        // ============================================================
        // Escalated: everything the visitor says goes to the agent
        // ============================================================
        (
            EscalationState::Escalating {
                session: Some(session),
                ..
            },
            Event::UserMessage { text, .. },
        ) => Ok(
            TransitionResult::new(state.clone()).with_effect(Effect::PostLine {
                session: session.clone(),
                text,
            }),
        ),

        (EscalationState::Escalating { session: None, .. }, Event::UserMessage { .. }) => {
            Err(TransitionError::EscalationPending)
        }

        // ============================================================
        // Reset confirmation
        // ============================================================
        (
            EscalationState::AwaitingResetConfirm { attempts_left },
            Event::UserMessage {
                text, reference, ..
            },
        ) => Ok(answer_reset_prompt(state, context, *attempts_left, &text, reference)),

        // ============================================================
        // Bot-only handling (Idle, or after a live session ended)
        // ============================================================
        (
            EscalationState::Idle | EscalationState::Ended,
            Event::UserMessage {
                text,
                from_name,
                reference,
                received_at,
            },
        ) => match dialog::route(&text) {
            Route::Reset => Ok(TransitionResult::new(state.with_phase(
                EscalationState::AwaitingResetConfirm {
                    attempts_left: MAX_CONFIRM_ATTEMPTS,
                },
            ))
            .with_effect(Effect::send(
                reference,
                &context.bot_name,
                dialog::RESET_PROMPT,
            ))),

            Route::Escalate => {
                let parked = SessionReference::encode(&reference)
                    .map_err(|e| TransitionError::InvalidReference(e.reason))?;
                Ok(TransitionResult::new(state.with_phase(
                    EscalationState::Escalating {
                        session: None,
                        reference: parked,
                    },
                ))
                .with_effect(Effect::append(TranscriptLine::visitor(
                    &from_name,
                    text,
                    received_at,
                )))
                .with_effect(Effect::send(
                    reference.clone(),
                    &context.bot_name,
                    dialog::ESCALATING,
                ))
                .with_effect(Effect::RequestChat {
                    visitor_name: from_name,
                    reference,
                }))
            }

            Route::Echo => Ok(echo(state, context, &text, from_name, reference, received_at)),
        },

        // ============================================================
        // Chat request outcome
        // ============================================================
        (EscalationState::Escalating { session: None, reference }, Event::ChatRequested { session }) => {
            Ok(TransitionResult::new(state.with_phase(EscalationState::Escalating {
                session: Some(session),
                reference: reference.clone(),
            })))
        }

        (EscalationState::Escalating { session: Some(_), .. }, Event::ChatRequested { .. }) => {
            Err(TransitionError::SessionAlreadyActive)
        }

        (EscalationState::Escalating { session: None, .. }, Event::ChatRequestFailed { reference, .. }) => {
            Ok(TransitionResult::new(state.with_phase(EscalationState::Idle)).with_effect(
                Effect::send(reference, &context.bot_name, dialog::ESCALATION_FAILED),
            ))
        }

        // ============================================================
        // Poll results
        // ============================================================
        (
            EscalationState::Escalating {
                session: Some(current),
                ..
            },
            Event::PollResult {
                session,
                target,
                info,
            },
        ) if *current == session => Ok(apply_chat_info(state, &target, info)),

        // Session changed or ended while the poll was in flight
        (_, Event::PollResult { session, .. }) => {
            tracing::debug!(session = %session, "Ignoring poll result for inactive session");
            Ok(TransitionResult::new(state.clone()))
        }

        (phase, event) => Err(TransitionError::InvalidTransition(format!(
            "{event:?} in state {}",
            phase.type_name()
        ))),
    }
}

fn answer_reset_prompt(
    state: &ConvState,
    context: &ConvContext,
    attempts_left: u32,
    text: &str,
    reference: ConversationReference,
) -> TransitionResult {
    match dialog::parse_confirmation(text) {
        Some(true) => TransitionResult::new(ConvState {
            phase: EscalationState::Idle,
            next_count: 1,
        })
        .with_effect(Effect::send(reference, &context.bot_name, dialog::RESET_DONE)),

        Some(false) => TransitionResult::new(state.with_phase(EscalationState::Idle))
            .with_effect(Effect::send(reference, &context.bot_name, dialog::RESET_DECLINED)),

        None if attempts_left > 1 => TransitionResult::new(state.with_phase(
            EscalationState::AwaitingResetConfirm {
                attempts_left: attempts_left - 1,
            },
        ))
        .with_effect(Effect::send(reference, &context.bot_name, dialog::RETRY_PROMPT)),

        None => TransitionResult::new(state.with_phase(EscalationState::Idle))
            .with_effect(Effect::send(reference, &context.bot_name, dialog::RESET_DECLINED)),
    }
}

fn echo(
    state: &ConvState,
    context: &ConvContext,
    text: &str,
    from_name: String,
    reference: ConversationReference,
    received_at: DateTime<Utc>,
) -> TransitionResult {
    let message = dialog::echo_reply(state.next_count, text);

    TransitionResult::new(ConvState {
        phase: EscalationState::Idle,
        next_count: state.next_count.saturating_add(1),
    })
    .with_effect(Effect::append(TranscriptLine::visitor(
        from_name,
        text,
        received_at,
    )))
    .with_effect(Effect::append(TranscriptLine::bot(
        &context.bot_name,
        message.clone(),
        received_at,
    )))
    .with_effect(Effect::send(reference, &context.bot_name, message))
}

/// Translate one poll's events, in order, into relays and at most one
/// transition to `Ended`
fn apply_chat_info(state: &ConvState, target: &ConversationReference, info: ChatInfo) -> TransitionResult {
    let ChatInfo {
        agent_name,
        state: chat_state,
        events,
    } = info;

    let mut ended = false;
    let mut effects = Vec::new();

    for event in events {
        match event {
            ChatEvent::Line { source, text } => {
                let from_name = match source {
                    LineSource::System => dialog::SYSTEM_SOURCE_NAME,
                    LineSource::Agent => agent_name.as_str(),
                    LineSource::Visitor => continue,
                    LineSource::Unrecognized => {
                        tracing::warn!("Skipping line from unrecognized source");
                        continue;
                    }
                };
                effects.push(Effect::send(target.clone(), from_name, text));
            }
            ChatEvent::State { state: event_state } => match chat_state.or(event_state) {
                Some(ChatState::Ended) => ended = true,
                Some(ChatState::Waiting | ChatState::Chatting) => {}
                Some(ChatState::Unrecognized) | None => {
                    tracing::warn!("Ignoring unrecognized live chat state");
                }
            },
            ChatEvent::Unrecognized => {
                tracing::warn!("Ignoring unrecognized live chat event type");
            }
        }
    }

    let new_state = if ended {
        state.with_phase(EscalationState::Ended)
    } else {
        state.clone()
    };
    TransitionResult::new(new_state).with_effects(effects)
}
