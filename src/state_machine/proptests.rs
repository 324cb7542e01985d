//! Property-based tests for the state machine
//!
//! These tests verify key invariants hold across arbitrary message sequences.

use super::dialog::{self, Route};
use super::state::*;
use super::transition::*;
use super::*;
use crate::gateway::{ChatEvent, ChatInfo, ChatState, LineSource, SessionHandle};
use crate::session_ref::{ChannelAccount, ConversationReference, SessionReference};
use proptest::prelude::*;

// ============================================================================
// Test Helpers
// ============================================================================

fn test_context() -> ConvContext {
    ConvContext::new("EscalationBot", "MySkill")
}

fn test_reference() -> ConversationReference {
    ConversationReference {
        service_url: "https://connector.example.com".to_string(),
        channel_id: "webchat".to_string(),
        conversation_id: "conv-1".to_string(),
        user: ChannelAccount::new("user-1", "Sid"),
        bot: ChannelAccount::new("bot-1", "EscalationBot"),
        activity_id: None,
    }
}

fn escalated_state(session: &str) -> ConvState {
    ConvState::new().with_phase(EscalationState::Escalating {
        session: Some(SessionHandle::new(session)),
        reference: SessionReference::encode(&test_reference()).unwrap(),
    })
}

fn count_appends(effects: &[Effect]) -> usize {
    effects
        .iter()
        .filter(|e| matches!(e, Effect::AppendTranscript { .. }))
        .count()
}

fn count_sends(effects: &[Effect]) -> usize {
    effects
        .iter()
        .filter(|e| matches!(e, Effect::Send { .. }))
        .count()
}

// ============================================================================
// Arbitrary Generators
// ============================================================================

/// Text that never routes to reset or escalation
fn arb_echo_text() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9 ]{0,30}".prop_filter("must route to echo", |t| {
        dialog::route(t) == Route::Echo
    })
}

fn arb_message_text() -> impl Strategy<Value = String> {
    prop_oneof![
        4 => arb_echo_text(),
        1 => Just("reset".to_string()),
        1 => Just("yes".to_string()),
        1 => Just("no".to_string()),
        1 => "[a-z ]{0,10}help[a-z ]{0,10}",
    ]
}

fn arb_line_source() -> impl Strategy<Value = LineSource> {
    prop_oneof![
        Just(LineSource::System),
        Just(LineSource::Agent),
        Just(LineSource::Visitor),
        Just(LineSource::Unrecognized),
    ]
}

fn arb_chat_state() -> impl Strategy<Value = ChatState> {
    prop_oneof![
        Just(ChatState::Waiting),
        Just(ChatState::Chatting),
        Just(ChatState::Ended),
        Just(ChatState::Unrecognized),
    ]
}

fn arb_chat_event() -> impl Strategy<Value = ChatEvent> {
    prop_oneof![
        (arb_line_source(), "[a-zA-Z ]{0,20}")
            .prop_map(|(source, text)| ChatEvent::line(source, text)),
        arb_chat_state().prop_map(ChatEvent::state),
        Just(ChatEvent::Unrecognized),
    ]
}

fn arb_chat_info() -> impl Strategy<Value = ChatInfo> {
    (
        "[A-Z][a-z]{2,8}",
        proptest::option::of(arb_chat_state()),
        proptest::collection::vec(arb_chat_event(), 0..6),
    )
        .prop_map(|(agent_name, state, events)| ChatInfo {
            agent_name,
            state,
            events,
        })
}

/// Anything the actor can be fed, including gateway outcomes
fn arb_event() -> impl Strategy<Value = Event> {
    prop_oneof![
        4 => arb_message_text().prop_map(|text| Event::user_message(text, "Sid", test_reference())),
        1 => "[a-z0-9]{4}".prop_map(|id| Event::ChatRequested {
            session: SessionHandle::new(id),
        }),
        1 => Just(Event::ChatRequestFailed {
            reference: test_reference(),
            message: "unavailable".to_string(),
        }),
        1 => ("[a-z0-9]{4}", arb_chat_info()).prop_map(|(id, info)| Event::PollResult {
            session: SessionHandle::new(id),
            target: test_reference(),
            info,
        }),
    ]
}

// ============================================================================
// Property Tests
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    /// Echo replies number 1, 2, 3... with no gaps while nothing resets
    #[test]
    fn prop_echo_counter_is_sequential(texts in proptest::collection::vec(arb_echo_text(), 1..20)) {
        let ctx = test_context();
        let mut state = ConvState::new();

        for (i, text) in texts.iter().enumerate() {
            let result = transition(&state, &ctx, Event::user_message(text.clone(), "Sid", test_reference())).unwrap();
            let expected = dialog::echo_reply(u32::try_from(i + 1).unwrap(), text);
            let sent: Vec<_> = result.effects.iter().filter_map(|e| match e {
                Effect::Send { reply } => Some(reply.text.clone()),
                _ => None,
            }).collect();
            prop_assert_eq!(sent, vec![expected]);
            state = result.new_state;
        }
    }

    /// Every transition leaves at most one session handle, and a handle only
    /// ever appears while escalating
    #[test]
    fn prop_at_most_one_session(events in proptest::collection::vec(arb_event(), 0..30)) {
        let ctx = test_context();
        let mut state = ConvState::new();

        for event in events {
            let had_session = state.active_session();
            match transition(&state, &ctx, event) {
                Ok(result) => {
                    if let (Some(before), Some(after)) = (&had_session, result.new_state.active_session()) {
                        prop_assert_eq!(&before.session, &after.session, "session replaced while active");
                    }
                    state = result.new_state;
                }
                Err(_) => {
                    // Rejected events leave the state untouched
                }
            }
        }
    }

    /// Only non-escalated traffic reaches the transcript: each echo appends
    /// two lines, each help request one, nothing else any
    #[test]
    fn prop_transcript_tracks_bot_traffic(events in proptest::collection::vec(arb_event(), 0..30)) {
        let ctx = test_context();
        let mut state = ConvState::new();

        for event in events {
            let routed = match (&state.phase, &event) {
                (EscalationState::Idle | EscalationState::Ended, Event::UserMessage { text, .. }) => {
                    Some(dialog::route(text))
                }
                _ => None,
            };
            if let Ok(result) = transition(&state, &ctx, event) {
                let expected = match routed {
                    Some(Route::Echo) => 2,
                    Some(Route::Escalate) => 1,
                    Some(Route::Reset) | None => 0,
                };
                prop_assert_eq!(count_appends(&result.effects), expected);
                state = result.new_state;
            }
        }
    }

    /// Escalated messages are forwarded verbatim and never answered locally
    #[test]
    fn prop_escalated_messages_only_forward(text in "[a-zA-Z ]{0,30}") {
        let state = escalated_state("chat-1");
        let result = transition(&state, &test_context(), Event::user_message(text.clone(), "Sid", test_reference())).unwrap();

        prop_assert_eq!(&result.new_state, &state);
        prop_assert_eq!(result.effects, vec![Effect::PostLine {
            session: SessionHandle::new("chat-1"),
            text,
        }]);
    }

    /// Replaying the same poll result relays the same lines again
    #[test]
    fn prop_poll_results_are_not_deduplicated(info in arb_chat_info()) {
        let ctx = test_context();
        let state = escalated_state("chat-1");
        let poll = || Event::PollResult {
            session: SessionHandle::new("chat-1"),
            target: test_reference(),
            info: info.clone(),
        };

        let first = transition(&state, &ctx, poll()).unwrap();
        if first.new_state.has_active_session() {
            let second = transition(&first.new_state, &ctx, poll()).unwrap();
            prop_assert_eq!(count_sends(&first.effects), count_sends(&second.effects));
        }
    }

    /// A poll result for any other session changes nothing
    #[test]
    fn prop_stale_poll_is_noop(info in arb_chat_info()) {
        let state = escalated_state("chat-2");
        let result = transition(&state, &test_context(), Event::PollResult {
            session: SessionHandle::new("chat-1"),
            target: test_reference(),
            info,
        }).unwrap();

        prop_assert_eq!(result.new_state, state);
        prop_assert!(result.effects.is_empty());
    }

    /// The confirm prompt always resolves back to Idle within the attempt limit
    #[test]
    fn prop_reset_prompt_terminates(answers in proptest::collection::vec("[a-z]{0,6}", 0..10)) {
        let ctx = test_context();
        let mut state = transition(&ConvState::new(), &ctx, Event::user_message("reset", "Sid", test_reference()))
            .unwrap()
            .new_state;

        for (i, answer) in answers.iter().enumerate() {
            if state.phase == EscalationState::Idle {
                break;
            }
            prop_assert!(u32::try_from(i).unwrap() < MAX_CONFIRM_ATTEMPTS);
            state = transition(&state, &ctx, Event::user_message(answer.clone(), "Sid", test_reference()))
                .unwrap()
                .new_state;
        }
    }
}
