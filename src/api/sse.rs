//! Server-Sent Events feed of runtime notifications

use crate::runtime::{RuntimeEvent, RuntimeSnapshot};
use axum::response::sse::{Event, KeepAlive, Sse};
use futures::stream::Stream;
use serde_json::{json, Value};
use std::convert::Infallible;
use std::time::Duration;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::StreamExt;

/// Current snapshot first, then every broadcast as it happens
pub fn sse_stream(
    snapshot: RuntimeSnapshot,
    broadcast_rx: tokio::sync::broadcast::Receiver<RuntimeEvent>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let init = futures::stream::once(async move { Ok(init_event(&snapshot)) });

    let broadcasts = BroadcastStream::new(broadcast_rx).filter_map(|result| match result {
        Ok(event) => Some(Ok(runtime_event_to_axum(event))),
        Err(_) => None, // Skip lagged messages
    });

    Sse::new(init.chain(broadcasts)).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("ping"),
    )
}

fn init_event(snapshot: &RuntimeSnapshot) -> Event {
    let data = json!({
        "type": "init",
        "state": serde_json::to_value(&snapshot.state.phase).unwrap_or(Value::Null),
        "session_active": snapshot.state.has_active_session(),
        "transcript_len": snapshot.transcript_len,
    });
    Event::default().event("init").data(data.to_string())
}

fn runtime_event_to_axum(event: RuntimeEvent) -> Event {
    let (event_type, data) = event_payload(event);
    Event::default().event(event_type).data(data.to_string())
}

fn event_payload(event: RuntimeEvent) -> (&'static str, Value) {
    match event {
        RuntimeEvent::StateChange { state } => (
            "state_change",
            json!({
                "type": "state_change",
                "state": state
            }),
        ),
        RuntimeEvent::Outbound { reply } => (
            "outbound",
            json!({
                "type": "outbound",
                "from": reply.from_name,
                "text": reply.text,
                "conversation_id": reply.to.conversation_id,
            }),
        ),
        RuntimeEvent::Error { message } => (
            "error",
            json!({
                "type": "error",
                "message": message
            }),
        ),
    }
}
