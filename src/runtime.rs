//! Runtime for the bridged conversation
//!
//! A single actor owns the conversation state. Inbound messages and poll
//! results both arrive on its event channel, so every transition is
//! serialized. The poller only ever reads the published snapshot, and replies
//! leave through an outbox task so slow deliveries never stall the actor.

mod executor;
mod outbox;
mod poller;
pub mod traits;


pub use executor::ConversationRuntime;
pub use traits::*;

use crate::context_data::ContextDataProvider;
use crate::state_machine::{ConvContext, ConvState, Event};
use crate::upstream::OutboundReply;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::{broadcast, mpsc, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Timing for gateway and upstream calls
#[derive(Debug, Clone, Copy)]
pub struct RuntimeSettings {
    /// Period between poll ticks
    pub poll_interval: Duration,
    /// Upper bound on any single gateway or upstream call
    pub call_timeout: Duration,
}

/// What the actor publishes after every transition
#[derive(Debug, Clone, Default)]
pub struct RuntimeSnapshot {
    pub state: ConvState,
    pub transcript_len: usize,
}

/// Notifications fanned out to observers (the SSE feed, tests)
#[derive(Debug, Clone)]
pub enum RuntimeEvent {
    StateChange {
        /// Full phase as JSON object (e.g., `{"type":"escalating",...}`)
        state: serde_json::Value,
    },
    /// A reply was delivered upstream
    Outbound { reply: OutboundReply },
    Error { message: String },
}

#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("Conversation runtime is not running")]
    Closed,
}

/// Handle to interact with the running conversation
#[derive(Clone)]
pub struct ConversationHandle {
    pub event_tx: mpsc::Sender<Event>,
    pub broadcast_tx: broadcast::Sender<RuntimeEvent>,
    snapshot_rx: watch::Receiver<RuntimeSnapshot>,
}

impl ConversationHandle {
    pub async fn send_event(&self, event: Event) -> Result<(), RuntimeError> {
        self.event_tx
            .send(event)
            .await
            .map_err(|_| RuntimeError::Closed)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<RuntimeEvent> {
        self.broadcast_tx.subscribe()
    }

    pub fn snapshot(&self) -> RuntimeSnapshot {
        self.snapshot_rx.borrow().clone()
    }
}

/// Channels shared between the actor and everything that talks to it
pub struct RuntimeChannels {
    pub event_rx: mpsc::Receiver<Event>,
    pub event_tx: mpsc::Sender<Event>,
    pub broadcast_tx: broadcast::Sender<RuntimeEvent>,
    pub snapshot_tx: watch::Sender<RuntimeSnapshot>,
}

impl RuntimeChannels {
    pub fn open() -> (Self, ConversationHandle) {
        let (event_tx, event_rx) = mpsc::channel(32);
        let (broadcast_tx, _) = broadcast::channel(128);
        let (snapshot_tx, snapshot_rx) = watch::channel(RuntimeSnapshot::default());

        let handle = ConversationHandle {
            event_tx: event_tx.clone(),
            broadcast_tx: broadcast_tx.clone(),
            snapshot_rx,
        };
        let channels = Self {
            event_rx,
            event_tx,
            broadcast_tx,
            snapshot_tx,
        };
        (channels, handle)
    }
}

/// Build the runtime, spawn it and return a handle plus its join handle
pub fn spawn<G, U>(
    context: ConvContext,
    gateway: G,
    upstream: U,
    context_data: Arc<dyn ContextDataProvider>,
    settings: RuntimeSettings,
    cancel: CancellationToken,
) -> (ConversationHandle, JoinHandle<()>)
where
    G: EscalationGateway + 'static,
    U: UpstreamChannel + 'static,
{
    let (channels, handle) = RuntimeChannels::open();
    let runtime = ConversationRuntime::new(
        context,
        gateway,
        upstream,
        context_data,
        channels,
        settings,
        cancel,
    );

    let task = tokio::spawn(async move {
        runtime.run().await;
        tracing::info!("Conversation runtime finished");
    });
    (handle, task)
}
