//! Conversation runtime executor

use super::outbox::Outbox;
use super::poller::Poller;
use super::traits::{EscalationGateway, UpstreamChannel};
use super::{RuntimeChannels, RuntimeEvent, RuntimeSettings, RuntimeSnapshot};

use crate::context_data::ContextDataProvider;
use crate::gateway::{ChatSpec, GatewayError};
use crate::state_machine::{transition, ConvContext, ConvState, Effect, Event, TransitionError};
use crate::transcript::Transcript;
use crate::upstream::OutboundReply;
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Generic conversation runtime that can work with any gateway and upstream implementations
pub struct ConversationRuntime<G, U>
where
    G: EscalationGateway + 'static,
    U: UpstreamChannel + 'static,
{
    context: ConvContext,
    state: ConvState,
    transcript: Transcript,
    gateway: Arc<G>,
    /// Handed to its own task when the runtime starts
    outbox: Option<Outbox<U>>,
    reply_tx: mpsc::UnboundedSender<OutboundReply>,
    context_data: Arc<dyn ContextDataProvider>,
    event_rx: mpsc::Receiver<Event>,
    event_tx: mpsc::Sender<Event>,
    broadcast_tx: broadcast::Sender<RuntimeEvent>,
    snapshot_tx: watch::Sender<RuntimeSnapshot>,
    settings: RuntimeSettings,
    /// Started at the first successful escalation and kept for the process lifetime
    poller: Option<JoinHandle<()>>,
    cancel: CancellationToken,
}

impl<G, U> ConversationRuntime<G, U>
where
    G: EscalationGateway + 'static,
    U: UpstreamChannel + 'static,
{
    pub fn new(
        context: ConvContext,
        gateway: G,
        upstream: U,
        context_data: Arc<dyn ContextDataProvider>,
        channels: RuntimeChannels,
        settings: RuntimeSettings,
        cancel: CancellationToken,
    ) -> Self {
        let RuntimeChannels {
            event_rx,
            event_tx,
            broadcast_tx,
            snapshot_tx,
        } = channels;

        let (outbox, reply_tx) = Outbox::new(
            Arc::new(upstream),
            broadcast_tx.clone(),
            settings.call_timeout,
            cancel.child_token(),
        );

        Self {
            context,
            state: ConvState::new(),
            transcript: Transcript::new(),
            gateway: Arc::new(gateway),
            outbox: Some(outbox),
            reply_tx,
            context_data,
            event_rx,
            event_tx,
            broadcast_tx,
            snapshot_tx,
            settings,
            poller: None,
            cancel,
        }
    }

    pub async fn run(mut self) {
        tracing::info!(bot = %self.context.bot_name, skill = %self.context.skill, "Starting conversation runtime");
        self.publish_snapshot();
        let outbox = self.outbox.take().map(|outbox| tokio::spawn(outbox.run()));

        loop {
            tokio::select! {
                biased;

                () = self.cancel.cancelled() => break,

                Some(event) = self.event_rx.recv() => {
                    if let Err(e) = self.process_event(event).await {
                        tracing::warn!(error = %e, state = self.state.phase.type_name(), "Event refused");
                        let _ = self.broadcast_tx.send(RuntimeEvent::Error {
                            message: e.to_string(),
                        });
                    }
                }
            }
        }

        // Nothing reads the queue any more; a poller blocked on a full queue fails fast
        self.event_rx.close();

        // Both tasks watch children of our token, so they are already stopping
        if let Some(poller) = self.poller.take() {
            let _ = poller.await;
        }
        if let Some(outbox) = outbox {
            let _ = outbox.await;
        }

        tracing::info!("Conversation runtime stopped");
    }

    async fn process_event(&mut self, event: Event) -> Result<(), TransitionError> {
        // Effects may produce follow-up events; handle them before the next inbound one
        let mut events_to_process = vec![event];

        while let Some(current_event) = events_to_process.pop() {
            let result = transition(&self.state, &self.context, current_event)?;

            let old_state = std::mem::replace(&mut self.state, result.new_state);
            if old_state.phase != self.state.phase {
                tracing::info!(
                    from = old_state.phase.type_name(),
                    to = self.state.phase.type_name(),
                    "Escalation state changed"
                );
                let state_json = serde_json::to_value(&self.state.phase).unwrap_or(Value::Null);
                let _ = self
                    .broadcast_tx
                    .send(RuntimeEvent::StateChange { state: state_json });
            }

            for effect in result.effects {
                if let Some(generated_event) = self.execute_effect(effect).await {
                    events_to_process.push(generated_event);
                }
            }

            self.publish_snapshot();
        }

        Ok(())
    }

    fn publish_snapshot(&self) {
        self.snapshot_tx.send_replace(RuntimeSnapshot {
            state: self.state.clone(),
            transcript_len: self.transcript.len(),
        });
    }

    /// Execute an effect and optionally return a generated event
    async fn execute_effect(&mut self, effect: Effect) -> Option<Event> {
        match effect {
            Effect::Send { reply } => {
                if let Err(e) = self.reply_tx.send(reply) {
                    tracing::warn!(from = %e.0.from_name, "Outbox closed, dropping reply");
                }
                None
            }

            Effect::AppendTranscript { line } => {
                self.transcript.append(line);
                None
            }

            Effect::PostLine { session, text } => {
                let posted = tokio::time::timeout(
                    self.settings.call_timeout,
                    self.gateway.post_line(&text, &session),
                )
                .await;
                match posted {
                    Ok(Ok(())) => {}
                    Ok(Err(e)) => {
                        tracing::warn!(session = %session, error = %e, "Failed to forward line to agent");
                    }
                    Err(_) => {
                        tracing::warn!(session = %session, "Timed out forwarding line to agent");
                    }
                }
                None
            }

            Effect::RequestChat {
                visitor_name,
                reference,
            } => {
                let spec = ChatSpec {
                    skill: self.context.skill.clone(),
                    transcript: self.transcript.snapshot(),
                    visitor_name,
                    context_data: Arc::clone(&self.context_data),
                };

                let outcome = match tokio::time::timeout(
                    self.settings.call_timeout,
                    self.gateway.request_chat(&spec),
                )
                .await
                {
                    Ok(result) => result,
                    Err(_) => Err(GatewayError::unavailable("chat request timed out")),
                };

                match outcome {
                    Ok(session) => {
                        self.ensure_poller();
                        Some(Event::ChatRequested { session })
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, "Escalation failed");
                        Some(Event::ChatRequestFailed {
                            reference,
                            message: e.to_string(),
                        })
                    }
                }
            }
        }
    }

    /// Start the shared poll timer unless an earlier escalation already did
    fn ensure_poller(&mut self) {
        if self.poller.is_some() {
            return;
        }

        tracing::info!(
            interval_ms = %self.settings.poll_interval.as_millis(),
            "Starting live chat poller"
        );
        let poller = Poller::new(
            Arc::clone(&self.gateway),
            self.snapshot_tx.subscribe(),
            self.event_tx.clone(),
            self.settings,
            self.cancel.child_token(),
        );
        self.poller = Some(tokio::spawn(poller.run()));
    }
}
