//! Recurring poll of the live-chat backend
//!
//! Each tick reads the actor's latest snapshot, polls the active session and
//! hands whatever arrived back to the actor as a `PollResult`. The poller
//! never touches conversation state itself.

use super::traits::EscalationGateway;
use super::{RuntimeSettings, RuntimeSnapshot};
use crate::gateway::GatewayError;
use crate::state_machine::Event;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

/// What a single tick did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    NoSession,
    MalformedReference,
    PollFailed,
    NoEvents,
    /// Number of events handed to the runtime
    Delivered(usize),
    RuntimeClosed,
    /// Shutdown arrived while waiting for room in the event queue
    Cancelled,
}

pub struct Poller<G> {
    gateway: Arc<G>,
    snapshot_rx: watch::Receiver<RuntimeSnapshot>,
    event_tx: mpsc::Sender<Event>,
    interval: Duration,
    call_timeout: Duration,
    cancel: CancellationToken,
}

impl<G: EscalationGateway + 'static> Poller<G> {
    pub fn new(
        gateway: Arc<G>,
        snapshot_rx: watch::Receiver<RuntimeSnapshot>,
        event_tx: mpsc::Sender<Event>,
        settings: RuntimeSettings,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            gateway,
            snapshot_rx,
            event_tx,
            interval: settings.poll_interval,
            call_timeout: settings.call_timeout,
            cancel,
        }
    }

    pub async fn run(self) {
        // First tick one full period after start
        let mut ticker = tokio::time::interval_at(Instant::now() + self.interval, self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                biased;

                () = self.cancel.cancelled() => break,

                _ = ticker.tick() => {
                    let outcome = self.tick().await;
                    if matches!(outcome, TickOutcome::RuntimeClosed | TickOutcome::Cancelled) {
                        break;
                    }
                }
            }
        }

        tracing::info!("Live chat poller stopped");
    }

    pub async fn tick(&self) -> TickOutcome {
        let active = self.snapshot_rx.borrow().state.active_session();
        let Some(active) = active else {
            return TickOutcome::NoSession;
        };

        let target = match active.reference.decode() {
            Ok(target) => target,
            Err(e) => {
                tracing::warn!(session = %active.session, error = %e, "Skipping poll tick");
                return TickOutcome::MalformedReference;
            }
        };

        let polled = match tokio::time::timeout(self.call_timeout, self.gateway.poll(&active.session)).await {
            Ok(result) => result,
            Err(_) => Err(GatewayError::unavailable("poll timed out")),
        };

        let info = match polled {
            Ok(Some(info)) if info.has_events() => info,
            Ok(_) => return TickOutcome::NoEvents,
            Err(e) => {
                tracing::warn!(session = %active.session, error = %e, "Poll failed, retrying next tick");
                return TickOutcome::PollFailed;
            }
        };

        let count = info.events.len();
        tracing::debug!(session = %active.session, events = count, "Received live chat events");

        let event = Event::PollResult {
            session: active.session,
            target,
            info,
        };
        tokio::select! {
            biased;

            () = self.cancel.cancelled() => TickOutcome::Cancelled,

            sent = self.event_tx.send(event) => match sent {
                Ok(()) => TickOutcome::Delivered(count),
                Err(_) => TickOutcome::RuntimeClosed,
            },
        }
    }
}
