//! Ordered delivery of replies to the upstream conversation
//!
//! The actor queues replies here and moves on; a single task delivers them
//! one after another, so a slow upstream never holds up inbound traffic.

use super::traits::UpstreamChannel;
use super::RuntimeEvent;
use crate::upstream::OutboundReply;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, mpsc};
use tokio_util::sync::CancellationToken;

pub struct Outbox<U> {
    upstream: Arc<U>,
    reply_rx: mpsc::UnboundedReceiver<OutboundReply>,
    broadcast_tx: broadcast::Sender<RuntimeEvent>,
    call_timeout: Duration,
    cancel: CancellationToken,
}

impl<U: UpstreamChannel + 'static> Outbox<U> {
    pub fn new(
        upstream: Arc<U>,
        broadcast_tx: broadcast::Sender<RuntimeEvent>,
        call_timeout: Duration,
        cancel: CancellationToken,
    ) -> (Self, mpsc::UnboundedSender<OutboundReply>) {
        let (reply_tx, reply_rx) = mpsc::unbounded_channel();
        let outbox = Self {
            upstream,
            reply_rx,
            broadcast_tx,
            call_timeout,
            cancel,
        };
        (outbox, reply_tx)
    }

    pub async fn run(mut self) {
        loop {
            let reply = tokio::select! {
                biased;

                () = self.cancel.cancelled() => break,

                reply = self.reply_rx.recv() => match reply {
                    Some(reply) => reply,
                    None => break,
                },
            };

            tokio::select! {
                biased;

                () = self.cancel.cancelled() => break,

                () = self.deliver(reply) => {}
            }
        }

        let pending = self.reply_rx.len();
        if pending > 0 {
            tracing::warn!(pending, "Dropping undelivered replies on shutdown");
        }
        tracing::info!("Outbox stopped");
    }

    async fn deliver(&self, reply: OutboundReply) {
        match tokio::time::timeout(self.call_timeout, self.upstream.send(&reply)).await {
            Ok(Ok(())) => {
                tracing::debug!(from = %reply.from_name, "Reply delivered");
                let _ = self.broadcast_tx.send(RuntimeEvent::Outbound { reply });
            }
            Ok(Err(e)) => {
                tracing::warn!(error = %e, from = %reply.from_name, "Failed to deliver reply");
            }
            Err(_) => {
                tracing::warn!(from = %reply.from_name, "Timed out delivering reply");
            }
        }
    }
}
