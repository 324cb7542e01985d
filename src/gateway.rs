//! Live-chat gateway
//!
//! Wire types and the HTTP client for the live-chat backend, plus a logging
//! decorator used in production.

mod error;
mod live_assist;
mod types;

pub use error::GatewayError;
pub use live_assist::{LiveAssistClient, LiveAssistConfig};
pub use types::*;

use crate::runtime::EscalationGateway;
use async_trait::async_trait;

/// Logging wrapper for gateway implementations
pub struct LoggingGateway<G> {
    inner: G,
}

impl<G: EscalationGateway> LoggingGateway<G> {
    pub fn new(inner: G) -> Self {
        Self { inner }
    }
}

fn log_failure(call: &str, duration: std::time::Duration, error: &GatewayError) {
    tracing::warn!(
        call,
        duration_ms = %duration.as_millis(),
        error = %error.message,
        retryable = error.kind.is_retryable(),
        "Gateway call failed"
    );
}

#[async_trait]
impl<G: EscalationGateway> EscalationGateway for LoggingGateway<G> {
    async fn request_chat(&self, spec: &ChatSpec) -> Result<SessionHandle, GatewayError> {
        let start = std::time::Instant::now();
        let result = self.inner.request_chat(spec).await;
        let duration = start.elapsed();

        match &result {
            Ok(session) => tracing::info!(
                session = %session,
                skill = %spec.skill,
                transcript_len = spec.transcript.len(),
                duration_ms = %duration.as_millis(),
                "Live chat requested"
            ),
            Err(e) => log_failure("request_chat", duration, e),
        }
        result
    }

    async fn post_line(&self, text: &str, session: &SessionHandle) -> Result<(), GatewayError> {
        let start = std::time::Instant::now();
        let result = self.inner.post_line(text, session).await;
        let duration = start.elapsed();

        match &result {
            Ok(()) => tracing::debug!(
                session = %session,
                duration_ms = %duration.as_millis(),
                "Line posted to live chat"
            ),
            Err(e) => log_failure("post_line", duration, e),
        }
        result
    }

    async fn poll(&self, session: &SessionHandle) -> Result<Option<ChatInfo>, GatewayError> {
        let start = std::time::Instant::now();
        let result = self.inner.poll(session).await;
        let duration = start.elapsed();

        match &result {
            Ok(info) => tracing::trace!(
                session = %session,
                events = info.as_ref().map_or(0, |i| i.events.len()),
                duration_ms = %duration.as_millis(),
                "Polled live chat"
            ),
            Err(e) => log_failure("poll", duration, e),
        }
        result
    }
}
