//! Trait abstractions for runtime I/O
//!
//! These traits enable testing the executor and poller with mock implementations.

use crate::gateway::{ChatInfo, ChatSpec, GatewayError, SessionHandle};
use crate::upstream::{OutboundReply, UpstreamError};
use async_trait::async_trait;
use std::sync::Arc;

/// Live-chat backend the conversation escalates to
#[async_trait]
pub trait EscalationGateway: Send + Sync {
    /// Open a live chat, handing over the transcript so far
    async fn request_chat(&self, spec: &ChatSpec) -> Result<SessionHandle, GatewayError>;

    /// Forward one visitor line to the agent
    async fn post_line(&self, text: &str, session: &SessionHandle) -> Result<(), GatewayError>;

    /// Fetch whatever happened since the last poll; `None` when nothing did
    async fn poll(&self, session: &SessionHandle) -> Result<Option<ChatInfo>, GatewayError>;
}

/// The conversation channel replies are delivered into
#[async_trait]
pub trait UpstreamChannel: Send + Sync {
    async fn send(&self, reply: &OutboundReply) -> Result<(), UpstreamError>;
}

// ============================================================================
// Arc implementations for trait objects
// ============================================================================

#[async_trait]
impl<T: EscalationGateway + ?Sized> EscalationGateway for Arc<T> {
    async fn request_chat(&self, spec: &ChatSpec) -> Result<SessionHandle, GatewayError> {
        (**self).request_chat(spec).await
    }

    async fn post_line(&self, text: &str, session: &SessionHandle) -> Result<(), GatewayError> {
        (**self).post_line(text, session).await
    }

    async fn poll(&self, session: &SessionHandle) -> Result<Option<ChatInfo>, GatewayError> {
        (**self).poll(session).await
    }
}

#[async_trait]
impl<T: UpstreamChannel + ?Sized> UpstreamChannel for Arc<T> {
    async fn send(&self, reply: &OutboundReply) -> Result<(), UpstreamError> {
        (**self).send(reply).await
    }
}
