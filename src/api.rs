//! HTTP surface of the bridge
//!
//! The messaging transport posts activities here; a status endpoint exposes
//! the escalation phase.

mod handlers;
mod sse;
mod types;

pub use handlers::create_router;

use crate::runtime::ConversationHandle;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub runtime: ConversationHandle,
}

impl AppState {
    pub fn new(runtime: ConversationHandle) -> Self {
        Self { runtime }
    }
}
