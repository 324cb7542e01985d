//! API request and response types

use crate::session_ref::{ChannelAccount, ConversationReference};
use serde::{Deserialize, Serialize};

/// Account as the messaging transport sends it
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ActivityAccount {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
}

impl From<ActivityAccount> for ChannelAccount {
    fn from(account: ActivityAccount) -> Self {
        ChannelAccount::new(account.id, account.name)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ActivityConversation {
    pub id: String,
}

/// Inbound activity from the messaging transport
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Activity {
    #[serde(rename = "type")]
    pub activity_type: String,
    #[serde(default)]
    pub id: Option<String>,
    /// Null and missing text are both treated as empty
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub from: ActivityAccount,
    #[serde(default)]
    pub recipient: ActivityAccount,
    pub conversation: ActivityConversation,
    pub channel_id: String,
    pub service_url: String,
}

impl Activity {
    pub fn is_message(&self) -> bool {
        self.activity_type.eq_ignore_ascii_case("message")
    }

    /// Where replies to this activity go
    pub fn conversation_reference(&self) -> ConversationReference {
        ConversationReference {
            service_url: self.service_url.clone(),
            channel_id: self.channel_id.clone(),
            conversation_id: self.conversation.id.clone(),
            user: self.from.clone().into(),
            bot: self.recipient.clone().into(),
            activity_id: self.id.clone(),
        }
    }

    /// Display name of the sender, falling back to its id
    pub fn sender_name(&self) -> &str {
        if self.from.name.is_empty() {
            &self.from.id
        } else {
            &self.from.name
        }
    }
}

/// Response for an accepted activity
#[derive(Debug, Serialize)]
pub struct AcceptedResponse {
    pub queued: bool,
}

/// Current escalation status
#[derive(Debug, Serialize)]
pub struct StatusResponse {
    /// Full phase as JSON object (e.g., `{"type":"idle"}`)
    pub phase: serde_json::Value,
    pub session_active: bool,
    pub next_count: u32,
    pub transcript_len: usize,
}

/// Error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            error: message.into(),
        }
    }
}
