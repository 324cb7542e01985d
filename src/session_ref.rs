//! Session reference codec
//!
//! A [`ConversationReference`] describes where replies into the upstream
//! conversation go. It is captured when a conversation escalates, parked as an
//! opaque [`SessionReference`] string for the lifetime of the live session, and
//! decoded again on every poll tick to address relayed lines.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// A participant on the upstream channel
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelAccount {
    pub id: String,
    #[serde(default)]
    pub name: String,
}

impl ChannelAccount {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

/// Addressing information for one upstream conversation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationReference {
    pub service_url: String,
    pub channel_id: String,
    pub conversation_id: String,
    /// The end user talking to the bot
    pub user: ChannelAccount,
    /// The bot's own account on the channel
    pub bot: ChannelAccount,
    /// Activity that replies are threaded under
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub activity_id: Option<String>,
}

/// Returned when a parked reference cannot be turned back into a reply target
#[derive(Debug, Error)]
#[error("malformed session reference: {reason}")]
pub struct MalformedSessionReference {
    pub reason: String,
}

/// Serialized form of a [`ConversationReference`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionReference(String);

impl SessionReference {
    pub fn encode(reference: &ConversationReference) -> Result<Self, MalformedSessionReference> {
        serde_json::to_string(reference)
            .map(Self)
            .map_err(|e| MalformedSessionReference {
                reason: e.to_string(),
            })
    }

    pub fn decode(&self) -> Result<ConversationReference, MalformedSessionReference> {
        serde_json::from_str(&self.0).map_err(|e| MalformedSessionReference {
            reason: e.to_string(),
        })
    }

    /// Wrap an already-encoded string (e.g. one read back from elsewhere)
    #[cfg(test)]
    pub fn from_encoded(encoded: impl Into<String>) -> Self {
        Self(encoded.into())
    }

    #[cfg(test)]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
