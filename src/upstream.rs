//! Upstream messaging channel
//!
//! Outbound replies into the bot-side conversation, addressed through a
//! [`ConversationReference`].

use crate::runtime::UpstreamChannel;
use crate::session_ref::{ChannelAccount, ConversationReference};
use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use std::time::Duration;
use thiserror::Error;

/// A message to deliver into the upstream conversation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutboundReply {
    pub to: ConversationReference,
    /// Display name the reply appears under
    pub from_name: String,
    pub text: String,
}

impl OutboundReply {
    pub fn new(
        to: ConversationReference,
        from_name: impl Into<String>,
        text: impl Into<String>,
    ) -> Self {
        Self {
            to,
            from_name: from_name.into(),
            text: text.into(),
        }
    }
}

#[derive(Debug, Error)]
pub enum UpstreamError {
    #[error("upstream channel unreachable: {0}")]
    Transport(String),
    #[error("upstream channel returned {status}")]
    Status { status: u16 },
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ConversationAccount<'a> {
    id: &'a str,
}

/// Reply activity in the messaging transport's format
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ReplyActivity<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    channel_id: &'a str,
    from: ChannelAccount,
    recipient: &'a ChannelAccount,
    conversation: ConversationAccount<'a>,
    text: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    reply_to_id: Option<&'a str>,
}

impl<'a> ReplyActivity<'a> {
    fn from_reply(reply: &'a OutboundReply) -> Self {
        Self {
            kind: "message",
            channel_id: &reply.to.channel_id,
            from: ChannelAccount::new(reply.to.bot.id.clone(), reply.from_name.clone()),
            recipient: &reply.to.user,
            conversation: ConversationAccount {
                id: &reply.to.conversation_id,
            },
            text: &reply.text,
            reply_to_id: reply.to.activity_id.as_deref(),
        }
    }
}

/// Posts replies to the messaging transport's connector REST API
pub struct ConnectorClient {
    client: Client,
    bearer_token: Option<String>,
}

impl ConnectorClient {
    pub fn new(bearer_token: Option<String>, timeout: Duration) -> Result<Self, UpstreamError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| UpstreamError::Transport(e.to_string()))?;
        Ok(Self {
            client,
            bearer_token,
        })
    }
}

/// Reply-to-activity when we know the activity, send-to-conversation otherwise
fn activities_url(to: &ConversationReference) -> String {
    let base = format!(
        "{}/v3/conversations/{}/activities",
        to.service_url.trim_end_matches('/'),
        to.conversation_id
    );
    match &to.activity_id {
        Some(activity_id) => format!("{base}/{activity_id}"),
        None => base,
    }
}

#[async_trait]
impl UpstreamChannel for ConnectorClient {
    async fn send(&self, reply: &OutboundReply) -> Result<(), UpstreamError> {
        let mut request = self
            .client
            .post(activities_url(&reply.to))
            .json(&ReplyActivity::from_reply(reply));
        if let Some(token) = &self.bearer_token {
            request = request.bearer_auth(token);
        }

        let response = request
            .send()
            .await
            .map_err(|e| UpstreamError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(UpstreamError::Status {
                status: status.as_u16(),
            });
        }
        Ok(())
    }
}
