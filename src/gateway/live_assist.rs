//! Live Assist REST client
//!
//! Talks to the live-chat backend for one account:
//!
//! - `POST {host}/api/v1/accounts/{account}/chats` requests a chat
//! - `POST {host}/api/v1/accounts/{account}/chats/{chat}/lines` posts a visitor line
//! - `GET  {host}/api/v1/accounts/{account}/chats/{chat}/events` returns events since
//!   the previous call, or `204 No Content` when there is nothing new

use super::{ChatInfo, ChatSpec, GatewayError, SessionHandle};
use crate::runtime::EscalationGateway;
use crate::transcript::TranscriptLine;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ChatRequestBody<'a> {
    skill: &'a str,
    visitor_name: &'a str,
    transcript: &'a [TranscriptLine],
    context_id: String,
    /// Signed visitor context, fetched by the agent console
    context_data: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChatRequestResponse {
    chat_context: String,
}

#[derive(Debug, Serialize)]
struct PostLineBody<'a> {
    text: &'a str,
}

/// Live Assist connection settings (the SDK configuration)
#[derive(Debug, Clone)]
pub struct LiveAssistConfig {
    pub account_number: String,
    /// Base URL of the chat API, e.g. `https://sandbox.example.com`
    pub host: String,
    /// Host of the context data service, when it differs from `host`
    pub context_data_host: Option<String>,
    pub request_timeout: Duration,
}

/// HTTP implementation of [`EscalationGateway`]
pub struct LiveAssistClient {
    client: Client,
    chats_url: String,
    context_data_host: Option<String>,
}

impl LiveAssistClient {
    pub fn new(config: &LiveAssistConfig) -> Result<Self, GatewayError> {
        let client = Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| GatewayError::unavailable(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            chats_url: chats_url(&config.host, &config.account_number),
            context_data_host: config.context_data_host.clone(),
        })
    }

    fn chat_url(&self, session: &SessionHandle, suffix: &str) -> String {
        format!("{}/{}/{}", self.chats_url, session.as_str(), suffix)
    }
}

fn chats_url(host: &str, account_number: &str) -> String {
    format!(
        "{}/api/v1/accounts/{}/chats",
        host.trim_end_matches('/'),
        account_number
    )
}

#[async_trait]
impl EscalationGateway for LiveAssistClient {
    async fn request_chat(&self, spec: &ChatSpec) -> Result<SessionHandle, GatewayError> {
        let context_id = uuid::Uuid::new_v4().to_string();
        let context_data = spec
            .context_data
            .create_token(&context_id)
            .map_err(|e| GatewayError::protocol(format!("Failed to sign context data: {e}")))?;

        let body = ChatRequestBody {
            skill: &spec.skill,
            visitor_name: &spec.visitor_name,
            transcript: &spec.transcript,
            context_id,
            context_data,
        };

        let mut request = self.client.post(&self.chats_url).json(&body);
        if let Some(host) = &self.context_data_host {
            request = request.header("X-Context-Data-Host", host);
        }

        let response: ChatRequestResponse = request
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(|e| GatewayError::from_reqwest(&e))?
            .json()
            .await
            .map_err(|e| GatewayError::from_reqwest(&e))?;

        if response.chat_context.is_empty() {
            return Err(GatewayError::protocol("Gateway returned an empty chat context"));
        }
        Ok(SessionHandle::new(response.chat_context))
    }

    async fn post_line(&self, text: &str, session: &SessionHandle) -> Result<(), GatewayError> {
        self.client
            .post(self.chat_url(session, "lines"))
            .json(&PostLineBody { text })
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(|e| GatewayError::from_reqwest(&e))?;
        Ok(())
    }

    async fn poll(&self, session: &SessionHandle) -> Result<Option<ChatInfo>, GatewayError> {
        let response = self
            .client
            .get(self.chat_url(session, "events"))
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(|e| GatewayError::from_reqwest(&e))?;

        if response.status() == StatusCode::NO_CONTENT {
            return Ok(None);
        }

        let info = response
            .json::<ChatInfo>()
            .await
            .map_err(|e| GatewayError::from_reqwest(&e))?;
        Ok(Some(info))
    }
}
