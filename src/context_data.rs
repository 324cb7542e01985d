//! Visitor context data and its signed token
//!
//! When the live-chat backend accepts an escalation it calls back with a
//! context id; the bridge answers with a signed token describing the visitor.

use chrono::{Duration, Utc};
use jsonwebtoken::{encode, EncodingKey, Header};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

const TOKEN_TTL_SECS: i64 = 3600;

/// A string attribute the business may vouch for
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssertedString {
    pub value: String,
    #[serde(default)]
    pub is_asserted: bool,
}

/// A numeric attribute the business may vouch for
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssertedInteger {
    pub value: i64,
    #[serde(default)]
    pub is_asserted: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Customer {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_name: Option<AssertedString>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_name: Option<AssertedString>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company_size: Option<AssertedInteger>,
}

/// Visitor attributes handed to the live agent
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContextData {
    #[serde(default)]
    pub customer: Customer,
}

#[derive(Debug, Error)]
#[error("context data could not be signed: {0}")]
pub struct TokenError(#[from] jsonwebtoken::errors::Error);

/// Produces the token the gateway fetches for a given context id
pub trait ContextDataProvider: Send + Sync {
    fn create_token(&self, context_id: &str) -> Result<String, TokenError>;
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ContextClaims<'a> {
    sub: &'a str,
    iat: i64,
    exp: i64,
    context_data: &'a ContextData,
}

/// Signs [`ContextData`] into a compact HS256 JWT
pub struct ContextDataSigner {
    key: EncodingKey,
    data: ContextData,
}

impl ContextDataSigner {
    pub fn new(secret: impl AsRef<[u8]>, data: ContextData) -> Self {
        Self {
            key: EncodingKey::from_secret(secret.as_ref()),
            data,
        }
    }
}

impl ContextDataProvider for ContextDataSigner {
    fn create_token(&self, context_id: &str) -> Result<String, TokenError> {
        let now = Utc::now();
        let claims = ContextClaims {
            sub: context_id,
            iat: now.timestamp(),
            exp: (now + Duration::seconds(TOKEN_TTL_SECS)).timestamp(),
            context_data: &self.data,
        };
        Ok(encode(&Header::default(), &claims, &self.key)?)
    }
}

impl fmt::Debug for ContextDataSigner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContextDataSigner")
            .field("key", &"****")
            .field("data", &self.data)
            .finish()
    }
}
