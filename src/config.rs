//! Bridge configuration, read from the environment

use crate::context_data::ContextData;
use crate::gateway::LiveAssistConfig;
use crate::runtime::RuntimeSettings;
use std::time::Duration;
use thiserror::Error;

const DEFAULT_SKILL: &str = "MySkill";
const DEFAULT_BOT_NAME: &str = "EscalationBot";
const DEFAULT_POLL_INTERVAL_MS: u64 = 5000;
const DEFAULT_POLL_TIMEOUT_MS: u64 = 3000;
const DEFAULT_PORT: u16 = 3978;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} is not set")]
    Missing(&'static str),
    #[error("{name} has an invalid value: {reason}")]
    Invalid { name: &'static str, reason: String },
}

#[derive(Clone)]
pub struct BridgeConfig {
    pub account_number: String,
    pub host: String,
    pub context_data_host: Option<String>,
    pub skill: String,
    pub bot_name: String,
    pub poll_interval: Duration,
    pub poll_timeout: Duration,
    pub port: u16,
    pub context_secret: String,
    pub context_data: ContextData,
    pub connector_token: Option<String>,
}

impl std::fmt::Debug for BridgeConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BridgeConfig")
            .field("account_number", &self.account_number)
            .field("host", &self.host)
            .field("context_data_host", &self.context_data_host)
            .field("skill", &self.skill)
            .field("bot_name", &self.bot_name)
            .field("poll_interval", &self.poll_interval)
            .field("poll_timeout", &self.poll_timeout)
            .field("port", &self.port)
            .field("context_secret", &"***")
            .field("connector_token", &self.connector_token.as_ref().map(|_| "***"))
            .finish_non_exhaustive()
    }
}

impl BridgeConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build from any variable source; empty values count as unset
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        let require = |name: &'static str| get(name).ok_or(ConfigError::Missing(name));

        let context_data = match get("BRIDGE_CONTEXT_DATA") {
            Some(raw) => serde_json::from_str(&raw).map_err(|e| ConfigError::Invalid {
                name: "BRIDGE_CONTEXT_DATA",
                reason: e.to_string(),
            })?,
            None => ContextData::default(),
        };

        let config = Self {
            account_number: require("LIVE_ASSIST_ACCOUNT")?,
            host: require("LIVE_ASSIST_HOST")?.trim_end_matches('/').to_string(),
            context_data_host: get("LIVE_ASSIST_CONTEXT_DATA_HOST"),
            skill: get("LIVE_ASSIST_SKILL").unwrap_or_else(|| DEFAULT_SKILL.to_string()),
            bot_name: get("BRIDGE_BOT_NAME").unwrap_or_else(|| DEFAULT_BOT_NAME.to_string()),
            poll_interval: Duration::from_millis(parse_or(
                get("BRIDGE_POLL_INTERVAL_MS"),
                "BRIDGE_POLL_INTERVAL_MS",
                DEFAULT_POLL_INTERVAL_MS,
            )?),
            poll_timeout: Duration::from_millis(parse_or(
                get("BRIDGE_POLL_TIMEOUT_MS"),
                "BRIDGE_POLL_TIMEOUT_MS",
                DEFAULT_POLL_TIMEOUT_MS,
            )?),
            port: parse_or(get("BRIDGE_PORT"), "BRIDGE_PORT", DEFAULT_PORT)?,
            context_secret: require("BRIDGE_CONTEXT_SECRET")?,
            context_data,
            connector_token: get("BRIDGE_CONNECTOR_TOKEN"),
        };
        config.validate()?;
        Ok(config)
    }

    /// Each poll must finish before the next tick is due
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.poll_interval.is_zero() {
            return Err(ConfigError::Invalid {
                name: "BRIDGE_POLL_INTERVAL_MS",
                reason: "must be greater than zero".to_string(),
            });
        }
        if self.poll_timeout >= self.poll_interval {
            return Err(ConfigError::Invalid {
                name: "BRIDGE_POLL_TIMEOUT_MS",
                reason: format!(
                    "{}ms must be below the poll interval of {}ms",
                    self.poll_timeout.as_millis(),
                    self.poll_interval.as_millis()
                ),
            });
        }
        Ok(())
    }

    pub fn live_assist(&self) -> LiveAssistConfig {
        LiveAssistConfig {
            account_number: self.account_number.clone(),
            host: self.host.clone(),
            context_data_host: self.context_data_host.clone(),
            request_timeout: self.poll_timeout,
        }
    }

    pub fn runtime_settings(&self) -> RuntimeSettings {
        RuntimeSettings {
            poll_interval: self.poll_interval,
            call_timeout: self.poll_timeout,
        }
    }
}

fn parse_or<T: std::str::FromStr>(
    raw: Option<String>,
    name: &'static str,
    default: T,
) -> Result<T, ConfigError>
where
    T::Err: std::fmt::Display,
{
    match raw {
        Some(raw) => raw.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
            name,
            reason: e.to_string(),
        }),
        None => Ok(default),
    }
}
