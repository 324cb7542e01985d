//! Gateway error types

use thiserror::Error;

/// Gateway error with classification
#[derive(Debug, Error)]
#[error("{message}")]
pub struct GatewayError {
    pub kind: GatewayErrorKind,
    pub message: String,
}

impl GatewayError {
    pub fn new(kind: GatewayErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// Network failure, timeout or server error
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::new(GatewayErrorKind::Unavailable, message)
    }

    pub fn protocol(message: impl Into<String>) -> Self {
        Self::new(GatewayErrorKind::Protocol, message)
    }

    pub fn from_reqwest(error: &reqwest::Error) -> Self {
        if error.is_decode() {
            Self::protocol(format!("Undecodable gateway response: {error}"))
        } else if let Some(status) = error.status() {
            Self::new(
                GatewayErrorKind::from_status(status.as_u16()),
                format!("Gateway returned {status}"),
            )
        } else {
            Self::unavailable(format!("Gateway unreachable: {error}"))
        }
    }
}

/// Error classification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GatewayErrorKind {
    /// Network issues, timeouts, 5xx - the next attempt may succeed
    Unavailable,
    /// The gateway refused the request (4xx)
    Rejected,
    /// The gateway answered with something we could not understand
    Protocol,
}

impl GatewayErrorKind {
    pub fn from_status(status: u16) -> Self {
        match status {
            408 | 429 | 500..=599 => Self::Unavailable,
            _ => Self::Rejected,
        }
    }

    pub fn is_retryable(self) -> bool {
        matches!(self, Self::Unavailable)
    }
}
