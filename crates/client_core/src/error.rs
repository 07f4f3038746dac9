use shared::error::{ErrorCode, FieldError};
use thiserror::Error;

/// Normalized failure of a single round trip to the users resource.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GatewayError {
    /// Network failure, timeout, unexpected status or malformed body.
    #[error("transport failure{}: {message}", status_suffix(.status))]
    Transport {
        status: Option<u16>,
        message: String,
    },
    /// The service rejected a mutation with a 4xx status.
    #[error("request rejected ({status}): {message}")]
    Validation {
        status: u16,
        code: ErrorCode,
        message: String,
        fields: Vec<FieldError>,
    },
}

fn status_suffix(status: &Option<u16>) -> String {
    status.map(|s| format!(" ({s})")).unwrap_or_default()
}

impl GatewayError {
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            status: None,
            message: message.into(),
        }
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, GatewayError::Validation { .. })
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            GatewayError::Transport { status, .. } => *status,
            GatewayError::Validation { status, .. } => Some(*status),
        }
    }

    pub fn code(&self) -> Option<ErrorCode> {
        match self {
            GatewayError::Transport { .. } => None,
            GatewayError::Validation { code, .. } => Some(*code),
        }
    }
}

impl From<reqwest::Error> for GatewayError {
    fn from(err: reqwest::Error) -> Self {
        let message = if err.is_timeout() {
            format!("request timed out: {err}")
        } else if err.is_connect() {
            format!("failed to connect: {err}")
        } else {
            err.to_string()
        };
        Self::Transport {
            status: err.status().map(|s| s.as_u16()),
            message,
        }
    }
}
