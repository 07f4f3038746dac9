use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::error::FieldError;

/// Body shape of every response from the users resource.
///
/// `code` is only present on the legacy `public-api` flavour of the service, which
/// always answers HTTP 200 and reports the real status inside the body.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResponseEnvelope {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<u16>,
    /// `None` when the key is absent; an explicit `null` is `Some(Value::Null)`.
    #[serde(
        default,
        deserialize_with = "present",
        skip_serializing_if = "Option::is_none"
    )]
    pub data: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ResponseEnvelope {
    /// Status to act on: the body `code` when the transport reported success.
    pub fn effective_status(&self, http_status: u16) -> u16 {
        match self.code {
            Some(code) if (200..300).contains(&http_status) => code,
            _ => http_status,
        }
    }

    /// True only for an explicit `"data": null`.
    pub fn has_null_data(&self) -> bool {
        matches!(self.data, Some(Value::Null))
    }

    /// Field-level rejections carried in `data`, if the service sent any.
    pub fn field_errors(&self) -> Vec<FieldError> {
        self.data
            .clone()
            .and_then(|data| serde_json::from_value(data).ok())
            .unwrap_or_default()
    }

    /// Top-level message, either beside `data` or nested inside it.
    pub fn error_message(&self) -> Option<String> {
        if let Some(message) = &self.message {
            return Some(message.clone());
        }
        self.data
            .as_ref()
            .and_then(|data| data.get("message"))
            .and_then(Value::as_str)
            .map(ToString::to_string)
    }
}

fn present<'de, D>(deserializer: D) -> Result<Option<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Value::deserialize(deserializer).map(Some)
}

#[cfg(test)]
#[path = "tests/protocol_tests.rs"]
mod tests;
