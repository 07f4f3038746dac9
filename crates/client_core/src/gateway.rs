//! Round trips to the remote users resource.

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use shared::{
    domain::{UserDraft, UserId, UserRecord},
    error::ErrorCode,
    protocol::ResponseEnvelope,
};
use tracing::{debug, warn};

use crate::{config::Settings, error::GatewayError};

/// The four operations of the users resource. Each is one round trip and is never
/// retried; nothing is changed locally.
#[async_trait]
pub trait RemoteUserGateway: Send + Sync {
    async fn list(&self) -> Result<Vec<UserRecord>, GatewayError>;
    async fn create(&self, draft: &UserDraft) -> Result<UserRecord, GatewayError>;
    async fn update(&self, id: UserId, draft: &UserDraft) -> Result<UserRecord, GatewayError>;
    async fn delete(&self, id: UserId) -> Result<(), GatewayError>;
}

pub struct HttpUserGateway {
    http: Client,
    base_url: String,
    token: Option<String>,
}

impl HttpUserGateway {
    pub fn new(settings: &Settings) -> Result<Self, GatewayError> {
        let http = Client::builder()
            .timeout(settings.request_timeout())
            .build()?;
        Ok(Self::with_client(
            http,
            settings.api_base_url.clone(),
            settings.token().map(str::to_owned),
        ))
    }

    pub fn with_client(http: Client, base_url: impl Into<String>, token: Option<String>) -> Self {
        Self {
            http,
            base_url: base_url.into(),
            token,
        }
    }

    fn collection_url(&self) -> String {
        format!("{}/users", self.base_url)
    }

    fn member_url(&self, id: UserId) -> String {
        format!("{}/users/{}", self.base_url, id.0)
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => {
                debug!("no api token configured; sending mutation without credentials");
                request
            }
        }
    }
}

#[async_trait]
impl RemoteUserGateway for HttpUserGateway {
    async fn list(&self) -> Result<Vec<UserRecord>, GatewayError> {
        debug!(url = %self.collection_url(), "listing users");
        let response = self.http.get(self.collection_url()).send().await?;
        let reply = Reply::read(response).await?;
        if !reply.is_success() {
            return Err(reply.transport_failure("list users"));
        }
        reply.into_data()
    }

    async fn create(&self, draft: &UserDraft) -> Result<UserRecord, GatewayError> {
        debug!(name = %draft.name, "creating user");
        let response = self
            .authorized(self.http.post(self.collection_url()))
            .json(draft)
            .send()
            .await?;
        Reply::read(response).await?.into_record("create user")
    }

    async fn update(&self, id: UserId, draft: &UserDraft) -> Result<UserRecord, GatewayError> {
        debug!(user_id = id.0, "updating user");
        let response = self
            .authorized(self.http.put(self.member_url(id)))
            .json(draft)
            .send()
            .await?;
        let record = Reply::read(response).await?.into_record("update user")?;
        if record.id != id {
            return Err(GatewayError::transport(format!(
                "server returned user {} for update of user {id}",
                record.id
            )));
        }
        Ok(record)
    }

    async fn delete(&self, id: UserId) -> Result<(), GatewayError> {
        debug!(user_id = id.0, "deleting user");
        let response = self
            .authorized(self.http.delete(self.member_url(id)))
            .send()
            .await?;
        let reply = Reply::read(response).await?;
        if reply.is_delete_confirmation() {
            return Ok(());
        }
        Err(reply.transport_failure("delete user"))
    }
}

/// A fully read response, with the body envelope decoded when there is one.
struct Reply {
    http_status: StatusCode,
    envelope: Option<ResponseEnvelope>,
    body: String,
}

impl Reply {
    async fn read(response: Response) -> Result<Self, GatewayError> {
        let http_status = response.status();
        let body = response.text().await?;
        let envelope = if body.trim().is_empty() {
            None
        } else {
            serde_json::from_str(&body).ok()
        };
        Ok(Self {
            http_status,
            envelope,
            body,
        })
    }

    fn status(&self) -> u16 {
        let http_status = self.http_status.as_u16();
        self.envelope
            .as_ref()
            .map_or(http_status, |envelope| envelope.effective_status(http_status))
    }

    fn is_success(&self) -> bool {
        (200..300).contains(&self.status())
    }

    /// 204 and an explicit `{ "data": null }` both confirm a delete. A body without
    /// `data` does not.
    fn is_delete_confirmation(&self) -> bool {
        if self.http_status == StatusCode::NO_CONTENT || self.status() == 204 {
            return true;
        }
        self.is_success()
            && self
                .envelope
                .as_ref()
                .is_some_and(ResponseEnvelope::has_null_data)
    }

    fn into_data<T: DeserializeOwned>(self) -> Result<T, GatewayError> {
        let status = Some(self.status());
        let Some(data) = self.envelope.and_then(|envelope| envelope.data) else {
            return Err(GatewayError::Transport {
                status,
                message: "malformed response: expected a JSON body with `data`".into(),
            });
        };
        serde_json::from_value(data).map_err(|err| GatewayError::Transport {
            status,
            message: format!("malformed response: {err}"),
        })
    }

    fn into_record(self, operation: &str) -> Result<UserRecord, GatewayError> {
        let status = self.status();
        if (400..500).contains(&status) {
            let err = self.rejection(status);
            warn!(operation, status, error = %err, "request rejected");
            return Err(err);
        }
        if !self.is_success() {
            return Err(self.transport_failure(operation));
        }
        self.into_data()
    }

    fn rejection(&self, status: u16) -> GatewayError {
        let fields = self
            .envelope
            .as_ref()
            .map(ResponseEnvelope::field_errors)
            .unwrap_or_default();
        let message = if !fields.is_empty() {
            fields
                .iter()
                .map(|field| format!("{} {}", field.field, field.message))
                .collect::<Vec<_>>()
                .join("; ")
        } else {
            self.envelope
                .as_ref()
                .and_then(ResponseEnvelope::error_message)
                .unwrap_or_else(|| self.reason(status))
        };
        GatewayError::Validation {
            status,
            code: ErrorCode::from_status(status),
            message,
            fields,
        }
    }

    fn transport_failure(&self, operation: &str) -> GatewayError {
        let status = self.status();
        let detail = self
            .envelope
            .as_ref()
            .and_then(ResponseEnvelope::error_message)
            .unwrap_or_else(|| self.reason(status));
        warn!(operation, status, detail = %detail, "unexpected response");
        GatewayError::Transport {
            status: Some(status),
            message: format!("{operation}: {detail}"),
        }
    }

    fn reason(&self, status: u16) -> String {
        let canonical = StatusCode::from_u16(status)
            .ok()
            .and_then(|code| code.canonical_reason());
        match canonical {
            Some(reason) => reason.to_string(),
            None if !self.body.trim().is_empty() => self.body.trim().chars().take(200).collect(),
            None => format!("status {status}"),
        }
    }
}

#[cfg(test)]
#[path = "tests/gateway_tests.rs"]
mod tests;
