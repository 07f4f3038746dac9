//! Operator-facing messages for failed intents.

use std::fmt;

use client_core::{GatewayError, SessionError, StoreError};
use shared::error::ErrorCode;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeCategory {
    Auth,
    Validation,
    Transport,
    Input,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeContext {
    Load,
    Create,
    Update,
    Delete,
    Save,
    Session,
}

impl NoticeContext {
    fn headline(self) -> &'static str {
        match self {
            NoticeContext::Load => "Failed to load users.",
            NoticeContext::Create => "Failed to create user.",
            NoticeContext::Update => "Failed to update user.",
            NoticeContext::Delete => "Failed to delete user.",
            NoticeContext::Save => "Cannot save user.",
            NoticeContext::Session => "Nothing was changed.",
        }
    }
}

#[derive(Debug, Clone)]
pub struct Notice {
    category: NoticeCategory,
    context: NoticeContext,
    detail: String,
}

impl Notice {
    pub fn category(&self) -> NoticeCategory {
        self.category
    }

    fn hint(&self) -> Option<&'static str> {
        match self.category {
            NoticeCategory::Auth => Some("check the API token: API_KEY or --token"),
            NoticeCategory::Validation => Some("fix the draft and save again"),
            NoticeCategory::Transport => Some("check the service URL and network, then retry"),
            NoticeCategory::Input => None,
        }
    }
}

impl From<&StoreError> for Notice {
    fn from(err: &StoreError) -> Self {
        let context = match err {
            StoreError::Load(_) => NoticeContext::Load,
            StoreError::Create(_) => NoticeContext::Create,
            StoreError::Update { .. } => NoticeContext::Update,
            StoreError::Delete { .. } => NoticeContext::Delete,
            StoreError::UnknownUser(_) | StoreError::Session(_) => NoticeContext::Session,
            StoreError::InvalidDraft(_) => NoticeContext::Save,
        };

        let (category, detail) = match err {
            StoreError::Load(source)
            | StoreError::Create(source)
            | StoreError::Update { source, .. }
            | StoreError::Delete { source, .. } => (classify(source), detail_of(source)),
            StoreError::UnknownUser(id) => {
                (NoticeCategory::Input, format!("user {id} is not in the list"))
            }
            StoreError::Session(SessionError::NotActive) => (
                NoticeCategory::Input,
                "no user is being edited or created".to_string(),
            ),
            StoreError::Session(other) => (NoticeCategory::Input, other.to_string()),
            StoreError::InvalidDraft(draft_err) => {
                (NoticeCategory::Validation, draft_err.to_string())
            }
        };

        Self {
            category,
            context,
            detail,
        }
    }
}

fn classify(err: &GatewayError) -> NoticeCategory {
    match (err.code(), err.status()) {
        (Some(ErrorCode::Unauthorized | ErrorCode::Forbidden), _) | (None, Some(401 | 403)) => {
            NoticeCategory::Auth
        }
        (Some(_), _) => NoticeCategory::Validation,
        (None, _) => NoticeCategory::Transport,
    }
}

fn detail_of(err: &GatewayError) -> String {
    match err {
        GatewayError::Validation { message, .. } => message.clone(),
        GatewayError::Transport { .. } => err.to_string(),
    }
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.context.headline(), self.detail)?;
        if let Some(hint) = self.hint() {
            write!(f, " ({hint})")?;
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "tests/notice_tests.rs"]
mod tests;
