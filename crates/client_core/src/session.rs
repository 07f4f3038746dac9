//! Single edit/create form session.

use std::fmt;

use shared::domain::{UserDraft, UserId, UserRecord};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum EditSession {
    #[default]
    Idle,
    Editing {
        target: UserRecord,
        draft: UserDraft,
    },
    Creating {
        draft: UserDraft,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionMode {
    Idle,
    Editing(UserId),
    Creating,
}

impl fmt::Display for SessionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionMode::Idle => f.write_str("idle"),
            SessionMode::Editing(id) => write!(f, "editing user {id}"),
            SessionMode::Creating => f.write_str("creating a user"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error("another session is already active ({0}); save or cancel it first")]
    AlreadyActive(SessionMode),
    #[error("no edit session is active")]
    NotActive,
}

/// What a submit has to send for the active session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Submission {
    Create { draft: UserDraft },
    Update { id: UserId, draft: UserDraft },
}

impl Submission {
    pub fn draft(&self) -> &UserDraft {
        match self {
            Submission::Create { draft } | Submission::Update { draft, .. } => draft,
        }
    }
}

#[derive(Debug, Default)]
pub struct EditSessionController {
    session: EditSession,
    last_error: Option<String>,
}

impl EditSessionController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn session(&self) -> &EditSession {
        &self.session
    }

    pub fn mode(&self) -> SessionMode {
        match &self.session {
            EditSession::Idle => SessionMode::Idle,
            EditSession::Editing { target, .. } => SessionMode::Editing(target.id),
            EditSession::Creating { .. } => SessionMode::Creating,
        }
    }

    pub fn is_active(&self) -> bool {
        !matches!(self.session, EditSession::Idle)
    }

    /// Starts editing `target`; the draft is a copy of its current fields.
    pub fn begin_edit(&mut self, target: UserRecord) -> Result<(), SessionError> {
        self.ensure_idle()?;
        let draft = UserDraft::from(&target);
        debug!(user_id = target.id.0, "edit session started");
        self.transition(EditSession::Editing { target, draft });
        Ok(())
    }

    pub fn begin_create(&mut self) -> Result<(), SessionError> {
        self.ensure_idle()?;
        debug!("create session started");
        self.transition(EditSession::Creating {
            draft: UserDraft::default(),
        });
        Ok(())
    }

    /// Drops the draft. Returns false when there was nothing to cancel.
    pub fn cancel(&mut self) -> bool {
        if !self.is_active() {
            return false;
        }
        debug!(mode = %self.mode(), "session cancelled");
        self.transition(EditSession::Idle);
        true
    }

    pub fn draft(&self) -> Option<&UserDraft> {
        match &self.session {
            EditSession::Idle => None,
            EditSession::Editing { draft, .. } | EditSession::Creating { draft } => Some(draft),
        }
    }

    pub fn draft_mut(&mut self) -> Option<&mut UserDraft> {
        match &mut self.session {
            EditSession::Idle => None,
            EditSession::Editing { draft, .. } | EditSession::Creating { draft } => Some(draft),
        }
    }

    pub fn submission(&self) -> Result<Submission, SessionError> {
        match &self.session {
            EditSession::Idle => Err(SessionError::NotActive),
            EditSession::Editing { target, draft } => Ok(Submission::Update {
                id: target.id,
                draft: draft.clone(),
            }),
            EditSession::Creating { draft } => Ok(Submission::Create {
                draft: draft.clone(),
            }),
        }
    }

    /// The submission was confirmed by the service.
    pub fn complete(&mut self) {
        self.transition(EditSession::Idle);
    }

    /// The submission failed; the session and its draft stay as they are.
    pub fn record_failure(&mut self, message: impl Into<String>) {
        self.last_error = Some(message.into());
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    fn ensure_idle(&self) -> Result<(), SessionError> {
        if self.is_active() {
            return Err(SessionError::AlreadyActive(self.mode()));
        }
        Ok(())
    }

    fn transition(&mut self, next: EditSession) {
        self.session = next;
        self.last_error = None;
    }
}

#[cfg(test)]
#[path = "tests/session_tests.rs"]
mod tests;
