//! Owner of the local mirror of the users collection.
//!
//! Every change to the mirror happens after the service confirmed it. Mutating
//! operations take `&mut self`, so one mutation is in flight at a time.

use std::sync::Arc;

use shared::domain::{DraftError, UserDraft, UserId, UserRecord};
use thiserror::Error;
use tracing::{info, warn};

use crate::{
    confirm::{Confirmation, DELETE_PROMPT},
    error::GatewayError,
    filter::{self, FilterCriteria},
    gateway::RemoteUserGateway,
    session::{EditSession, EditSessionController, SessionError, SessionMode, Submission},
};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to load users: {0}")]
    Load(#[source] GatewayError),
    #[error("failed to create user: {0}")]
    Create(#[source] GatewayError),
    #[error("failed to update user {id}: {source}")]
    Update { id: UserId, source: GatewayError },
    #[error("failed to delete user {id}: {source}")]
    Delete { id: UserId, source: GatewayError },
    #[error("user {0} is not in the collection")]
    UnknownUser(UserId),
    #[error(transparent)]
    Session(#[from] SessionError),
    #[error("invalid draft: {0}")]
    InvalidDraft(#[from] DraftError),
}

impl StoreError {
    pub fn gateway_error(&self) -> Option<&GatewayError> {
        match self {
            StoreError::Load(source)
            | StoreError::Create(source)
            | StoreError::Update { source, .. }
            | StoreError::Delete { source, .. } => Some(source),
            _ => None,
        }
    }

    /// The operator can fix the input and resubmit.
    pub fn is_correctable(&self) -> bool {
        match self {
            StoreError::InvalidDraft(_) => true,
            other => other.gateway_error().is_some_and(GatewayError::is_validation),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    Created(UserRecord),
    Updated(UserRecord),
}

impl SubmitOutcome {
    pub fn record(&self) -> &UserRecord {
        match self {
            SubmitOutcome::Created(record) | SubmitOutcome::Updated(record) => record,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    Deleted(UserId),
    /// The operator said no; nothing was sent.
    Declined,
}

pub struct UserCollectionStore {
    gateway: Arc<dyn RemoteUserGateway>,
    confirmation: Arc<dyn Confirmation>,
    mirror: Vec<UserRecord>,
    session: EditSessionController,
}

impl UserCollectionStore {
    pub fn new(gateway: Arc<dyn RemoteUserGateway>, confirmation: Arc<dyn Confirmation>) -> Self {
        Self {
            gateway,
            confirmation,
            mirror: Vec::new(),
            session: EditSessionController::new(),
        }
    }

    /// Replaces the mirror with the service's list. On failure the mirror keeps its
    /// previous contents.
    pub async fn initialize(&mut self) -> Result<usize, StoreError> {
        match self.gateway.list().await {
            Ok(records) => {
                let records = dedup_by_id(records);
                info!(count = records.len(), "loaded users");
                self.mirror = records;
                Ok(self.mirror.len())
            }
            Err(err) => {
                warn!(error = %err, "failed to load users");
                Err(StoreError::Load(err))
            }
        }
    }

    pub fn records(&self) -> &[UserRecord] {
        &self.mirror
    }

    pub fn get(&self, id: UserId) -> Option<&UserRecord> {
        self.mirror.iter().find(|record| record.id == id)
    }

    pub fn visible_records(&self, criteria: &FilterCriteria) -> Vec<&UserRecord> {
        filter::apply(&self.mirror, criteria)
    }

    pub fn session(&self) -> &EditSession {
        self.session.session()
    }

    pub fn session_mode(&self) -> SessionMode {
        self.session.mode()
    }

    pub fn draft(&self) -> Option<&UserDraft> {
        self.session.draft()
    }

    pub fn draft_mut(&mut self) -> Option<&mut UserDraft> {
        self.session.draft_mut()
    }

    pub fn last_session_error(&self) -> Option<&str> {
        self.session.last_error()
    }

    pub fn begin_edit(&mut self, id: UserId) -> Result<(), StoreError> {
        let target = self.get(id).cloned().ok_or(StoreError::UnknownUser(id))?;
        self.session.begin_edit(target)?;
        Ok(())
    }

    pub fn begin_create(&mut self) -> Result<(), StoreError> {
        self.session.begin_create()?;
        Ok(())
    }

    pub fn cancel_session(&mut self) -> bool {
        self.session.cancel()
    }

    /// Sends the active session's draft. On success the mirror takes the service's
    /// record and the session ends; on failure both stay as they were.
    pub async fn submit(&mut self) -> Result<SubmitOutcome, StoreError> {
        let submission = self.session.submission()?;
        if let Err(err) = submission.draft().validate() {
            self.session.record_failure(err.to_string());
            return Err(err.into());
        }

        let outcome = match submission {
            Submission::Create { draft } => {
                let result = self.gateway.create(&draft).await;
                match result {
                    Ok(record) => {
                        self.append(record.clone());
                        Ok(SubmitOutcome::Created(record))
                    }
                    Err(source) => Err(StoreError::Create(source)),
                }
            }
            Submission::Update { id, draft } => {
                let result = self.gateway.update(id, &draft).await;
                match result {
                    Ok(record) => {
                        self.replace(record.clone());
                        Ok(SubmitOutcome::Updated(record))
                    }
                    Err(source) => Err(StoreError::Update { id, source }),
                }
            }
        };

        match &outcome {
            Ok(_) => self.session.complete(),
            Err(err) => {
                warn!(error = %err, "submit failed; keeping session");
                self.session.record_failure(err.to_string());
            }
        }
        outcome
    }

    /// Deletes `id` after operator confirmation. The mirror only changes once the
    /// service confirmed the delete.
    pub async fn request_delete(&mut self, id: UserId) -> Result<DeleteOutcome, StoreError> {
        if self.get(id).is_none() {
            return Err(StoreError::UnknownUser(id));
        }
        if !self.confirmation.confirm(DELETE_PROMPT).await {
            info!(user_id = id.0, "delete declined");
            return Ok(DeleteOutcome::Declined);
        }

        match self.gateway.delete(id).await {
            Ok(()) => {
                self.mirror.retain(|record| record.id != id);
                info!(user_id = id.0, "deleted user");
                Ok(DeleteOutcome::Deleted(id))
            }
            Err(source) => {
                warn!(user_id = id.0, error = %source, "failed to delete user");
                Err(StoreError::Delete { id, source })
            }
        }
    }

    fn append(&mut self, record: UserRecord) {
        if let Some(existing) = self.mirror.iter_mut().find(|r| r.id == record.id) {
            warn!(user_id = record.id.0, "created user id already mirrored; replacing");
            *existing = record;
            return;
        }
        info!(user_id = record.id.0, "created user");
        self.mirror.push(record);
    }

    fn replace(&mut self, record: UserRecord) {
        match self.mirror.iter_mut().find(|r| r.id == record.id) {
            Some(existing) => {
                info!(user_id = record.id.0, "updated user");
                *existing = record;
            }
            None => warn!(user_id = record.id.0, "updated user is no longer mirrored"),
        }
    }
}

fn dedup_by_id(records: Vec<UserRecord>) -> Vec<UserRecord> {
    let mut seen = std::collections::HashSet::new();
    let before = records.len();
    let records: Vec<UserRecord> = records
        .into_iter()
        .filter(|record| seen.insert(record.id))
        .collect();
    if records.len() != before {
        warn!(dropped = before - records.len(), "list contained duplicate user ids");
    }
    records
}

#[cfg(test)]
#[path = "tests/store_tests.rs"]
mod tests;
