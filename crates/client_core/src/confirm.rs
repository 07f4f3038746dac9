use async_trait::async_trait;

pub const DELETE_PROMPT: &str = "Are you sure you want to delete this user?";

/// Asks the operator before a destructive action.
#[async_trait]
pub trait Confirmation: Send + Sync {
    async fn confirm(&self, prompt: &str) -> bool;
}

/// Answers yes without asking. For non-interactive callers that already opted in.
pub struct AlwaysConfirm;

#[async_trait]
impl Confirmation for AlwaysConfirm {
    async fn confirm(&self, _prompt: &str) -> bool {
        true
    }
}
