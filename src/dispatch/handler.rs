use async_trait::async_trait;

use crate::error::MentorError;

/// Applies one operation of a family to its collaborator.
///
/// `Ok` carries a short description of what changed. `UnknownAction` and every
/// other error are reported per operation by the dispatcher; a handler never
/// sees the rest of its batch.
#[async_trait]
pub trait OperationHandler: Send + Sync {
    type Op: Send + Sync;

    async fn apply(&self, op: &Self::Op) -> Result<String, MentorError>;
}
