use thiserror::Error;

use crate::dispatch::types::BatchId;

/// Every failure the mentor core can name.
///
/// Only `Transport` (and the batch report, which is not an error) ever leaves a
/// session call. The rest are recovered inside the component that raised them.
#[derive(Debug, Error)]
pub enum MentorError {
    #[error("intake is missing required fields: {}", .missing.join(", "))]
    IntakeParse { missing: Vec<&'static str> },

    #[error("expected \"yes\" or \"no\", got {reply:?}")]
    ConfirmationMismatch { reply: String },

    #[error("undecodable stream payload: {0}")]
    StreamDecode(String),

    #[error("connection error: {0}")]
    Transport(String),

    #[error("{0}")]
    OperationApply(String),

    #[error("unknown action {0:?}")]
    UnknownAction(String),

    #[error("operation is missing required field `{0}`")]
    MissingField(&'static str),

    #[error("no staged batch with id {0}")]
    NoStagedBatch(BatchId),

    #[error("store error: {0}")]
    Store(String),

    #[error("invalid configuration: {0}")]
    Config(String),
}

impl MentorError {
    /// Collaborator failures keep their whole cause chain.
    pub fn apply(err: anyhow::Error) -> Self {
        MentorError::OperationApply(format!("{:#}", err))
    }
}
