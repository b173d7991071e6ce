use std::any::Any;
use std::panic::AssertUnwindSafe;

use futures_util::FutureExt;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{info, warn};

use super::file_ops::FileOpsHandler;
use super::handler::OperationHandler;
use super::milestone_ops::MilestoneOpsHandler;
use super::types::{
    BatchId, BatchReport, Operation, OperationDomain, OperationResult, OperationStatus, StagedBatch,
};
use crate::commands::types::{ExtractedCommands, FileOperation, MilestoneOperation};
use crate::error::MentorError;
use crate::services::Collaborators;

/// Holds extracted operations until the user confirms or cancels them, then
/// folds a confirmed batch into one result per operation.
///
/// Mentor reports never pass through here; they are persisted on arrival.
pub struct OperationDispatcher {
    files: FileOpsHandler,
    milestones: MilestoneOpsHandler,
    staged: Vec<StagedBatch>,
}

impl OperationDispatcher {
    pub fn new(collaborators: &Collaborators, export_filename: &str) -> Self {
        Self {
            files: FileOpsHandler::new(
                collaborators.files.clone(),
                collaborators.downloads.clone(),
                export_filename,
            ),
            milestones: MilestoneOpsHandler::new(collaborators.tracker.clone()),
            staged: Vec::new(),
        }
    }

    /// Stages the file and milestone payloads of one reply as separate batches.
    /// Returns what was staged, for the caller to show.
    pub fn stage_extracted(&mut self, commands: &ExtractedCommands) -> Vec<StagedBatch> {
        let mut staged = Vec::new();
        if let Some(payload) = &commands.file_ops {
            staged.extend(self.stage(OperationDomain::Files, normalize_file_ops(payload)));
        }
        if let Some(payload) = &commands.milestone_ops {
            staged.extend(self.stage(OperationDomain::Milestones, normalize_milestone_ops(payload)));
        }
        staged
    }

    pub fn stage(&mut self, domain: OperationDomain, operations: Vec<Operation>) -> Option<StagedBatch> {
        if operations.is_empty() {
            return None;
        }
        let batch = StagedBatch::new(domain, operations);
        info!("Staged {:?} batch {} with {} operations", domain, batch.id, batch.len());
        self.staged.push(batch.clone());
        Some(batch)
    }

    pub fn pending(&self) -> &[StagedBatch] {
        &self.staged
    }

    /// Applies a staged batch. The batch leaves the staging area before the
    /// first operation runs, so it can never be applied twice.
    pub async fn confirm(&mut self, id: BatchId) -> Result<BatchReport, MentorError> {
        let batch = self.take(id)?;
        let report = self.apply(batch).await;
        info!("Batch {}: {}", id, report.summary());
        Ok(report)
    }

    /// Drops a staged batch without touching any collaborator.
    pub fn cancel(&mut self, id: BatchId) -> Result<StagedBatch, MentorError> {
        let batch = self.take(id)?;
        info!("Batch {} cancelled ({} operations discarded)", id, batch.len());
        Ok(batch)
    }

    /// Drops everything still staged.
    pub fn cancel_all(&mut self) -> Vec<StagedBatch> {
        std::mem::take(&mut self.staged)
    }

    fn take(&mut self, id: BatchId) -> Result<StagedBatch, MentorError> {
        let index = self
            .staged
            .iter()
            .position(|b| b.id == id)
            .ok_or(MentorError::NoStagedBatch(id))?;
        Ok(self.staged.remove(index))
    }

    /// One result per operation, in order. A failing (or panicking) operation
    /// is recorded and the fold moves on.
    pub async fn apply(&self, batch: StagedBatch) -> BatchReport {
        let mut results = Vec::with_capacity(batch.operations.len());

        for operation in batch.operations {
            let outcome = AssertUnwindSafe(self.apply_one(&operation))
                .catch_unwind()
                .await
                .unwrap_or_else(|panic| Err(MentorError::OperationApply(panic_message(panic))));

            let result = match outcome {
                Ok(detail) => OperationResult {
                    operation,
                    status: OperationStatus::Ok,
                    detail: Some(detail),
                },
                Err(e @ MentorError::UnknownAction(_)) => OperationResult {
                    operation,
                    status: OperationStatus::UnknownAction,
                    detail: Some(e.to_string()),
                },
                Err(e) => {
                    warn!("Operation {} failed: {}", operation.describe(), e);
                    OperationResult {
                        operation,
                        status: OperationStatus::Error,
                        detail: Some(e.to_string()),
                    }
                }
            };
            results.push(result);
        }

        BatchReport {
            batch_id: batch.id,
            domain: batch.domain,
            results,
        }
    }

    async fn apply_one(&self, operation: &Operation) -> Result<String, MentorError> {
        match operation {
            Operation::File(op) => self.files.apply(op).await,
            Operation::Milestone(op) => self.milestones.apply(op).await,
            Operation::Malformed { reason, .. } => {
                Err(MentorError::OperationApply(format!("malformed operation: {}", reason)))
            }
        }
    }
}

/// A single object or an array of objects. Anything else stages nothing.
pub fn normalize_file_ops(payload: &Value) -> Vec<Operation> {
    normalize::<FileOperation>(payload, Operation::File)
}

pub fn normalize_milestone_ops(payload: &Value) -> Vec<Operation> {
    normalize::<MilestoneOperation>(payload, Operation::Milestone)
}

fn normalize<T: DeserializeOwned>(payload: &Value, wrap: fn(T) -> Operation) -> Vec<Operation> {
    let entries: Vec<&Value> = match payload {
        Value::Array(items) => items.iter().collect(),
        Value::Object(_) => vec![payload],
        other => {
            warn!("Ignoring operations payload that is neither object nor array: {}", other);
            return Vec::new();
        }
    };

    entries
        .into_iter()
        .map(|entry| match serde_json::from_value::<T>(entry.clone()) {
            Ok(op) => wrap(op),
            Err(e) => Operation::Malformed {
                raw: entry.clone(),
                reason: e.to_string(),
            },
        })
        .collect()
}

fn panic_message(panic: Box<dyn Any + Send>) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        format!("operation panicked: {}", s)
    } else if let Some(s) = panic.downcast_ref::<String>() {
        format!("operation panicked: {}", s)
    } else {
        "operation panicked".to_string()
    }
}
