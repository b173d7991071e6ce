use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use super::handler::OperationHandler;
use crate::commands::types::MilestoneOperation;
use crate::error::MentorError;
use crate::services::tracker::{MilestonePatch, MilestoneTracker, TaskPatch};

#[derive(Debug, Clone, PartialEq)]
pub enum MilestoneCommand<'a> {
    UpdateMilestone { milestone_id: &'a str, patch: MilestonePatch },
    UpdateTask { task_id: &'a str, patch: TaskPatch },
}

impl<'a> MilestoneCommand<'a> {
    pub fn parse(op: &'a MilestoneOperation) -> Result<Self, MentorError> {
        match op.action.trim().to_ascii_lowercase().as_str() {
            "update_milestone" => Ok(MilestoneCommand::UpdateMilestone {
                milestone_id: required(&op.milestone_id, "milestone_id")?,
                patch: MilestonePatch {
                    status: op.status.clone(),
                    title: op.title.clone(),
                    description: op.description.clone(),
                    due_date: op.due_date.clone(),
                },
            }),
            "update_task" => Ok(MilestoneCommand::UpdateTask {
                task_id: required(&op.task_id, "task_id")?,
                patch: TaskPatch {
                    status: op.status.clone(),
                    progress: op.progress.as_ref().map(parse_progress).transpose()?,
                    title: op.title.clone(),
                    description: op.description.clone(),
                },
            }),
            _ => Err(MentorError::UnknownAction(op.action.clone())),
        }
    }
}

fn required<'a>(field: &'a Option<String>, name: &'static str) -> Result<&'a str, MentorError> {
    field
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or(MentorError::MissingField(name))
}

/// 42, 42.6, "42" and "42%" all mean percent; clamped to 0..=100.
fn parse_progress(value: &Value) -> Result<u8, MentorError> {
    let number = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().trim_end_matches('%').trim().parse::<f64>().ok(),
        _ => None,
    };
    match number {
        Some(n) if n.is_finite() => Ok(n.round().clamp(0.0, 100.0) as u8),
        _ => Err(MentorError::OperationApply(format!("invalid progress value {}", value))),
    }
}

pub struct MilestoneOpsHandler {
    tracker: Arc<dyn MilestoneTracker>,
}

impl MilestoneOpsHandler {
    pub fn new(tracker: Arc<dyn MilestoneTracker>) -> Self {
        Self { tracker }
    }
}

#[async_trait]
impl OperationHandler for MilestoneOpsHandler {
    type Op = MilestoneOperation;

    async fn apply(&self, op: &MilestoneOperation) -> Result<String, MentorError> {
        match MilestoneCommand::parse(op)? {
            MilestoneCommand::UpdateMilestone { milestone_id, patch } => {
                self.tracker
                    .update_milestone(milestone_id, &patch)
                    .await
                    .map_err(MentorError::apply)?;
                Ok(format!("updated milestone {}", milestone_id))
            }
            MilestoneCommand::UpdateTask { task_id, patch } => {
                self.tracker.update_task(task_id, &patch).await.map_err(MentorError::apply)?;
                Ok(format!("updated task {}", task_id))
            }
        }
    }
}
