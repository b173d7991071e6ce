use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::commands::types::{FileOperation, MilestoneOperation};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BatchId(pub Uuid);

impl BatchId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for BatchId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for BatchId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for BatchId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s.trim()).map(BatchId)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OperationDomain {
    Files,
    Milestones,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "domain", content = "operation", rename_all = "lowercase")]
pub enum Operation {
    File(FileOperation),
    Milestone(MilestoneOperation),
    /// Entry that did not deserialize into its family's shape.
    Malformed { raw: Value, reason: String },
}

impl Operation {
    pub fn action(&self) -> &str {
        match self {
            Operation::File(op) => &op.action,
            Operation::Milestone(op) => &op.action,
            Operation::Malformed { .. } => "",
        }
    }

    /// Short human label, e.g. "create /src/a.ts" or "update_task t-3".
    pub fn describe(&self) -> String {
        let target = match self {
            Operation::File(op) => op.path.clone(),
            Operation::Milestone(op) => op.milestone_id.clone().or_else(|| op.task_id.clone()),
            Operation::Malformed { .. } => return "malformed operation".to_string(),
        };
        match target {
            Some(t) => format!("{} {}", self.action(), t),
            None => self.action().to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OperationStatus {
    Ok,
    Error,
    UnknownAction,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OperationResult {
    pub operation: Operation,
    pub status: OperationStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

/// Operations held back until the user confirms or cancels them.
#[derive(Debug, Clone, PartialEq)]
pub struct StagedBatch {
    pub id: BatchId,
    pub domain: OperationDomain,
    pub operations: Vec<Operation>,
}

impl StagedBatch {
    pub fn new(domain: OperationDomain, operations: Vec<Operation>) -> Self {
        Self {
            id: BatchId::new(),
            domain,
            operations,
        }
    }

    pub fn len(&self) -> usize {
        self.operations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }
}

/// Result of applying one confirmed batch. One entry per staged operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchReport {
    pub batch_id: BatchId,
    pub domain: OperationDomain,
    pub results: Vec<OperationResult>,
}

impl BatchReport {
    pub fn succeeded(&self) -> usize {
        self.results.iter().filter(|r| r.status == OperationStatus::Ok).count()
    }

    pub fn failed(&self) -> usize {
        self.results.len() - self.succeeded()
    }

    pub fn summary(&self) -> String {
        let noun = match self.domain {
            OperationDomain::Files => "file operations",
            OperationDomain::Milestones => "milestone updates",
        };
        format!(
            "Applied {} of {} {} ({} failed)",
            self.succeeded(),
            self.results.len(),
            noun,
            self.failed()
        )
    }
}
