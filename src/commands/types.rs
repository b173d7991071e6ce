use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One entry of a `FILE_OPS` block. Every field is optional on the wire; the
/// dispatcher decides which ones an action needs.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FileOperation {
    pub action: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recursive: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub new_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub new_path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
}

/// One entry of a `MILESTONE_OPS` block.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MilestoneOperation {
    pub action: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub milestone_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub task_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_date: Option<String>,
    /// Numbers and numeric strings are both seen in practice.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub progress: Option<Value>,
}

/// Structured feedback record. Opaque to this crate and persisted verbatim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MentorReport(pub Value);

/// Per-tag extraction result for one finalized reply.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExtractedCommands {
    pub file_ops: Option<Value>,
    pub mentor_report: Option<MentorReport>,
    pub milestone_ops: Option<Value>,
}

impl ExtractedCommands {
    pub fn is_empty(&self) -> bool {
        self.file_ops.is_none() && self.mentor_report.is_none() && self.milestone_ops.is_none()
    }
}
