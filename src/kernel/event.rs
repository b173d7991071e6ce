use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::commands::types::{FileOperation, MentorReport};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MessageId(pub Uuid);

impl MessageId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for MessageId {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageType {
    Explanation,
    Hint,
    Question,
    Warning,
}

impl MessageType {
    /// Heuristic classification of a finished assistant reply.
    ///
    /// - leading warning marker -> Warning
    /// - "Hint:" anywhere at a line start -> Hint
    /// - ends in "?" -> Question
    /// - otherwise Explanation
    pub fn infer(content: &str) -> Self {
        let trimmed = content.trim();
        let lower = trimmed.to_lowercase();

        if trimmed.starts_with('⚠') || lower.starts_with("warning") || lower.starts_with("careful") {
            return MessageType::Warning;
        }
        if lower.lines().any(|l| l.trim_start().starts_with("hint:")) {
            return MessageType::Hint;
        }
        if trimmed.ends_with('?') {
            return MessageType::Question;
        }
        MessageType::Explanation
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: MessageId,
    pub role: Role,
    pub content: String,
    #[serde(rename = "type")]
    pub kind: MessageType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_ops: Option<Vec<FileOperation>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mentor_report: Option<MentorReport>,
    pub created_at: DateTime<Utc>,
}

impl Message {
    pub fn user(content: &str) -> Self {
        Self::new(Role::User, content, MessageType::Explanation)
    }

    pub fn assistant(content: &str, kind: MessageType) -> Self {
        Self::new(Role::Assistant, content, kind)
    }

    fn new(role: Role, content: &str, kind: MessageType) -> Self {
        Self {
            id: MessageId::new(),
            role,
            content: content.to_string(),
            kind,
            file_ops: None,
            mentor_report: None,
            created_at: Utc::now(),
        }
    }
}
