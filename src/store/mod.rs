pub mod memory;
pub mod jsonl;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::commands::types::MentorReport;
use crate::error::MentorError;
use crate::intake::types::IntakeRecord;
use crate::kernel::event::Message;

pub use memory::InMemoryConversationStore;
pub use jsonl::JsonlConversationStore;

/// Durable side of a conversation.
///
/// Writes are append-only. A failed write is the caller's to log; it never
/// rolls back what the session already holds in memory.
#[async_trait]
pub trait ConversationStore: Send + Sync {
    async fn append_message(&self, message: &Message) -> Result<(), MentorError>;
    async fn save_intake(&self, intake: &IntakeRecord) -> Result<(), MentorError>;
    async fn save_report(&self, submission_id: &str, report: &MentorReport) -> Result<(), MentorError>;

    /// Messages in the order they were appended.
    async fn load_messages(&self) -> Result<Vec<Message>, MentorError>;
    /// Most recently saved intake, if any.
    async fn load_intake(&self) -> Result<Option<IntakeRecord>, MentorError>;
}

/// A mentor report as it was filed against a submission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredReport {
    pub submission_id: String,
    pub report: MentorReport,
}

/// One line of the append-only log.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "record", rename_all = "snake_case")]
pub enum StoreRecord {
    Message(Message),
    Intake(IntakeRecord),
    Report(StoredReport),
}
