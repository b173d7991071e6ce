use async_trait::async_trait;
use tokio::sync::Mutex;

use super::{ConversationStore, StoredReport};
use crate::commands::types::MentorReport;
use crate::error::MentorError;
use crate::intake::types::IntakeRecord;
use crate::kernel::event::Message;

#[derive(Debug, Default)]
pub struct InMemoryConversationStore {
    messages: Mutex<Vec<Message>>,
    intake: Mutex<Option<IntakeRecord>>,
    reports: Mutex<Vec<StoredReport>>,
}

impl InMemoryConversationStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn messages(&self) -> Vec<Message> {
        self.messages.lock().await.clone()
    }

    pub async fn intake(&self) -> Option<IntakeRecord> {
        self.intake.lock().await.clone()
    }

    pub async fn reports(&self) -> Vec<StoredReport> {
        self.reports.lock().await.clone()
    }
}

#[async_trait]
impl ConversationStore for InMemoryConversationStore {
    async fn append_message(&self, message: &Message) -> Result<(), MentorError> {
        self.messages.lock().await.push(message.clone());
        Ok(())
    }

    async fn save_intake(&self, intake: &IntakeRecord) -> Result<(), MentorError> {
        *self.intake.lock().await = Some(intake.clone());
        Ok(())
    }

    async fn save_report(&self, submission_id: &str, report: &MentorReport) -> Result<(), MentorError> {
        self.reports.lock().await.push(StoredReport {
            submission_id: submission_id.to_string(),
            report: report.clone(),
        });
        Ok(())
    }

    async fn load_messages(&self) -> Result<Vec<Message>, MentorError> {
        Ok(self.messages().await)
    }

    async fn load_intake(&self) -> Result<Option<IntakeRecord>, MentorError> {
        Ok(self.intake().await)
    }
}
