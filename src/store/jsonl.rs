use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::warn;

use super::{ConversationStore, StoreRecord, StoredReport};
use crate::commands::types::MentorReport;
use crate::error::MentorError;
use crate::intake::types::IntakeRecord;
use crate::kernel::event::Message;

/// One JSON record per line. Loading replays the file; a line that no longer
/// parses is skipped with a warning instead of failing the whole load.
pub struct JsonlConversationStore {
    path: PathBuf,
    // Serializes appends so concurrent writers never interleave a line.
    write_lock: Mutex<()>,
}

impl JsonlConversationStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn append(&self, record: &StoreRecord) -> Result<(), MentorError> {
        let mut line = serde_json::to_string(record).map_err(|e| MentorError::Store(e.to_string()))?;
        line.push('\n');

        let _guard = self.write_lock.lock().await;
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).await.map_err(store_io)?;
        }
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await
            .map_err(store_io)?;
        file.write_all(line.as_bytes()).await.map_err(store_io)?;
        file.flush().await.map_err(store_io)?;
        Ok(())
    }

    async fn replay(&self) -> Result<Vec<StoreRecord>, MentorError> {
        let content = match fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(store_io(e)),
        };

        let mut records = Vec::new();
        for (number, line) in content.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<StoreRecord>(line) {
                Ok(record) => records.push(record),
                Err(e) => warn!("Skipping unreadable record at {}:{}: {}", self.path.display(), number + 1, e),
            }
        }
        Ok(records)
    }

    /// Reports filed so far, oldest first.
    pub async fn load_reports(&self) -> Result<Vec<StoredReport>, MentorError> {
        Ok(self
            .replay()
            .await?
            .into_iter()
            .filter_map(|r| match r {
                StoreRecord::Report(report) => Some(report),
                _ => None,
            })
            .collect())
    }
}

fn store_io(e: std::io::Error) -> MentorError {
    MentorError::Store(e.to_string())
}

#[async_trait]
impl ConversationStore for JsonlConversationStore {
    async fn append_message(&self, message: &Message) -> Result<(), MentorError> {
        self.append(&StoreRecord::Message(message.clone())).await
    }

    async fn save_intake(&self, intake: &IntakeRecord) -> Result<(), MentorError> {
        self.append(&StoreRecord::Intake(intake.clone())).await
    }

    async fn save_report(&self, submission_id: &str, report: &MentorReport) -> Result<(), MentorError> {
        self.append(&StoreRecord::Report(StoredReport {
            submission_id: submission_id.to_string(),
            report: report.clone(),
        }))
        .await
    }

    async fn load_messages(&self) -> Result<Vec<Message>, MentorError> {
        Ok(self
            .replay()
            .await?
            .into_iter()
            .filter_map(|r| match r {
                StoreRecord::Message(message) => Some(message),
                _ => None,
            })
            .collect())
    }

    async fn load_intake(&self) -> Result<Option<IntakeRecord>, MentorError> {
        Ok(self
            .replay()
            .await?
            .into_iter()
            .filter_map(|r| match r {
                StoreRecord::Intake(intake) => Some(intake),
                _ => None,
            })
            .last())
    }
}
