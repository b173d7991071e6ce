use std::collections::HashMap;

use anyhow::{bail, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

/// Only the provided fields are applied.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MilestonePatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_date: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TaskPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    /// Percent, 0..=100.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub progress: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Milestone/task records keyed by identifier.
#[async_trait]
pub trait MilestoneTracker: Send + Sync {
    async fn update_milestone(&self, milestone_id: &str, patch: &MilestonePatch) -> Result<()>;
    async fn update_task(&self, task_id: &str, patch: &TaskPatch) -> Result<()>;
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Milestone {
    pub id: String,
    pub title: String,
    pub description: String,
    pub status: String,
    pub due_date: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    pub milestone_id: String,
    pub title: String,
    pub description: String,
    pub status: String,
    pub progress: u8,
}

#[derive(Debug, Default)]
pub struct InMemoryMilestoneTracker {
    milestones: Mutex<HashMap<String, Milestone>>,
    tasks: Mutex<HashMap<String, Task>>,
}

impl InMemoryMilestoneTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert_milestone(&self, milestone: Milestone) {
        self.milestones.lock().await.insert(milestone.id.clone(), milestone);
    }

    pub async fn insert_task(&self, task: Task) {
        self.tasks.lock().await.insert(task.id.clone(), task);
    }

    pub async fn milestone(&self, id: &str) -> Option<Milestone> {
        self.milestones.lock().await.get(id).cloned()
    }

    pub async fn task(&self, id: &str) -> Option<Task> {
        self.tasks.lock().await.get(id).cloned()
    }
}

#[async_trait]
impl MilestoneTracker for InMemoryMilestoneTracker {
    async fn update_milestone(&self, milestone_id: &str, patch: &MilestonePatch) -> Result<()> {
        let mut milestones = self.milestones.lock().await;
        let Some(m) = milestones.get_mut(milestone_id) else {
            bail!("milestone {} not found", milestone_id);
        };
        if let Some(status) = &patch.status {
            m.status = status.clone();
        }
        if let Some(title) = &patch.title {
            m.title = title.clone();
        }
        if let Some(description) = &patch.description {
            m.description = description.clone();
        }
        if let Some(due_date) = &patch.due_date {
            m.due_date = Some(due_date.clone());
        }
        Ok(())
    }

    async fn update_task(&self, task_id: &str, patch: &TaskPatch) -> Result<()> {
        let mut tasks = self.tasks.lock().await;
        let Some(t) = tasks.get_mut(task_id) else {
            bail!("task {} not found", task_id);
        };
        if let Some(status) = &patch.status {
            t.status = status.clone();
        }
        if let Some(progress) = patch.progress {
            t.progress = progress;
        }
        if let Some(title) = &patch.title {
            t.title = title.clone();
        }
        if let Some(description) = &patch.description {
            t.description = description.clone();
        }
        Ok(())
    }
}
