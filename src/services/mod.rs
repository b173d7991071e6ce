pub mod llm;
pub mod workspace;
pub mod tracker;
pub mod downloads;

use std::sync::Arc;

use downloads::{CollectingDownloads, DownloadOffer};
use tracker::{InMemoryMilestoneTracker, MilestoneTracker};
use workspace::{FileSystem, InMemoryFileSystem};

/// External state the dispatcher applies confirmed operations to.
#[derive(Clone)]
pub struct Collaborators {
    pub files: Arc<dyn FileSystem>,
    pub tracker: Arc<dyn MilestoneTracker>,
    pub downloads: Arc<dyn DownloadOffer>,
}

impl Collaborators {
    pub fn new(
        files: Arc<dyn FileSystem>,
        tracker: Arc<dyn MilestoneTracker>,
        downloads: Arc<dyn DownloadOffer>,
    ) -> Self {
        Self { files, tracker, downloads }
    }

    pub fn in_memory() -> Self {
        Self::new(
            Arc::new(InMemoryFileSystem::new()),
            Arc::new(InMemoryMilestoneTracker::new()),
            Arc::new(CollectingDownloads::new()),
        )
    }
}
