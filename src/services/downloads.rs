use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use tokio::sync::Mutex;

#[derive(Debug, Clone, PartialEq)]
pub struct Download {
    pub filename: String,
    pub mime_type: String,
    pub contents: String,
}

/// Hands a generated file to the user.
#[async_trait]
pub trait DownloadOffer: Send + Sync {
    async fn offer(&self, download: Download) -> Result<()>;
}

/// Keeps every offer in memory.
#[derive(Debug, Default)]
pub struct CollectingDownloads {
    offered: Mutex<Vec<Download>>,
}

impl CollectingDownloads {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn offered(&self) -> Vec<Download> {
        self.offered.lock().await.clone()
    }
}

#[async_trait]
impl DownloadOffer for CollectingDownloads {
    async fn offer(&self, download: Download) -> Result<()> {
        self.offered.lock().await.push(download);
        Ok(())
    }
}

/// Writes offers into a directory.
#[derive(Debug, Clone)]
pub struct DirectoryDownloads {
    dir: PathBuf,
}

impl DirectoryDownloads {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

#[async_trait]
impl DownloadOffer for DirectoryDownloads {
    async fn offer(&self, download: Download) -> Result<()> {
        if download.filename.is_empty()
            || download.filename.contains(['/', '\\'])
            || download.filename.starts_with('.')
        {
            bail!("refusing download filename {:?}", download.filename);
        }
        tokio::fs::create_dir_all(&self.dir)
            .await
            .with_context(|| format!("creating {}", self.dir.display()))?;
        let target = self.dir.join(&download.filename);
        tokio::fs::write(&target, download.contents.as_bytes())
            .await
            .with_context(|| format!("writing {}", target.display()))?;
        tracing::info!("Download written to {}", target.display());
        Ok(())
    }
}
