use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use super::handler::OperationHandler;
use crate::commands::types::FileOperation;
use crate::error::MentorError;
use crate::services::downloads::{Download, DownloadOffer};
use crate::services::workspace::{parent_of, FileSystem};

/// Typed form of a `FileOperation`, checked for the fields its action needs.
#[derive(Debug, Clone, PartialEq)]
pub enum FileCommand<'a> {
    Create { path: &'a str, content: &'a str, language: Option<&'a str> },
    Update { path: &'a str, content: &'a str },
    Delete { path: &'a str, recursive: bool },
    Rename { from: &'a str, to: String },
    Export { root: Option<&'a str>, filename: Option<&'a str> },
}

impl<'a> FileCommand<'a> {
    pub fn parse(op: &'a FileOperation) -> Result<Self, MentorError> {
        let path = move || {
            op.path
                .as_deref()
                .filter(|p| !p.trim().is_empty())
                .ok_or(MentorError::MissingField("path"))
        };
        let content = op.content.as_deref().unwrap_or_default();

        match op.action.trim().to_ascii_lowercase().as_str() {
            "create" => Ok(FileCommand::Create {
                path: path()?,
                content,
                language: op.language.as_deref(),
            }),
            "update" => Ok(FileCommand::Update { path: path()?, content }),
            "delete" => Ok(FileCommand::Delete {
                path: path()?,
                recursive: op.recursive.unwrap_or(false),
            }),
            "rename" => {
                let from = path()?;
                Ok(FileCommand::Rename { from, to: rename_target(from, op)? })
            }
            "export" => Ok(FileCommand::Export {
                root: op.path.as_deref().filter(|p| !p.trim().is_empty()),
                filename: op.filename.as_deref().filter(|f| !f.trim().is_empty()),
            }),
            _ => Err(MentorError::UnknownAction(op.action.clone())),
        }
    }
}

/// `newPath` wins; otherwise `newName` is placed next to the old path.
fn rename_target(from: &str, op: &FileOperation) -> Result<String, MentorError> {
    if let Some(new_path) = op.new_path.as_deref().filter(|p| !p.trim().is_empty()) {
        return Ok(new_path.to_string());
    }
    let new_name = op
        .new_name
        .as_deref()
        .filter(|n| !n.trim().is_empty())
        .ok_or(MentorError::MissingField("newName"))?;
    let parent = parent_of(from.trim_end_matches('/'));
    Ok(if parent == "/" {
        format!("/{}", new_name)
    } else {
        format!("{}/{}", parent, new_name)
    })
}

pub struct FileOpsHandler {
    files: Arc<dyn FileSystem>,
    downloads: Arc<dyn DownloadOffer>,
    export_filename: String,
}

impl FileOpsHandler {
    pub fn new(files: Arc<dyn FileSystem>, downloads: Arc<dyn DownloadOffer>, export_filename: &str) -> Self {
        Self {
            files,
            downloads,
            export_filename: export_filename.to_string(),
        }
    }
}

#[async_trait]
impl OperationHandler for FileOpsHandler {
    type Op = FileOperation;

    async fn apply(&self, op: &FileOperation) -> Result<String, MentorError> {
        let command = FileCommand::parse(op)?;
        debug!("Applying file command {:?}", std::mem::discriminant(&command));

        match command {
            FileCommand::Create { path, content, language } => {
                self.files.create_file(path, content, language).await.map_err(MentorError::apply)?;
                Ok(format!("created {}", path))
            }
            FileCommand::Update { path, content } => {
                self.files.update_file(path, content).await.map_err(MentorError::apply)?;
                Ok(format!("updated {}", path))
            }
            FileCommand::Delete { path, recursive } => {
                self.files.delete(path, recursive).await.map_err(MentorError::apply)?;
                Ok(format!("deleted {}", path))
            }
            FileCommand::Rename { from, to } => {
                self.files.rename(from, &to).await.map_err(MentorError::apply)?;
                Ok(format!("renamed {} to {}", from, to))
            }
            FileCommand::Export { root, filename } => {
                let tree = self.files.export(root).await.map_err(MentorError::apply)?;
                let contents = serde_json::to_string_pretty(&tree)
                    .map_err(|e| MentorError::OperationApply(format!("serializing export: {}", e)))?;
                let filename = filename.unwrap_or(&self.export_filename).to_string();
                self.downloads
                    .offer(Download {
                        filename: filename.clone(),
                        mime_type: "application/json".to_string(),
                        contents,
                    })
                    .await
                    .map_err(MentorError::apply)?;
                Ok(format!("exported {} as {}", root.unwrap_or("/"), filename))
            }
        }
    }
}
