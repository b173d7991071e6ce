use std::collections::BTreeMap;

use anyhow::{anyhow, bail, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

/// The project's virtual file system, as far as the mentor may touch it.
#[async_trait]
pub trait FileSystem: Send + Sync {
    async fn create_file(&self, path: &str, content: &str, language: Option<&str>) -> Result<()>;
    async fn update_file(&self, path: &str, content: &str) -> Result<()>;
    async fn delete(&self, path: &str, recursive: bool) -> Result<()>;
    async fn rename(&self, from: &str, to: &str) -> Result<()>;
    /// Whole tree, or the subtree at `root`.
    async fn export(&self, root: Option<&str>) -> Result<ProjectTree>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    File,
    Directory,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectTree {
    pub name: String,
    pub path: String,
    pub kind: NodeKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<ProjectTree>,
}

#[derive(Debug, Clone, PartialEq)]
enum Node {
    File { content: String, language: Option<String> },
    Directory,
}

/// BTreeMap-backed tree keyed by normalized absolute path. "/" always exists.
#[derive(Debug, Default)]
pub struct InMemoryFileSystem {
    nodes: Mutex<BTreeMap<String, Node>>,
}

impl InMemoryFileSystem {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn read(&self, path: &str) -> Option<String> {
        let nodes = self.nodes.lock().await;
        match nodes.get(&normalize(path)) {
            Some(Node::File { content, .. }) => Some(content.clone()),
            _ => None,
        }
    }

    pub async fn exists(&self, path: &str) -> bool {
        let path = normalize(path);
        path == "/" || self.nodes.lock().await.contains_key(&path)
    }

    pub async fn paths(&self) -> Vec<String> {
        self.nodes.lock().await.keys().cloned().collect()
    }
}

#[async_trait]
impl FileSystem for InMemoryFileSystem {
    async fn create_file(&self, path: &str, content: &str, language: Option<&str>) -> Result<()> {
        let path = normalize(path);
        if path == "/" {
            bail!("cannot create a file at the project root");
        }
        let mut nodes = self.nodes.lock().await;
        if let Some(Node::Directory) = nodes.get(&path) {
            bail!("{} is a directory", path);
        }
        ensure_parents(&mut nodes, &path)?;
        nodes.insert(
            path,
            Node::File {
                content: content.to_string(),
                language: language.map(str::to_string),
            },
        );
        Ok(())
    }

    async fn update_file(&self, path: &str, content: &str) -> Result<()> {
        let path = normalize(path);
        let mut nodes = self.nodes.lock().await;
        match nodes.get_mut(&path) {
            Some(Node::File { content: existing, .. }) => {
                *existing = content.to_string();
                Ok(())
            }
            Some(Node::Directory) => bail!("{} is a directory", path),
            None => bail!("no such file: {}", path),
        }
    }

    async fn delete(&self, path: &str, recursive: bool) -> Result<()> {
        let path = normalize(path);
        if path == "/" {
            bail!("cannot delete the project root");
        }
        let mut nodes = self.nodes.lock().await;
        let node = nodes.get(&path).ok_or_else(|| anyhow!("no such file or directory: {}", path))?;

        if *node == Node::Directory {
            let descendants = descendants_of(&nodes, &path);
            if !descendants.is_empty() && !recursive {
                bail!("directory {} is not empty", path);
            }
            for key in descendants {
                nodes.remove(&key);
            }
        }
        nodes.remove(&path);
        Ok(())
    }

    async fn rename(&self, from: &str, to: &str) -> Result<()> {
        let from = normalize(from);
        let to = normalize(to);
        if from == "/" || to == "/" {
            bail!("cannot rename the project root");
        }
        if from == to {
            return Ok(());
        }
        if to.starts_with(&format!("{}/", from)) {
            bail!("cannot move {} into itself", from);
        }

        let mut nodes = self.nodes.lock().await;
        if !nodes.contains_key(&from) {
            bail!("no such file or directory: {}", from);
        }
        if nodes.contains_key(&to) {
            bail!("{} already exists", to);
        }
        ensure_parents(&mut nodes, &to)?;

        let mut moved = vec![from.clone()];
        moved.extend(descendants_of(&nodes, &from));
        for old in moved {
            if let Some(node) = nodes.remove(&old) {
                let new = format!("{}{}", to, &old[from.len()..]);
                nodes.insert(new, node);
            }
        }
        Ok(())
    }

    async fn export(&self, root: Option<&str>) -> Result<ProjectTree> {
        let root = normalize(root.unwrap_or("/"));
        let nodes = self.nodes.lock().await;
        if root != "/" && !nodes.contains_key(&root) {
            bail!("no such file or directory: {}", root);
        }
        Ok(build_tree(&nodes, &root))
    }
}

/// "src//a.ts/" -> "/src/a.ts"
pub fn normalize(path: &str) -> String {
    let parts: Vec<&str> = path.split('/').filter(|p| !p.is_empty() && *p != ".").collect();
    format!("/{}", parts.join("/"))
}

pub fn parent_of(path: &str) -> String {
    match path.rsplit_once('/') {
        Some(("", _)) | None => "/".to_string(),
        Some((parent, _)) => parent.to_string(),
    }
}

fn name_of(path: &str) -> String {
    path.rsplit('/').next().unwrap_or_default().to_string()
}

fn ensure_parents(nodes: &mut BTreeMap<String, Node>, path: &str) -> Result<()> {
    let mut current = parent_of(path);
    let mut missing = Vec::new();
    while current != "/" {
        match nodes.get(&current) {
            Some(Node::Directory) => break,
            Some(Node::File { .. }) => bail!("{} is a file", current),
            None => {
                missing.push(current.clone());
                current = parent_of(&current);
            }
        }
    }
    for dir in missing {
        nodes.insert(dir, Node::Directory);
    }
    Ok(())
}

fn descendants_of(nodes: &BTreeMap<String, Node>, path: &str) -> Vec<String> {
    let prefix = if path == "/" { "/".to_string() } else { format!("{}/", path) };
    nodes
        .range(prefix.clone()..)
        .take_while(|(k, _)| k.starts_with(&prefix))
        .map(|(k, _)| k.clone())
        .collect()
}

fn build_tree(nodes: &BTreeMap<String, Node>, path: &str) -> ProjectTree {
    match nodes.get(path) {
        Some(Node::File { content, language }) => ProjectTree {
            name: name_of(path),
            path: path.to_string(),
            kind: NodeKind::File,
            content: Some(content.clone()),
            language: language.clone(),
            children: Vec::new(),
        },
        // Root is an implicit directory.
        _ => {
            let children = descendants_of(nodes, path)
                .into_iter()
                .filter(|k| parent_of(k) == path)
                .map(|k| build_tree(nodes, &k))
                .collect();
            ProjectTree {
                name: if path == "/" { String::new() } else { name_of(path) },
                path: path.to_string(),
                kind: NodeKind::Directory,
                content: None,
                language: None,
                children,
            }
        }
    }
}
