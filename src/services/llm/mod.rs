pub mod client;
pub mod prompt;
pub mod scripted;

use async_trait::async_trait;
use bytes::Bytes;
use futures_util::stream::BoxStream;
use serde::{Deserialize, Serialize};

use crate::error::MentorError;

pub use client::HttpChatTransport;
pub use scripted::{Script, ScriptedTransport};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: String) -> Self {
        Self { role: "system".to_string(), content }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub stream: bool,
    pub temperature: f32,
}

/// Raw response bytes, in whatever pieces the transport delivers them.
pub type ChunkStream = BoxStream<'static, Result<Bytes, MentorError>>;

/// Opens one streamed assistant response.
#[async_trait]
pub trait ChatTransport: Send + Sync {
    async fn open(&self, request: &ChatRequest) -> Result<ChunkStream, MentorError>;
}
