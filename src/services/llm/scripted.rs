use std::collections::VecDeque;

use async_trait::async_trait;
use bytes::Bytes;
use futures_util::StreamExt;
use serde_json::json;
use tokio::sync::Mutex;

use super::{ChatRequest, ChatTransport, ChunkStream};
use crate::error::MentorError;

/// One canned response: byte chunks, then optionally a read failure.
#[derive(Debug, Clone, Default)]
pub struct Script {
    pub chunks: Vec<Bytes>,
    pub fail_with: Option<String>,
}

impl Script {
    pub fn from_chunks<I, C>(chunks: I) -> Self
    where
        I: IntoIterator<Item = C>,
        C: Into<Bytes>,
    {
        Self {
            chunks: chunks.into_iter().map(Into::into).collect(),
            fail_with: None,
        }
    }

    /// Event-stream framing of `reply`: one `data:` event per `delta_chars`
    /// characters, a `[DONE]` sentinel, then cut into `chunk_bytes`-sized pieces
    /// with no regard for line or UTF-8 boundaries.
    pub fn reply(reply: &str, delta_chars: usize, chunk_bytes: usize) -> Self {
        let wire = sse_frames(reply, delta_chars);
        let step = chunk_bytes.max(1);
        Self {
            chunks: wire.as_bytes().chunks(step).map(Bytes::copy_from_slice).collect(),
            fail_with: None,
        }
    }

    pub fn failing(mut self, reason: &str) -> Self {
        self.fail_with = Some(reason.to_string());
        self
    }
}

pub fn sse_frames(reply: &str, delta_chars: usize) -> String {
    let chars: Vec<char> = reply.chars().collect();
    let mut wire = String::from(": keep-alive\n\n");
    for piece in chars.chunks(delta_chars.max(1)) {
        let delta: String = piece.iter().collect();
        let payload = json!({ "choices": [{ "delta": { "content": delta } }] });
        wire.push_str(&format!("data: {}\n\n", payload));
    }
    wire.push_str("data: [DONE]\n\n");
    wire
}

/// Replays queued scripts in order and records every request it was sent.
#[derive(Debug, Default)]
pub struct ScriptedTransport {
    scripts: Mutex<VecDeque<Script>>,
    requests: Mutex<Vec<ChatRequest>>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_scripts(scripts: impl IntoIterator<Item = Script>) -> Self {
        Self {
            scripts: Mutex::new(scripts.into_iter().collect()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub async fn push(&self, script: Script) {
        self.scripts.lock().await.push_back(script);
    }

    pub async fn requests(&self) -> Vec<ChatRequest> {
        self.requests.lock().await.clone()
    }
}

#[async_trait]
impl ChatTransport for ScriptedTransport {
    async fn open(&self, request: &ChatRequest) -> Result<ChunkStream, MentorError> {
        self.requests.lock().await.push(request.clone());
        let script = self
            .scripts
            .lock()
            .await
            .pop_front()
            .ok_or_else(|| MentorError::Transport("no scripted response left".to_string()))?;

        let mut items: Vec<Result<Bytes, MentorError>> = script.chunks.into_iter().map(Ok).collect();
        if let Some(reason) = script.fail_with {
            items.push(Err(MentorError::Transport(reason)));
        }
        Ok(futures_util::stream::iter(items).boxed())
    }
}
