use std::time::Duration;

use async_trait::async_trait;
use futures_util::StreamExt;
use reqwest::Client;
use tracing::{debug, warn};

use super::{ChatRequest, ChatTransport, ChunkStream};
use crate::config::MentorConfig;
use crate::error::MentorError;

/// OpenAI-compatible `chat/completions` endpoint, streamed.
#[derive(Clone)]
pub struct HttpChatTransport {
    client: Client,
    base_url: String,
    api_key: Option<String>,
}

impl HttpChatTransport {
    pub fn new(config: &MentorConfig) -> Result<Self, MentorError> {
        let mut builder = Client::builder().connect_timeout(Duration::from_secs(config.connect_timeout_secs));
        // No whole-request timeout unless asked for: it would cut long streams.
        if let Some(secs) = config.request_timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let client = builder
            .build()
            .map_err(|e| MentorError::Config(format!("http client: {}", e)))?;

        Ok(Self {
            client,
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/v1/chat/completions", self.base_url)
    }
}

#[async_trait]
impl ChatTransport for HttpChatTransport {
    async fn open(&self, request: &ChatRequest) -> Result<ChunkStream, MentorError> {
        debug!("Opening chat stream: {} messages, model {}", request.messages.len(), request.model);

        let mut req = self.client.post(self.endpoint()).json(request);
        if let Some(key) = &self.api_key {
            req = req.bearer_auth(key);
        }

        let response = req.send().await.map_err(|e| {
            warn!("Chat request failed: {}", e);
            MentorError::Transport(e.to_string())
        })?;

        if !response.status().is_success() {
            return Err(MentorError::Transport(format!("server returned {}", response.status())));
        }

        Ok(response
            .bytes_stream()
            .map(|chunk| chunk.map_err(|e| MentorError::Transport(e.to_string())))
            .boxed())
    }
}
