use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::MentorError;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MentorConfig {
    /// Base URL of an OpenAI-compatible server, without the `/v1/...` suffix.
    pub api_base_url: String,
    pub model: String,
    pub api_key: Option<String>,
    pub temperature: f32,
    pub connect_timeout_secs: u64,
    /// Whole-request timeout. None by default: a stream is never cut mid-way.
    pub request_timeout_secs: Option<u64>,
    /// How many trailing conversation messages go into each request.
    pub history_window: usize,
    /// How many follow-up lines the lexer may join onto an unparseable `data:` line.
    pub max_continuation_lines: usize,
    pub export_filename: String,
}

impl Default for MentorConfig {
    fn default() -> Self {
        Self {
            api_base_url: "http://localhost:8080".to_string(),
            model: "mentor".to_string(),
            api_key: None,
            temperature: 0.4,
            connect_timeout_secs: 10,
            request_timeout_secs: None,
            history_window: 24,
            max_continuation_lines: 8,
            export_filename: "project-export.json".to_string(),
        }
    }
}

impl MentorConfig {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, MentorError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .map_err(|e| MentorError::Config(format!("{}: {}", path.display(), e)))?;
        let config: MentorConfig = serde_json::from_str(&raw)
            .map_err(|e| MentorError::Config(format!("{}: {}", path.display(), e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), MentorError> {
        if self.api_base_url.trim().is_empty() {
            return Err(MentorError::Config("api_base_url is empty".to_string()));
        }
        if self.history_window == 0 {
            return Err(MentorError::Config("history_window must be at least 1".to_string()));
        }
        if self.export_filename.trim().is_empty() {
            return Err(MentorError::Config("export_filename is empty".to_string()));
        }
        Ok(())
    }
}
