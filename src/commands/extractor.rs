use serde_json::Value;
use tracing::debug;

use super::types::{ExtractedCommands, MentorReport};

pub const FENCE: &str = "```";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandTag {
    FileOps,
    MentorReport,
    MilestoneOps,
}

impl CommandTag {
    pub const ALL: [CommandTag; 3] = [CommandTag::FileOps, CommandTag::MentorReport, CommandTag::MilestoneOps];

    pub fn name(&self) -> &'static str {
        match self {
            CommandTag::FileOps => "FILE_OPS",
            CommandTag::MentorReport => "MENTOR_REPORT",
            CommandTag::MilestoneOps => "MILESTONE_OPS",
        }
    }
}

/// Inner text of the first `TAG` fence, trimmed. None when there is no opening
/// fence or it is never closed.
pub fn fenced_body<'a>(text: &'a str, tag: CommandTag) -> Option<&'a str> {
    let opener = format!("{}{}", FENCE, tag.name());
    let mut search_from = 0;

    while let Some(rel) = text[search_from..].find(&opener) {
        let body_start = search_from + rel + opener.len();
        // "```FILE_OPS" must not match "```FILE_OPS_V2", but a body may follow the tag directly.
        let at_boundary = text[body_start..]
            .chars()
            .next()
            .map_or(true, |c| !(c.is_alphanumeric() || c == '_'));
        if at_boundary {
            let body_end = body_start + text[body_start..].find(FENCE)?;
            return Some(text[body_start..body_end].trim());
        }
        search_from = body_start;
    }
    None
}

/// Parses one tag's block. Absent on any failure, never partial.
pub fn extract_tag(text: &str, tag: CommandTag) -> Option<Value> {
    let body = fenced_body(text, tag)?;
    match serde_json::from_str::<Value>(body) {
        Ok(value) => Some(value),
        Err(e) => {
            debug!("Ignoring malformed {} block: {}", tag.name(), e);
            None
        }
    }
}

pub fn extract_file_ops(text: &str) -> Option<Value> {
    extract_tag(text, CommandTag::FileOps)
}

pub fn extract_mentor_report(text: &str) -> Option<MentorReport> {
    extract_tag(text, CommandTag::MentorReport).map(MentorReport)
}

pub fn extract_milestone_ops(text: &str) -> Option<Value> {
    extract_tag(text, CommandTag::MilestoneOps)
}

/// Runs the three scanners over a finalized reply. Each tag is independent of
/// the others.
pub fn extract_commands(text: &str) -> ExtractedCommands {
    ExtractedCommands {
        file_ops: extract_file_ops(text),
        mentor_report: extract_mentor_report(text),
        milestone_ops: extract_milestone_ops(text),
    }
}
