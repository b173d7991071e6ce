use super::{ChatMessage, ChatRequest};
use crate::config::MentorConfig;
use crate::intake::types::IntakeRecord;
use crate::kernel::event::{Message, Role};

const MENTOR_RULES: &str = "You are a patient programming mentor guiding a student through their own project. \
Never hand over complete solutions or whole files of finished code. Explain concepts, ask guiding questions, \
give hints and small illustrative snippets, and let the student write the real code. \
Keep answers focused on the student's next concrete step.";

const COMMAND_FORMATS: &str = "When the student explicitly asks you to change their project files, \
append one fenced block tagged FILE_OPS containing a JSON array of operations: \
{\"action\": \"create|update|delete|rename|export\", \"path\": \"/src/file.ts\", \"content\": \"...\", \
\"language\": \"typescript\", \"recursive\": false, \"newName\": \"...\", \"newPath\": \"...\", \"filename\": \"...\"}.\n\
To update their roadmap, append one fenced block tagged MILESTONE_OPS containing a JSON array of \
{\"action\": \"update_milestone\", \"milestone_id\": \"...\", \"status\": \"...\", \"title\": \"...\", \
\"description\": \"...\", \"due_date\": \"YYYY-MM-DD\"} or \
{\"action\": \"update_task\", \"task_id\": \"...\", \"status\": \"...\", \"progress\": 0-100, \"title\": \"...\", \"description\": \"...\"}.\n\
When reviewing a submission, append one fenced block tagged MENTOR_REPORT containing a JSON feedback object.\n\
Open each block with three backticks immediately followed by the tag and close it with three backticks. \
The student confirms file and milestone changes before they are applied.";

pub fn system_prompt(intake: Option<&IntakeRecord>) -> String {
    let mut prompt = format!("{}\n\n{}", MENTOR_RULES, COMMAND_FORMATS);
    if let Some(record) = intake {
        prompt.push_str(&format!(
            "\n\nStudent project:\n- Idea: {}\n- Tech stack: {}\n- Skill level: {}\n- Timeline: {}\n\
             Pitch explanations at the student's skill level.",
            record.project_idea, record.tech_stack, record.skill_level, record.timeline
        ));
    }
    prompt
}

/// System prompt plus the last `history_window` messages.
pub fn build_request(config: &MentorConfig, intake: Option<&IntakeRecord>, history: &[Message]) -> ChatRequest {
    let start = history.len().saturating_sub(config.history_window);
    let mut messages = Vec::with_capacity(history.len() - start + 1);
    messages.push(ChatMessage::system(system_prompt(intake)));
    for message in &history[start..] {
        // The in-flight placeholder for the reply being requested is never sent.
        if message.role == Role::Assistant && message.content.is_empty() {
            continue;
        }
        messages.push(ChatMessage {
            role: match message.role {
                Role::User => "user".to_string(),
                Role::Assistant => "assistant".to_string(),
            },
            content: message.content.clone(),
        });
    }

    ChatRequest {
        model: config.model.clone(),
        messages,
        stream: true,
        temperature: config.temperature,
    }
}
