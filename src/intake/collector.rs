use std::collections::HashMap;

use tracing::{debug, info};

use super::types::{IntakeField, IntakeRecord, IntakeState, IntakeStep};
use crate::error::MentorError;

pub const CONFIRM_WORD: &str = "yes";
pub const REJECT_WORD: &str = "no";

/// Intake negotiation. Pure: (state, text) -> (step, next state).
/// The session owns the state and applies the transition.
pub struct IntakeCollector;

impl IntakeCollector {
    pub fn new() -> Self {
        Self
    }

    pub fn assess(&self, state: &IntakeState, text: &str) -> (IntakeStep, IntakeState) {
        match state {
            IntakeState::Confirmed(_) => (IntakeStep::PassThrough, state.clone()),

            IntakeState::AwaitingConfirmation(record) => {
                // Never reparse here: anything but yes/no re-asks.
                match interpret_confirmation(text) {
                    Ok(true) => {
                        info!("Intake confirmed");
                        (IntakeStep::Confirmed(record.clone()), IntakeState::Confirmed(record.clone()))
                    }
                    Ok(false) => {
                        info!("Intake rejected, collecting again");
                        (IntakeStep::Rejected, IntakeState::Collecting)
                    }
                    Err(e) => {
                        debug!("{}", e);
                        (IntakeStep::Reask(record.clone()), state.clone())
                    }
                }
            }

            IntakeState::Collecting => match parse_intake(text) {
                Ok(record) => {
                    info!("Intake parsed, awaiting confirmation");
                    (
                        IntakeStep::Parsed(record.clone()),
                        IntakeState::AwaitingConfirmation(record),
                    )
                }
                Err(e) => {
                    debug!("{}", e);
                    (IntakeStep::NeedsFormat, IntakeState::Collecting)
                }
            },
        }
    }
}

impl Default for IntakeCollector {
    fn default() -> Self {
        Self::new()
    }
}

/// Extracts the four intake fields from `key: value` lines.
///
/// Line order and unrelated lines do not matter. A later line for the same field
/// overrides an earlier one; empty values never count.
pub fn parse_intake(text: &str) -> Result<IntakeRecord, MentorError> {
    let mut fields: HashMap<IntakeField, String> = HashMap::new();

    for line in text.lines() {
        let Some((raw_key, raw_value)) = line.split_once(':') else {
            continue;
        };
        let value = raw_value.trim();
        if value.is_empty() {
            continue;
        }
        if let Some(field) = IntakeField::from_alias(&normalize_key(raw_key)) {
            fields.insert(field, value.to_string());
        }
    }

    let missing: Vec<&'static str> = IntakeField::ALL
        .iter()
        .filter(|f| !fields.contains_key(*f))
        .map(|f| f.label())
        .collect();
    if !missing.is_empty() {
        return Err(MentorError::IntakeParse { missing });
    }

    let mut take = |f: IntakeField| fields.remove(&f).unwrap_or_default();
    Ok(IntakeRecord {
        project_idea: take(IntakeField::ProjectIdea),
        tech_stack: take(IntakeField::TechStack),
        skill_level: take(IntakeField::SkillLevel),
        timeline: take(IntakeField::Timeline),
    })
}

/// Exact, case-insensitive yes/no.
pub fn interpret_confirmation(text: &str) -> Result<bool, MentorError> {
    let reply = text.trim();
    if reply.eq_ignore_ascii_case(CONFIRM_WORD) {
        Ok(true)
    } else if reply.eq_ignore_ascii_case(REJECT_WORD) {
        Ok(false)
    } else {
        Err(MentorError::ConfirmationMismatch { reply: reply.to_string() })
    }
}

// "- Project_Idea " -> "project idea"
fn normalize_key(raw: &str) -> String {
    raw.trim()
        .trim_start_matches(|c: char| c == '-' || c == '*' || c == '•')
        .to_lowercase()
        .replace(['_', '-'], " ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

pub fn format_prompt() -> String {
    let mut text = String::from(
        "Before we start, I need to know a bit about your project. \
         Please reply in exactly this format:\n\n",
    );
    for field in IntakeField::ALL {
        text.push_str(field.label());
        text.push_str(": ...\n");
    }
    text.push_str("\nAll four lines are required.");
    text
}

pub fn confirmation_prompt(record: &IntakeRecord) -> String {
    format!(
        "Here is what I understood:\n\n\
         {}: {}\n{}: {}\n{}: {}\n{}: {}\n\n\
         Is this correct? Reply \"yes\" to confirm or \"no\" to start over.",
        IntakeField::ProjectIdea.label(),
        record.project_idea,
        IntakeField::TechStack.label(),
        record.tech_stack,
        IntakeField::SkillLevel.label(),
        record.skill_level,
        IntakeField::Timeline.label(),
        record.timeline,
    )
}

pub fn confirmed_reply(record: &IntakeRecord) -> String {
    format!(
        "Great, let's build \"{}\" together. Ask me anything about your next step and \
         I'll guide you through it rather than hand you the answer.",
        record.project_idea
    )
}

pub fn rejected_reply() -> String {
    format!("No problem, let's try again.\n\n{}", format_prompt())
}

/// Text the collector sends for a step. None for `PassThrough`.
pub fn reply_for(step: &IntakeStep) -> Option<String> {
    match step {
        IntakeStep::NeedsFormat => Some(format_prompt()),
        IntakeStep::Parsed(record) | IntakeStep::Reask(record) => Some(confirmation_prompt(record)),
        IntakeStep::Confirmed(record) => Some(confirmed_reply(record)),
        IntakeStep::Rejected => Some(rejected_reply()),
        IntakeStep::PassThrough => None,
    }
}
