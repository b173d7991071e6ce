use super::event::{Message, MessageId, MessageType, Role};
use crate::commands::types::{FileOperation, MentorReport};
use crate::intake::types::{IntakeRecord, IntakeState};

/// The only way session state mutates.
#[derive(Debug, Clone)]
pub enum SessionDelta {
    MessageAppended(Message),
    /// Replace the content of the in-flight assistant message with the reply so far.
    AssistantContent { id: MessageId, content: String },
    /// Final classification and commands of a finished assistant message.
    AssistantFinalized {
        id: MessageId,
        kind: MessageType,
        file_ops: Option<Vec<FileOperation>>,
        mentor_report: Option<MentorReport>,
    },
    IntakeTransition(IntakeState),
}

/// Messages in arrival order plus the intake negotiation.
#[derive(Debug, Clone, Default)]
pub struct ConversationSession {
    messages: Vec<Message>,
    intake: IntakeState,
    pub version: u64,
}

impl ConversationSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// State rebuilt from persisted history.
    pub fn restored(messages: Vec<Message>, intake: Option<IntakeRecord>) -> Self {
        Self {
            messages,
            intake: intake.map(IntakeState::Confirmed).unwrap_or_default(),
            version: 0,
        }
    }

    pub fn reduce(&mut self, delta: SessionDelta) {
        self.version += 1;

        match delta {
            SessionDelta::MessageAppended(message) => self.messages.push(message),
            SessionDelta::AssistantContent { id, content } => {
                // Only the last message, and only while it is the assistant's.
                if let Some(last) = self.last_assistant_mut(id) {
                    last.content = content;
                }
            }
            SessionDelta::AssistantFinalized { id, kind, file_ops, mentor_report } => {
                if let Some(last) = self.last_assistant_mut(id) {
                    last.kind = kind;
                    last.file_ops = file_ops;
                    last.mentor_report = mentor_report;
                }
            }
            SessionDelta::IntakeTransition(next) => self.intake = next,
        }
    }

    fn last_assistant_mut(&mut self, id: MessageId) -> Option<&mut Message> {
        self.messages
            .last_mut()
            .filter(|m| m.id == id && m.role == Role::Assistant)
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn intake(&self) -> &IntakeState {
        &self.intake
    }

    /// The confirmed intake record, if negotiation is over.
    pub fn confirmed_intake(&self) -> Option<&IntakeRecord> {
        match &self.intake {
            IntakeState::Confirmed(record) => Some(record),
            _ => None,
        }
    }

    pub fn confirmed(&self) -> bool {
        matches!(self.intake, IntakeState::Confirmed(_))
    }

    pub fn awaiting_confirmation(&self) -> bool {
        matches!(self.intake, IntakeState::AwaitingConfirmation(_))
    }
}
