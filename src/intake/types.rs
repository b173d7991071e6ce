use serde::{Deserialize, Serialize};

/// The four project facts gathered before any guidance is given.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IntakeRecord {
    pub project_idea: String,
    pub tech_stack: String,
    pub skill_level: String,
    pub timeline: String,
}

/// Which intake field a `key: value` line feeds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IntakeField {
    ProjectIdea,
    TechStack,
    SkillLevel,
    Timeline,
}

impl IntakeField {
    pub const ALL: [IntakeField; 4] = [
        IntakeField::ProjectIdea,
        IntakeField::TechStack,
        IntakeField::SkillLevel,
        IntakeField::Timeline,
    ];

    /// Label used in prompts and echoes.
    pub fn label(&self) -> &'static str {
        match self {
            IntakeField::ProjectIdea => "Project idea",
            IntakeField::TechStack => "Tech stack",
            IntakeField::SkillLevel => "Skill level",
            IntakeField::Timeline => "Timeline",
        }
    }

    /// Case-insensitive alias table. `key` must already be normalized
    /// (lowercase, single spaces).
    pub fn from_alias(key: &str) -> Option<Self> {
        match key {
            "project idea" | "project" | "idea" => Some(IntakeField::ProjectIdea),
            "tech stack" | "tech" | "stack" | "technology" | "technologies" => {
                Some(IntakeField::TechStack)
            }
            "skill level" | "skill" | "skills" | "level" | "experience" => {
                Some(IntakeField::SkillLevel)
            }
            "timeline" | "timeframe" | "time frame" | "deadline" => Some(IntakeField::Timeline),
            _ => None,
        }
    }
}

/// Intake negotiation state.
///
/// The parsed record lives inside the variant, so "awaiting confirmation" and
/// "confirmed" cannot both hold, and a confirmed session always has a record.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum IntakeState {
    #[default]
    Collecting,
    AwaitingConfirmation(IntakeRecord),
    Confirmed(IntakeRecord),
}

impl IntakeState {
    pub fn phase(&self) -> IntakePhase {
        match self {
            IntakeState::Collecting => IntakePhase::Collecting,
            IntakeState::AwaitingConfirmation(_) => IntakePhase::AwaitingConfirmation,
            IntakeState::Confirmed(_) => IntakePhase::Confirmed,
        }
    }
}

/// Content-free view of `IntakeState` for telemetry and logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IntakePhase {
    Collecting,
    AwaitingConfirmation,
    Confirmed,
}

/// What the collector decided for one user message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IntakeStep {
    /// Required fields missing; the reply repeats the required format.
    NeedsFormat,
    /// All four fields parsed; the reply echoes them and asks yes/no.
    Parsed(IntakeRecord),
    /// Reply other than yes/no while awaiting confirmation.
    Reask(IntakeRecord),
    /// Explicit "yes".
    Confirmed(IntakeRecord),
    /// Explicit "no"; record discarded.
    Rejected,
    /// Intake already confirmed; the message belongs to the mentor stream.
    PassThrough,
}
