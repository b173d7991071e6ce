pub mod event;
pub mod guard;
pub mod state;
pub mod session;
pub mod telemetry;

pub use event::{Message, MessageId, MessageType, Role};
pub use guard::CodeRequestGuard;
pub use state::{ConversationSession, SessionDelta};
pub use session::{MentorSession, TurnOutcome};
