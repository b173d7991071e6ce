pub mod config;
pub mod error;
pub mod kernel;
pub mod intake;
pub mod stream;
pub mod commands;
pub mod dispatch;
pub mod services;
pub mod store;

pub use config::MentorConfig;
pub use error::MentorError;
pub use kernel::session::{MentorSession, TurnOutcome};
