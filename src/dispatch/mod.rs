pub mod types;
pub mod handler;
pub mod file_ops;
pub mod milestone_ops;
pub mod dispatcher;

pub use types::*;
pub use handler::OperationHandler;
pub use file_ops::{FileCommand, FileOpsHandler};
pub use milestone_ops::{MilestoneCommand, MilestoneOpsHandler};
pub use dispatcher::*;
