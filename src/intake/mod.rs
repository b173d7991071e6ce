pub mod types;
pub mod collector;

pub use types::*;
pub use collector::*;
