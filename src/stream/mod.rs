pub mod lexer;
pub mod ingestor;

pub use lexer::*;
pub use ingestor::*;
