//! Content-free session telemetry.
//!
//! Telemetry is a read-only side channel: nothing in the session, collector or
//! dispatcher reads it back.
//!
//! Events never carry user or assistant text. Only phases, identifiers, domains
//! and counts are allowed.

pub mod event;
pub mod metrics;
pub mod recorder;

pub use event::*;
pub use metrics::*;
pub use recorder::*;
