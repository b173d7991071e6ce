use serde::{Deserialize, Serialize};

use crate::dispatch::types::{BatchId, OperationDomain};
use crate::intake::types::IntakePhase;

// Allowed: ids, phases, domains, counts. Forbidden: message text, payloads.

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TelemetryEvent {
    IntakeTransition {
        from: IntakePhase,
        to: IntakePhase,
    },

    CodeRequestRefused,

    StreamCompleted {
        chunks: u64,
        deltas: u64,
        rebuffered: u64,
        discarded: u64,
    },

    StreamAborted {
        chunks: u64,
    },

    TransportFailed,

    CommandsExtracted {
        file_ops: bool,
        mentor_report: bool,
        milestone_ops: bool,
    },

    BatchStaged {
        batch_id: BatchId,
        domain: OperationDomain,
        operations: usize,
    },

    BatchApplied {
        batch_id: BatchId,
        domain: OperationDomain,
        succeeded: usize,
        failed: usize,
    },

    BatchCancelled {
        batch_id: BatchId,
        domain: OperationDomain,
    },

    ReportPersisted,

    StoreFailure {
        kind: StoreWriteKind,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StoreWriteKind {
    Message,
    Intake,
    Report,
    Load,
}
