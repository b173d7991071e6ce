use std::collections::VecDeque;

use super::event::TelemetryEvent;
use crate::intake::types::IntakePhase;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TelemetrySnapshot {
    pub intake_stats: IntakeStats,
    pub stream_stats: StreamStats,
    pub command_stats: CommandStats,
    pub batch_stats: BatchStats,
    pub refusals: u64,
    pub reports_persisted: u64,
    pub store_failures: u64,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct IntakeStats {
    pub parsed: u64,
    pub confirmed: u64,
    pub rejected: u64,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct StreamStats {
    pub completed: u64,
    pub aborted: u64,
    pub transport_failures: u64,
    pub total_chunks: u64,
    pub total_deltas: u64,
    pub rebuffered_lines: u64,
    pub discarded_lines: u64,
    pub avg_chunks_per_stream: f64,
}

/// Replies carrying at least one command block, and how many of each tag.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CommandStats {
    pub replies_with_commands: u64,
    pub file_ops: u64,
    pub mentor_reports: u64,
    pub milestone_ops: u64,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatchStats {
    pub staged: u64,
    pub applied: u64,
    pub cancelled: u64,
    pub operations_staged: u64,
    pub operations_succeeded: u64,
    pub operations_failed: u64,
}

pub fn compute_snapshot(events: &VecDeque<TelemetryEvent>) -> TelemetrySnapshot {
    let mut snap = TelemetrySnapshot::default();

    for event in events {
        match event {
            TelemetryEvent::IntakeTransition { from, to } => match (from, to) {
                (IntakePhase::Collecting, IntakePhase::AwaitingConfirmation) => snap.intake_stats.parsed += 1,
                (IntakePhase::AwaitingConfirmation, IntakePhase::Confirmed) => snap.intake_stats.confirmed += 1,
                (IntakePhase::AwaitingConfirmation, IntakePhase::Collecting) => snap.intake_stats.rejected += 1,
                _ => {}
            },
            TelemetryEvent::CodeRequestRefused => snap.refusals += 1,
            TelemetryEvent::StreamCompleted { chunks, deltas, rebuffered, discarded } => {
                snap.stream_stats.completed += 1;
                snap.stream_stats.total_chunks += chunks;
                snap.stream_stats.total_deltas += deltas;
                snap.stream_stats.rebuffered_lines += rebuffered;
                snap.stream_stats.discarded_lines += discarded;
            }
            TelemetryEvent::StreamAborted { chunks } => {
                snap.stream_stats.aborted += 1;
                snap.stream_stats.total_chunks += chunks;
            }
            TelemetryEvent::TransportFailed => snap.stream_stats.transport_failures += 1,
            TelemetryEvent::CommandsExtracted { file_ops, mentor_report, milestone_ops } => {
                snap.command_stats.replies_with_commands += 1;
                snap.command_stats.file_ops += u64::from(*file_ops);
                snap.command_stats.mentor_reports += u64::from(*mentor_report);
                snap.command_stats.milestone_ops += u64::from(*milestone_ops);
            }
            TelemetryEvent::BatchStaged { operations, .. } => {
                snap.batch_stats.staged += 1;
                snap.batch_stats.operations_staged += *operations as u64;
            }
            TelemetryEvent::BatchApplied { succeeded, failed, .. } => {
                snap.batch_stats.applied += 1;
                snap.batch_stats.operations_succeeded += *succeeded as u64;
                snap.batch_stats.operations_failed += *failed as u64;
            }
            TelemetryEvent::BatchCancelled { .. } => snap.batch_stats.cancelled += 1,
            TelemetryEvent::ReportPersisted => snap.reports_persisted += 1,
            TelemetryEvent::StoreFailure { .. } => snap.store_failures += 1,
        }
    }

    let streams = snap.stream_stats.completed + snap.stream_stats.aborted;
    if streams > 0 {
        snap.stream_stats.avg_chunks_per_stream = snap.stream_stats.total_chunks as f64 / streams as f64;
    }

    snap
}
