use mentor::dispatch::types::{BatchId, OperationDomain};
use mentor::intake::types::IntakePhase;
use mentor::kernel::telemetry::{StoreWriteKind, TelemetryEvent, TelemetryRecorder};

#[tokio::test]
async fn test_snapshot_folds_events() {
    let mut recorder = TelemetryRecorder::new();
    let batch = BatchId::new();

    recorder.record(TelemetryEvent::IntakeTransition {
        from: IntakePhase::Collecting,
        to: IntakePhase::AwaitingConfirmation,
    });
    recorder.record(TelemetryEvent::IntakeTransition {
        from: IntakePhase::AwaitingConfirmation,
        to: IntakePhase::Confirmed,
    });
    recorder.record(TelemetryEvent::CodeRequestRefused);
    recorder.record(TelemetryEvent::StreamCompleted { chunks: 6, deltas: 4, rebuffered: 2, discarded: 1 });
    recorder.record(TelemetryEvent::StreamAborted { chunks: 2 });
    recorder.record(TelemetryEvent::TransportFailed);
    recorder.record(TelemetryEvent::BatchStaged { batch_id: batch, domain: OperationDomain::Files, operations: 3 });
    recorder.record(TelemetryEvent::BatchApplied {
        batch_id: batch,
        domain: OperationDomain::Files,
        succeeded: 2,
        failed: 1,
    });
    recorder.record(TelemetryEvent::BatchCancelled { batch_id: BatchId::new(), domain: OperationDomain::Milestones });
    recorder.record(TelemetryEvent::ReportPersisted);
    recorder.record(TelemetryEvent::StoreFailure { kind: StoreWriteKind::Message });

    let snap = recorder.snapshot();
    assert_eq!(snap.intake_stats.parsed, 1);
    assert_eq!(snap.intake_stats.confirmed, 1);
    assert_eq!(snap.refusals, 1);
    assert_eq!(snap.stream_stats.completed, 1);
    assert_eq!(snap.stream_stats.aborted, 1);
    assert_eq!(snap.stream_stats.transport_failures, 1);
    assert_eq!(snap.stream_stats.total_deltas, 4);
    assert_eq!(snap.stream_stats.rebuffered_lines, 2);
    assert_eq!(snap.stream_stats.discarded_lines, 1);
    assert!((snap.stream_stats.avg_chunks_per_stream - 4.0).abs() < f64::EPSILON);
    assert_eq!(snap.batch_stats.operations_staged, 3);
    assert_eq!(snap.batch_stats.operations_succeeded, 2);
    assert_eq!(snap.batch_stats.operations_failed, 1);
    assert_eq!(snap.batch_stats.cancelled, 1);
    assert_eq!(snap.reports_persisted, 1);
    assert_eq!(snap.store_failures, 1);
}

#[tokio::test]
async fn test_recorder_is_bounded() {
    let mut recorder = TelemetryRecorder::new();
    for _ in 0..10_050 {
        recorder.record(TelemetryEvent::CodeRequestRefused);
    }
    assert_eq!(recorder.len(), 10_000);
    assert_eq!(recorder.snapshot().refusals, 10_000);

    recorder.clear();
    assert!(recorder.is_empty());
}

#[tokio::test]
async fn test_events_carry_no_content() {
    // Serialized events hold only phases, ids and counts.
    let event = TelemetryEvent::CommandsExtracted { file_ops: true, mentor_report: false, milestone_ops: true };
    let json = serde_json::to_string(&event).unwrap();
    assert!(json.contains("CommandsExtracted"));
    assert!(!json.contains("action"));
}

#[tokio::test]
async fn test_snapshot_counts_extracted_commands() {
    let mut recorder = TelemetryRecorder::new();
    recorder.record(TelemetryEvent::CommandsExtracted { file_ops: true, mentor_report: false, milestone_ops: true });
    recorder.record(TelemetryEvent::CommandsExtracted { file_ops: true, mentor_report: true, milestone_ops: false });
    recorder.record(TelemetryEvent::CodeRequestRefused);

    let commands = recorder.snapshot().command_stats;
    assert_eq!(commands.replies_with_commands, 2);
    assert_eq!(commands.file_ops, 2);
    assert_eq!(commands.mentor_reports, 1);
    assert_eq!(commands.milestone_ops, 1);
}
