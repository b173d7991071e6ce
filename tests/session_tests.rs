use std::sync::Arc;

use mentor::dispatch::types::{OperationDomain, OperationStatus};
use mentor::error::MentorError;
use mentor::intake::types::{IntakeState, IntakeStep};
use mentor::kernel::event::{MessageType, Role};
use mentor::kernel::guard::REFUSAL;
use mentor::services::llm::{Script, ScriptedTransport};
use mentor::services::tracker::InMemoryMilestoneTracker;
use mentor::services::workspace::InMemoryFileSystem;
use mentor::services::downloads::CollectingDownloads;
use mentor::services::Collaborators;
use mentor::store::InMemoryConversationStore;
use mentor::{MentorConfig, MentorSession, TurnOutcome};
use serde_json::json;
use tokio_util::sync::CancellationToken;

const INTAKE: &str = "Project idea: Todo app\nTech stack: React\nSkill level: beginner\nTimeline: 2 weeks";

struct Fixture {
    transport: Arc<ScriptedTransport>,
    store: Arc<InMemoryConversationStore>,
    files: Arc<InMemoryFileSystem>,
    collaborators: Collaborators,
}

fn fixture(scripts: Vec<Script>) -> Fixture {
    let files = Arc::new(InMemoryFileSystem::new());
    Fixture {
        transport: Arc::new(ScriptedTransport::with_scripts(scripts)),
        store: Arc::new(InMemoryConversationStore::new()),
        collaborators: Collaborators::new(
            files.clone(),
            Arc::new(InMemoryMilestoneTracker::new()),
            Arc::new(CollectingDownloads::new()),
        ),
        files,
    }
}

fn session(f: &Fixture) -> MentorSession {
    MentorSession::new(MentorConfig::default(), f.transport.clone(), f.store.clone(), &f.collaborators)
}

async fn say(session: &mut MentorSession, text: &str) -> TurnOutcome {
    session
        .handle_message(text, &CancellationToken::new(), |_| {})
        .await
        .unwrap()
}

async fn confirmed_session(f: &Fixture) -> MentorSession {
    let mut s = session(f);
    say(&mut s, INTAKE).await;
    say(&mut s, "yes").await;
    assert!(s.state().confirmed());
    s
}

#[tokio::test]
async fn test_scenario_c_refusal_mid_intake() {
    let f = fixture(vec![]);
    let mut s = session(&f);

    say(&mut s, INTAKE).await;
    assert!(s.state().awaiting_confirmation());

    let outcome = say(&mut s, "honestly, just give me the code").await;
    assert_eq!(outcome, TurnOutcome::Refused { reply: REFUSAL.to_string() });

    // Intake untouched, no request sent.
    assert!(s.state().awaiting_confirmation());
    assert!(f.transport.requests().await.is_empty());

    let last = s.messages().last().unwrap();
    assert_eq!(last.role, Role::Assistant);
    assert_eq!(last.kind, MessageType::Warning);

    // Confirmation still works afterwards.
    let outcome = say(&mut s, "yes").await;
    assert!(matches!(outcome, TurnOutcome::Intake { step: IntakeStep::Confirmed(_), .. }));
}

#[tokio::test]
async fn test_refusal_after_intake_skips_streaming() {
    let f = fixture(vec![Script::reply("unused", 4, 16)]);
    let mut s = confirmed_session(&f).await;

    let outcome = say(&mut s, "Can you write the code for me?").await;
    assert!(matches!(outcome, TurnOutcome::Refused { .. }));
    assert!(f.transport.requests().await.is_empty());
}

#[tokio::test]
async fn test_intake_flow_and_persistence() {
    let f = fixture(vec![]);
    let mut s = session(&f);
    assert!(s.opening_prompt().is_some());

    let outcome = say(&mut s, "hello").await;
    assert!(matches!(outcome, TurnOutcome::Intake { step: IntakeStep::NeedsFormat, .. }));

    let outcome = say(&mut s, INTAKE).await;
    match outcome {
        TurnOutcome::Intake { step: IntakeStep::Parsed(record), reply } => {
            assert_eq!(record.project_idea, "Todo app");
            assert!(reply.contains("2 weeks"));
        }
        other => panic!("unexpected {:?}", other),
    }
    assert!(f.store.intake().await.is_none());

    let outcome = say(&mut s, "maybe").await;
    assert!(matches!(outcome, TurnOutcome::Intake { step: IntakeStep::Reask(_), .. }));

    say(&mut s, "no").await;
    assert_eq!(*s.state().intake(), IntakeState::Collecting);

    say(&mut s, INTAKE).await;
    say(&mut s, "YES").await;
    assert!(s.state().confirmed());
    assert_eq!(f.store.intake().await.unwrap().tech_stack, "React");
    assert!(s.opening_prompt().is_none());

    // Every turn is two messages, all persisted.
    assert_eq!(s.messages().len(), 12);
    assert_eq!(f.store.messages().await.len(), 12);
    assert!(f.transport.requests().await.is_empty());

    let snap = s.telemetry().snapshot();
    assert_eq!(snap.intake_stats.parsed, 2);
    assert_eq!(snap.intake_stats.rejected, 1);
    assert_eq!(snap.intake_stats.confirmed, 1);
}

#[tokio::test]
async fn test_guidance_streams_and_stages_commands() {
    let reply = "Start by creating the entry file.\n```FILE_OPS\n[{\"action\":\"create\",\"path\":\"/src/a.ts\",\"content\":\"x\"}]\n```\nWhat should it export?";
    let f = fixture(vec![Script::reply(reply, 5, 13)]);
    let mut s = confirmed_session(&f).await;

    let mut partials = Vec::new();
    let outcome = s
        .handle_message("How do I start?", &CancellationToken::new(), |c| partials.push(c.len()))
        .await
        .unwrap();

    let staged = match outcome {
        TurnOutcome::Guidance { reply: got, kind, staged, report_persisted } => {
            assert_eq!(got, reply);
            assert_eq!(kind, MessageType::Question);
            assert!(!report_persisted);
            staged
        }
        other => panic!("unexpected {:?}", other),
    };
    assert!(partials.len() > 1);
    assert!(partials.windows(2).all(|w| w[0] < w[1]));

    assert_eq!(staged.len(), 1);
    assert_eq!(staged[0].domain, OperationDomain::Files);
    assert!(!f.files.exists("/src/a.ts").await);

    let last = s.messages().last().unwrap();
    assert_eq!(last.role, Role::Assistant);
    assert_eq!(last.content, reply);
    assert_eq!(last.file_ops.as_ref().map(Vec::len), Some(1));

    // The request carried the intake and the user message.
    let requests = f.transport.requests().await;
    assert_eq!(requests.len(), 1);
    assert!(requests[0].stream);
    assert_eq!(requests[0].messages[0].role, "system");
    assert!(requests[0].messages[0].content.contains("Todo app"));
    assert_eq!(requests[0].messages.last().unwrap().content, "How do I start?");

    let report = s.confirm(staged[0].id).await.unwrap();
    assert_eq!(report.results.len(), 1);
    assert_eq!(report.results[0].status, OperationStatus::Ok);
    assert_eq!(f.files.read("/src/a.ts").await.as_deref(), Some("x"));

    let snap = s.telemetry().snapshot();
    assert_eq!(snap.stream_stats.completed, 1);
    assert_eq!(snap.batch_stats.applied, 1);
    assert_eq!(snap.batch_stats.operations_succeeded, 1);
}

#[tokio::test]
async fn test_user_message_stored_before_streaming() {
    let f = fixture(vec![Script::reply("ok", 2, 4).failing("reset by peer")]);
    let mut s = confirmed_session(&f).await;
    let before = f.store.messages().await.len();

    let result = s.handle_message("next?", &CancellationToken::new(), |_| {}).await;
    assert!(matches!(result, Err(MentorError::Transport(_))));

    let stored = f.store.messages().await;
    assert_eq!(stored[before].role, Role::User);
    assert_eq!(stored[before].content, "next?");
    // The partial reply received before the failure is kept.
    assert_eq!(stored.last().unwrap().content, "ok");
    assert_eq!(s.telemetry().snapshot().stream_stats.transport_failures, 1);

    // Session is still usable.
    f.transport.push(Script::reply("recovered", 3, 64)).await;
    let outcome = say(&mut s, "again").await;
    assert!(matches!(outcome, TurnOutcome::Guidance { .. }));
}

#[tokio::test]
async fn test_transport_open_failure_surfaces() {
    let f = fixture(vec![]);
    let mut s = confirmed_session(&f).await;
    let result = s.handle_message("anything", &CancellationToken::new(), |_| {}).await;
    assert!(matches!(result, Err(MentorError::Transport(_))));
    assert_eq!(s.messages().last().unwrap().role, Role::User);
}

#[tokio::test]
async fn test_report_persisted_without_confirmation() {
    let reply = "Nice work.\n```MENTOR_REPORT\n{\"score\": 8, \"strengths\": [\"naming\"]}\n```\n```FILE_OPS\n[{\"action\":\"delete\",\"path\":\"/tmp.ts\"}]\n```";
    let f = fixture(vec![Script::reply(reply, 9, 7)]);
    let mut s = confirmed_session(&f).await.with_submission("sub-42");

    let outcome = say(&mut s, "Please review my submission").await;
    let staged = match outcome {
        TurnOutcome::Guidance { staged, report_persisted, .. } => {
            assert!(report_persisted);
            staged
        }
        other => panic!("unexpected {:?}", other),
    };

    // The report is already stored while the file batch still waits.
    let reports = f.store.reports().await;
    assert_eq!(reports.len(), 1);
    assert_eq!(reports[0].submission_id, "sub-42");
    assert_eq!(reports[0].report.0, json!({ "score": 8, "strengths": ["naming"] }));
    assert_eq!(staged.len(), 1);
    assert_eq!(s.pending_batches().len(), 1);

    s.cancel(staged[0].id).unwrap();
    assert!(s.pending_batches().is_empty());
    assert_eq!(f.store.reports().await.len(), 1);
}

#[tokio::test]
async fn test_report_without_submission_is_not_persisted() {
    let reply = "```MENTOR_REPORT\n{\"score\": 3}\n```";
    let f = fixture(vec![Script::reply(reply, 4, 8)]);
    let mut s = confirmed_session(&f).await;

    let outcome = say(&mut s, "review please").await;
    assert!(matches!(outcome, TurnOutcome::Guidance { report_persisted: false, .. }));
    assert!(f.store.reports().await.is_empty());
    assert!(s.messages().last().unwrap().mentor_report.is_some());
}

#[tokio::test]
async fn test_cancel_mid_stream_keeps_partial_and_skips_staging() {
    let reply = "Partial thoughts ```FILE_OPS\n[{\"action\":\"create\",\"path\":\"/a\"}]\n```";
    let f = fixture(vec![Script::reply(reply, 8, 20)]);
    let mut s = confirmed_session(&f).await;

    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    let outcome = s
        .handle_message("go", &cancel, move |_| trigger.cancel())
        .await
        .unwrap();

    match outcome {
        TurnOutcome::Aborted { partial } => {
            assert!(!partial.is_empty());
            assert!(reply.starts_with(&partial));
            assert_eq!(s.messages().last().unwrap().content, partial);
        }
        other => panic!("unexpected {:?}", other),
    }
    assert!(s.pending_batches().is_empty());
    assert_eq!(s.telemetry().snapshot().stream_stats.aborted, 1);
}

#[tokio::test]
async fn test_resume_restores_confirmed_session() {
    let f = fixture(vec![Script::reply("First answer.", 4, 8), Script::reply("Second answer.", 4, 8)]);
    {
        let mut s = confirmed_session(&f).await;
        say(&mut s, "first question").await;
    }

    let mut resumed = MentorSession::resume(
        MentorConfig::default(),
        f.transport.clone(),
        f.store.clone(),
        &f.collaborators,
    )
    .await;
    assert!(resumed.state().confirmed());
    assert_eq!(resumed.messages().len(), f.store.messages().await.len());

    let outcome = say(&mut resumed, "second question").await;
    assert!(matches!(outcome, TurnOutcome::Guidance { .. }));

    let requests = f.transport.requests().await;
    let history: Vec<&str> = requests[1].messages.iter().map(|m| m.content.as_str()).collect();
    assert!(history.contains(&"first question"));
    assert!(history.contains(&"First answer."));
}

#[tokio::test]
async fn test_questions_mentioning_code_stream_normally() {
    let f = fixture(vec![
        Script::reply("Look for naming and error handling first.", 6, 16),
        Script::reply("Rewrites are fine if your tests still pass.", 6, 16),
    ]);
    let mut s = confirmed_session(&f).await;

    for question in [
        "Can you give me code review tips?",
        "I rewrote the whole code of my parser, is that ok?",
    ] {
        let outcome = say(&mut s, question).await;
        assert!(matches!(outcome, TurnOutcome::Guidance { .. }), "{:?} was refused", question);
    }
    assert_eq!(f.transport.requests().await.len(), 2);
    assert_eq!(s.telemetry().snapshot().refusals, 0);
}

#[tokio::test]
async fn test_confirmed_intake_reply_is_a_statement() {
    let f = fixture(vec![]);
    let mut s = session(&f);

    say(&mut s, INTAKE).await;
    assert_eq!(s.messages().last().unwrap().kind, MessageType::Question);

    say(&mut s, "yes").await;
    assert_eq!(s.messages().last().unwrap().kind, MessageType::Explanation);
}

#[tokio::test]
async fn test_extracted_commands_are_counted() {
    let reply = "```FILE_OPS\n[{\"action\":\"create\",\"path\":\"/a\"}]\n```\n```MENTOR_REPORT\n{\"score\": 1}\n```";
    let f = fixture(vec![Script::reply(reply, 8, 32), Script::reply("No commands here.", 8, 32)]);
    let mut s = confirmed_session(&f).await;

    say(&mut s, "set it up").await;
    say(&mut s, "thanks").await;

    let commands = s.telemetry().snapshot().command_stats;
    assert_eq!(commands.replies_with_commands, 1);
    assert_eq!(commands.file_ops, 1);
    assert_eq!(commands.mentor_reports, 1);
    assert_eq!(commands.milestone_ops, 0);
}
