use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::event::{Message, MessageId, MessageType};
use super::guard::{CodeRequestGuard, REFUSAL};
use super::state::{ConversationSession, SessionDelta};
use super::telemetry::{StoreWriteKind, TelemetryEvent, TelemetryRecorder};
use crate::commands::extractor::extract_commands;
use crate::commands::types::{ExtractedCommands, FileOperation};
use crate::config::MentorConfig;
use crate::dispatch::dispatcher::{normalize_file_ops, OperationDispatcher};
use crate::dispatch::types::{BatchId, BatchReport, Operation, StagedBatch};
use crate::error::MentorError;
use crate::intake::collector::{reply_for, IntakeCollector};
use crate::intake::types::{IntakeState, IntakeStep};
use crate::services::llm::prompt::build_request;
use crate::services::llm::ChatTransport;
use crate::services::Collaborators;
use crate::store::ConversationStore;
use crate::stream::ingestor::StreamIngestor;

/// What one user message produced.
#[derive(Debug, Clone, PartialEq)]
pub enum TurnOutcome {
    /// Direct code request. Neither intake nor the assistant saw the message.
    Refused { reply: String },
    /// The intake collector answered.
    Intake { step: IntakeStep, reply: String },
    /// A finished assistant reply, with whatever it asked to change held for confirmation.
    Guidance {
        reply: String,
        kind: MessageType,
        staged: Vec<StagedBatch>,
        report_persisted: bool,
    },
    /// The caller cancelled mid-stream. The partial reply is kept as-is.
    Aborted { partial: String },
}

/// One mentor conversation: guard, intake, streamed guidance, staged operations.
///
/// Calls take `&mut self`, so a batch can never be applied while another
/// message is being handled.
pub struct MentorSession {
    state: ConversationSession,
    telemetry: TelemetryRecorder,
    config: MentorConfig,
    collector: IntakeCollector,
    guard: CodeRequestGuard,
    dispatcher: OperationDispatcher,
    transport: Arc<dyn ChatTransport>,
    store: Arc<dyn ConversationStore>,
    submission_id: Option<String>,
}

impl MentorSession {
    pub fn new(
        config: MentorConfig,
        transport: Arc<dyn ChatTransport>,
        store: Arc<dyn ConversationStore>,
        collaborators: &Collaborators,
    ) -> Self {
        let dispatcher = OperationDispatcher::new(collaborators, &config.export_filename);
        Self {
            state: ConversationSession::new(),
            telemetry: TelemetryRecorder::new(),
            config,
            collector: IntakeCollector::new(),
            guard: CodeRequestGuard::new(),
            dispatcher,
            transport,
            store,
            submission_id: None,
        }
    }

    /// Rebuilds a session from the store. A stored intake was confirmed when it
    /// was written, so the session starts past intake.
    ///
    /// An unreadable store is logged and the session starts empty.
    pub async fn resume(
        config: MentorConfig,
        transport: Arc<dyn ChatTransport>,
        store: Arc<dyn ConversationStore>,
        collaborators: &Collaborators,
    ) -> Self {
        let mut session = Self::new(config, transport, store.clone(), collaborators);

        let messages = match store.load_messages().await {
            Ok(messages) => messages,
            Err(e) => {
                session.store_failed(StoreWriteKind::Load, &e);
                Vec::new()
            }
        };
        let intake = match store.load_intake().await {
            Ok(intake) => intake,
            Err(e) => {
                session.store_failed(StoreWriteKind::Load, &e);
                None
            }
        };

        info!(
            "Resumed session with {} messages (intake {})",
            messages.len(),
            if intake.is_some() { "confirmed" } else { "pending" }
        );
        session.state = ConversationSession::restored(messages, intake);
        session
    }

    /// Reports are filed against this submission as soon as they arrive.
    pub fn with_submission(mut self, submission_id: impl Into<String>) -> Self {
        self.submission_id = Some(submission_id.into());
        self
    }

    pub fn set_submission_id(&mut self, submission_id: Option<String>) {
        self.submission_id = submission_id;
    }

    pub fn state(&self) -> &ConversationSession {
        &self.state
    }

    pub fn messages(&self) -> &[Message] {
        self.state.messages()
    }

    pub fn telemetry(&self) -> &TelemetryRecorder {
        &self.telemetry
    }

    pub fn pending_batches(&self) -> &[StagedBatch] {
        self.dispatcher.pending()
    }

    /// Text to open the conversation with, while intake has not started.
    pub fn opening_prompt(&self) -> Option<String> {
        match self.state.intake() {
            IntakeState::Collecting => reply_for(&IntakeStep::NeedsFormat),
            _ => None,
        }
    }

    /// Handles one user message end to end.
    ///
    /// `on_update` sees the assistant reply so far after every streamed delta.
    /// Only a transport failure is returned as an error; the session stays
    /// usable afterwards.
    pub async fn handle_message<F>(
        &mut self,
        text: &str,
        cancel: &CancellationToken,
        on_update: F,
    ) -> Result<TurnOutcome, MentorError>
    where
        F: FnMut(&str),
    {
        if self.guard.is_direct_code_request(text) {
            info!("Direct code request refused (phase {:?})", self.state.intake().phase());
            self.telemetry.record(TelemetryEvent::CodeRequestRefused);
            self.append(Message::user(text)).await;
            self.append(Message::assistant(REFUSAL, MessageType::Warning)).await;
            return Ok(TurnOutcome::Refused { reply: REFUSAL.to_string() });
        }

        let (step, next) = self.collector.assess(self.state.intake(), text);
        if step == IntakeStep::PassThrough {
            return self.stream_reply(text, cancel, on_update).await;
        }
        Ok(self.advance_intake(text, step, next).await)
    }

    async fn advance_intake(&mut self, text: &str, step: IntakeStep, next: IntakeState) -> TurnOutcome {
        let from = self.state.intake().phase();
        let to = next.phase();
        if from != to {
            self.telemetry.record(TelemetryEvent::IntakeTransition { from, to });
        }
        self.state.reduce(SessionDelta::IntakeTransition(next));

        self.append(Message::user(text)).await;
        if let IntakeStep::Confirmed(record) = &step {
            if let Err(e) = self.store.save_intake(record).await {
                self.store_failed(StoreWriteKind::Intake, &e);
            }
        }

        let reply = reply_for(&step).unwrap_or_default();
        let kind = match &step {
            IntakeStep::Confirmed(_) => MessageType::Explanation,
            _ => MessageType::Question,
        };
        self.append(Message::assistant(&reply, kind)).await;
        TurnOutcome::Intake { step, reply }
    }

    async fn stream_reply<F>(
        &mut self,
        text: &str,
        cancel: &CancellationToken,
        mut on_update: F,
    ) -> Result<TurnOutcome, MentorError>
    where
        F: FnMut(&str),
    {
        // Stored before the request goes out.
        self.append(Message::user(text)).await;

        let request = build_request(&self.config, self.state.confirmed_intake(), self.state.messages());
        let source = match self.transport.open(&request).await {
            Ok(source) => source,
            Err(e) => {
                warn!("Assistant request failed: {}", e);
                self.telemetry.record(TelemetryEvent::TransportFailed);
                return Err(e);
            }
        };

        let mut assistant: Option<MessageId> = None;
        let state = &mut self.state;
        let ingested = StreamIngestor::new(self.config.max_continuation_lines)
            .ingest(source, cancel, |content: &str| {
                let id = *assistant.get_or_insert_with(|| {
                    let message = Message::assistant("", MessageType::Explanation);
                    let id = message.id;
                    state.reduce(SessionDelta::MessageAppended(message));
                    id
                });
                state.reduce(SessionDelta::AssistantContent {
                    id,
                    content: content.to_string(),
                });
                on_update(content);
            })
            .await;

        let outcome = match ingested {
            Ok(outcome) => outcome,
            Err(e) => {
                warn!("Assistant stream failed: {}", e);
                self.telemetry.record(TelemetryEvent::TransportFailed);
                if let Some(id) = assistant {
                    self.persist_message(id).await;
                }
                return Err(e);
            }
        };

        if outcome.aborted {
            self.telemetry.record(TelemetryEvent::StreamAborted { chunks: outcome.stats.chunks });
            if let Some(id) = assistant {
                self.persist_message(id).await;
            }
            return Ok(TurnOutcome::Aborted { partial: outcome.content });
        }

        self.telemetry.record(TelemetryEvent::StreamCompleted {
            chunks: outcome.stats.chunks,
            deltas: outcome.stats.lexer.deltas,
            rebuffered: outcome.stats.lexer.rebuffered,
            discarded: outcome.stats.lexer.discarded,
        });

        let id = match assistant {
            Some(id) => id,
            None => {
                debug!("Stream finished without content");
                let message = Message::assistant("", MessageType::Explanation);
                let id = message.id;
                self.state.reduce(SessionDelta::MessageAppended(message));
                id
            }
        };

        let reply = outcome.content;
        let kind = MessageType::infer(&reply);
        let commands = extract_commands(&reply);
        if !commands.is_empty() {
            self.telemetry.record(TelemetryEvent::CommandsExtracted {
                file_ops: commands.file_ops.is_some(),
                mentor_report: commands.mentor_report.is_some(),
                milestone_ops: commands.milestone_ops.is_some(),
            });
        }

        self.state.reduce(SessionDelta::AssistantFinalized {
            id,
            kind,
            file_ops: file_ops_of(&commands),
            mentor_report: commands.mentor_report.clone(),
        });
        self.persist_message(id).await;
        let report_persisted = self.persist_report(&commands).await;

        let staged = self.dispatcher.stage_extracted(&commands);
        for batch in &staged {
            self.telemetry.record(TelemetryEvent::BatchStaged {
                batch_id: batch.id,
                domain: batch.domain,
                operations: batch.len(),
            });
        }

        Ok(TurnOutcome::Guidance {
            reply,
            kind,
            staged,
            report_persisted,
        })
    }

    // Reports skip the confirmation gate that file and milestone batches go through.
    async fn persist_report(&mut self, commands: &ExtractedCommands) -> bool {
        let Some(report) = &commands.mentor_report else {
            return false;
        };
        let Some(submission_id) = self.submission_id.clone() else {
            debug!("Mentor report extracted with no submission to file it against");
            return false;
        };

        match self.store.save_report(&submission_id, report).await {
            Ok(()) => {
                info!("Mentor report filed for submission {}", submission_id);
                self.telemetry.record(TelemetryEvent::ReportPersisted);
                true
            }
            Err(e) => {
                self.store_failed(StoreWriteKind::Report, &e);
                false
            }
        }
    }

    /// Applies a staged batch and returns one result per operation.
    pub async fn confirm(&mut self, id: BatchId) -> Result<BatchReport, MentorError> {
        let report = self.dispatcher.confirm(id).await?;
        self.telemetry.record(TelemetryEvent::BatchApplied {
            batch_id: report.batch_id,
            domain: report.domain,
            succeeded: report.succeeded(),
            failed: report.failed(),
        });
        Ok(report)
    }

    /// Discards a staged batch with no effect on any collaborator.
    pub fn cancel(&mut self, id: BatchId) -> Result<StagedBatch, MentorError> {
        let batch = self.dispatcher.cancel(id)?;
        self.telemetry.record(TelemetryEvent::BatchCancelled {
            batch_id: batch.id,
            domain: batch.domain,
        });
        Ok(batch)
    }

    async fn append(&mut self, message: Message) {
        if let Err(e) = self.store.append_message(&message).await {
            self.store_failed(StoreWriteKind::Message, &e);
        }
        self.state.reduce(SessionDelta::MessageAppended(message));
    }

    async fn persist_message(&mut self, id: MessageId) {
        let Some(message) = self.state.messages().iter().rev().find(|m| m.id == id).cloned() else {
            return;
        };
        if let Err(e) = self.store.append_message(&message).await {
            self.store_failed(StoreWriteKind::Message, &e);
        }
    }

    fn store_failed(&mut self, kind: StoreWriteKind, err: &MentorError) {
        warn!("Conversation store {:?} failed: {}", kind, err);
        self.telemetry.record(TelemetryEvent::StoreFailure { kind });
    }
}

fn file_ops_of(commands: &ExtractedCommands) -> Option<Vec<FileOperation>> {
    let payload = commands.file_ops.as_ref()?;
    let ops: Vec<FileOperation> = normalize_file_ops(payload)
        .into_iter()
        .filter_map(|op| match op {
            Operation::File(op) => Some(op),
            _ => None,
        })
        .collect();
    Some(ops)
}
