use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

use mentor::dispatch::types::{BatchId, StagedBatch};
use mentor::services::downloads::DirectoryDownloads;
use mentor::services::llm::HttpChatTransport;
use mentor::services::tracker::InMemoryMilestoneTracker;
use mentor::services::workspace::InMemoryFileSystem;
use mentor::services::Collaborators;
use mentor::store::JsonlConversationStore;
use mentor::{MentorConfig, MentorSession, TurnOutcome};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

const HISTORY_FILE: &str = "mentor-history.jsonl";
const DOWNLOAD_DIR: &str = "downloads";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(EnvFilter::from_default_env())
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let config = match std::env::args().nth(1) {
        Some(path) => MentorConfig::from_file(PathBuf::from(path))?,
        None => MentorConfig::default(),
    };
    tracing::info!("Mentor starting against {} (model {})", config.api_base_url, config.model);

    let transport = Arc::new(HttpChatTransport::new(&config)?);
    let store = Arc::new(JsonlConversationStore::new(HISTORY_FILE));
    let collaborators = Collaborators::new(
        Arc::new(InMemoryFileSystem::new()),
        Arc::new(InMemoryMilestoneTracker::new()),
        Arc::new(DirectoryDownloads::new(DOWNLOAD_DIR)),
    );

    let mut session = MentorSession::resume(config, transport, store, &collaborators).await;
    if let Some(prompt) = session.opening_prompt() {
        println!("{}\n", prompt);
    }
    println!("Commands: /apply <id>, /cancel <id>, /pending, /quit. Ctrl+C stops a reply mid-stream.");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut input = String::new();

    while let Some(line) = lines.next_line().await? {
        // A blank line sends what has been typed so far; intake needs several lines.
        if !line.trim().is_empty() {
            if input.is_empty() {
                if let Some(done) = run_command(&mut session, line.trim()).await {
                    if done {
                        break;
                    }
                    continue;
                }
            }
            input.push_str(&line);
            input.push('\n');
            continue;
        }
        if input.trim().is_empty() {
            continue;
        }

        let text = std::mem::take(&mut input);
        let cancel = CancellationToken::new();
        let interrupt = {
            let cancel = cancel.clone();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    cancel.cancel();
                }
            })
        };

        let mut printed = 0;
        let outcome = session
            .handle_message(text.trim_end(), &cancel, |content: &str| {
                print!("{}", &content[printed..]);
                let _ = std::io::stdout().flush();
                printed = content.len();
            })
            .await;
        interrupt.abort();

        match outcome {
            Ok(TurnOutcome::Refused { reply }) => println!("{}\n", reply),
            Ok(TurnOutcome::Intake { reply, .. }) => println!("{}\n", reply),
            Ok(TurnOutcome::Guidance { staged, report_persisted, .. }) => {
                println!("\n");
                if report_persisted {
                    println!("(mentor report saved)");
                }
                for batch in &staged {
                    print_batch(batch);
                }
            }
            Ok(TurnOutcome::Aborted { .. }) => println!("\n(reply stopped)\n"),
            Err(e) => println!("\nCould not reach the mentor: {}\n", e),
        }
    }

    Ok(())
}

/// Some(true) to quit, Some(false) when the line was a command, None for chat text.
async fn run_command(session: &mut MentorSession, line: &str) -> Option<bool> {
    let (command, arg) = line.split_once(' ').unwrap_or((line, ""));
    match command {
        "/quit" => Some(true),
        "/pending" => {
            if session.pending_batches().is_empty() {
                println!("Nothing waiting for confirmation.");
            }
            for batch in session.pending_batches() {
                print_batch(batch);
            }
            Some(false)
        }
        "/apply" => {
            match arg.parse::<BatchId>() {
                Ok(id) => match session.confirm(id).await {
                    Ok(report) => {
                        for result in &report.results {
                            println!(
                                "  [{:?}] {} {}",
                                result.status,
                                result.operation.describe(),
                                result.detail.as_deref().unwrap_or("")
                            );
                        }
                        println!("{}", report.summary());
                    }
                    Err(e) => println!("{}", e),
                },
                Err(_) => println!("usage: /apply <batch id>"),
            }
            Some(false)
        }
        "/cancel" => {
            match arg.parse::<BatchId>() {
                Ok(id) => match session.cancel(id) {
                    Ok(batch) => println!("Discarded {} operations.", batch.len()),
                    Err(e) => println!("{}", e),
                },
                Err(_) => println!("usage: /cancel <batch id>"),
            }
            Some(false)
        }
        _ => None,
    }
}

fn print_batch(batch: &StagedBatch) {
    println!("Proposed {:?} changes (batch {}):", batch.domain, batch.id);
    for operation in &batch.operations {
        println!("  - {}", operation.describe());
    }
    println!("Reply /apply {} or /cancel {}", batch.id, batch.id);
}
