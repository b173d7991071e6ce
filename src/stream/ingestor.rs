use bytes::Bytes;
use futures_util::{Stream, StreamExt};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use super::lexer::{LexerStats, SseEvent, SseLexer};
use crate::error::MentorError;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngestStats {
    pub chunks: u64,
    pub bytes: u64,
    pub lexer: LexerStats,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestOutcome {
    pub content: String,
    /// The caller cancelled before the source finished.
    pub aborted: bool,
    pub stats: IngestStats,
}

/// Folds a chunked event stream into one growing assistant reply.
///
/// Buffer work is synchronous; the only await is reading the next chunk.
pub struct StreamIngestor {
    lexer: SseLexer,
    content: String,
    chunks: u64,
    bytes: u64,
}

impl StreamIngestor {
    pub fn new(max_continuation_lines: usize) -> Self {
        Self {
            lexer: SseLexer::new(max_continuation_lines),
            content: String::new(),
            chunks: 0,
            bytes: 0,
        }
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    /// One read: buffer the chunk and consume every line that is ready.
    /// `on_update` sees the whole reply so far after each appended delta.
    pub fn push_chunk<F: FnMut(&str)>(&mut self, chunk: &[u8], on_update: &mut F) {
        self.chunks += 1;
        self.bytes += chunk.len() as u64;
        self.lexer.feed(chunk);
        let events = self.lexer.drain();
        self.apply(events, on_update);
    }

    /// End-of-stream pass over trailing buffered text.
    pub fn finish<F: FnMut(&str)>(mut self, on_update: &mut F) -> IngestOutcome {
        let events = self.lexer.finish();
        self.apply(events, on_update);
        self.into_outcome(false)
    }

    fn apply<F: FnMut(&str)>(&mut self, events: Vec<SseEvent>, on_update: &mut F) {
        for event in events {
            match event {
                SseEvent::Delta(delta) => {
                    self.content.push_str(&delta);
                    on_update(&self.content);
                }
                SseEvent::Done => debug!("Stream sentinel reached after {} chunks", self.chunks),
            }
        }
    }

    fn into_outcome(self, aborted: bool) -> IngestOutcome {
        IngestOutcome {
            stats: IngestStats {
                chunks: self.chunks,
                bytes: self.bytes,
                lexer: self.lexer.stats(),
            },
            content: self.content,
            aborted,
        }
    }

    /// Reads `source` to completion (or cancellation).
    ///
    /// A read failure is returned as-is, no retry. Content delivered before the
    /// failure has already gone through `on_update`.
    pub async fn ingest<S, F>(
        mut self,
        mut source: S,
        cancel: &CancellationToken,
        mut on_update: F,
    ) -> Result<IngestOutcome, MentorError>
    where
        S: Stream<Item = Result<Bytes, MentorError>> + Unpin,
        F: FnMut(&str),
    {
        loop {
            let next = tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    info!("Stream abandoned by caller after {} chunks", self.chunks);
                    return Ok(self.into_outcome(true));
                }
                item = source.next() => item,
            };

            match next {
                Some(Ok(chunk)) => self.push_chunk(&chunk, &mut on_update),
                Some(Err(e)) => return Err(e),
                None => break,
            }
        }

        let outcome = self.finish(&mut on_update);
        info!(
            "Stream finished: {} chunks, {} deltas, {} chars",
            outcome.stats.chunks,
            outcome.stats.lexer.deltas,
            outcome.content.len()
        );
        Ok(outcome)
    }
}

/// Convenience for callers holding the whole byte sequence already split up.
pub fn ingest_chunks<'a, I>(chunks: I, max_continuation_lines: usize) -> IngestOutcome
where
    I: IntoIterator<Item = &'a [u8]>,
{
    let mut ingestor = StreamIngestor::new(max_continuation_lines);
    let mut ignore = |_: &str| {};
    for chunk in chunks {
        ingestor.push_chunk(chunk, &mut ignore);
    }
    ingestor.finish(&mut ignore)
}
