//! Line lexer for the assistant event stream.
//!
//! Raw bytes accumulate in one buffer; `cursor` marks the first byte not yet
//! consumed. A line is only looked at once its `\n` has arrived, so a chunk
//! boundary anywhere (inside a JSON payload, inside a UTF-8 sequence, between
//! `\r` and `\n`) cannot change the result.
//!
//! A complete `data:` line whose payload does not parse is left at the cursor
//! instead of being dropped. Later lines that do not open a new event are joined
//! onto it and the parse retried. The head line is only given up on once a
//! following line starts a new event, the join window is exhausted, or the
//! stream has ended. Each of those decisions depends only on complete lines.

use serde::Deserialize;
use tracing::debug;

use crate::error::MentorError;

pub const EVENT_MARKER: &[u8] = b"data: ";
pub const COMMENT_MARKER: u8 = b':';
pub const DONE_SENTINEL: &str = "[DONE]";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SseEvent {
    Delta(String),
    Done,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LexerStats {
    pub lines: u64,
    pub deltas: u64,
    /// Times a read stopped on an unparseable line waiting for more input.
    pub rebuffered: u64,
    /// Lines given up on as malformed.
    pub discarded: u64,
}

#[derive(Debug, Default, Deserialize)]
struct ChatChunk {
    #[serde(default)]
    choices: Vec<ChunkChoice>,
}

#[derive(Debug, Default, Deserialize)]
struct ChunkChoice {
    #[serde(default)]
    delta: Option<ChunkDelta>,
}

#[derive(Debug, Default, Deserialize)]
struct ChunkDelta {
    #[serde(default)]
    content: Option<String>,
}

enum Decoded {
    Content(Option<String>),
    Done,
    Incomplete,
}

enum Continuation {
    /// Joined span parsed; consume up to `next_start`.
    Joined { next_start: usize, decoded: Decoded },
    /// Need more bytes before deciding.
    Pending,
    /// Head line is malformed; drop it alone.
    Malformed,
}

#[derive(Debug)]
pub struct SseLexer {
    buf: Vec<u8>,
    cursor: usize,
    max_continuation_lines: usize,
    stats: LexerStats,
    last_decode_error: Option<MentorError>,
}

impl SseLexer {
    pub fn new(max_continuation_lines: usize) -> Self {
        Self {
            buf: Vec::new(),
            cursor: 0,
            max_continuation_lines,
            stats: LexerStats::default(),
            last_decode_error: None,
        }
    }

    pub fn stats(&self) -> LexerStats {
        self.stats
    }

    /// Why the most recent malformed line was dropped.
    pub fn last_decode_error(&self) -> Option<&MentorError> {
        self.last_decode_error.as_ref()
    }

    /// Bytes received but not consumed yet.
    pub fn pending(&self) -> &[u8] {
        &self.buf[self.cursor..]
    }

    pub fn feed(&mut self, chunk: &[u8]) {
        if self.cursor > 0 {
            self.buf.drain(..self.cursor);
            self.cursor = 0;
        }
        self.buf.extend_from_slice(chunk);
    }

    /// Consumes every complete line it can. Stops early after `[DONE]` or on an
    /// unparseable line that needs more input; whatever is left stays buffered
    /// for the next read.
    pub fn drain(&mut self) -> Vec<SseEvent> {
        self.run(false)
    }

    /// End of stream: same rules over whatever is left, including a last line
    /// with no trailing newline. `[DONE]` no longer stops the pass.
    pub fn finish(&mut self) -> Vec<SseEvent> {
        let events = self.run(true);
        self.buf.clear();
        self.cursor = 0;
        events
    }

    fn run(&mut self, at_eof: bool) -> Vec<SseEvent> {
        let mut events = Vec::new();

        while let Some((content_end, next_start)) = self.next_line(self.cursor, at_eof) {
            self.stats.lines += 1;
            let line = strip_cr(&self.buf[self.cursor..content_end]);

            if line.is_empty() || line[0] == COMMENT_MARKER || !line.starts_with(EVENT_MARKER) {
                self.cursor = next_start;
                continue;
            }

            let payload = &line[EVENT_MARKER.len()..];
            let decoded = match decode_payload(payload) {
                Decoded::Incomplete => match self.continue_payload(payload.to_vec(), next_start, at_eof) {
                    Continuation::Joined { next_start: joined_end, decoded } => {
                        self.cursor = joined_end;
                        decoded
                    }
                    Continuation::Pending => {
                        self.stats.rebuffered += 1;
                        break;
                    }
                    Continuation::Malformed => {
                        let err = MentorError::StreamDecode(format!(
                            "dropped {}-byte data line: {}",
                            payload.len(),
                            decode_failure(payload)
                        ));
                        debug!("{}", err);
                        self.last_decode_error = Some(err);
                        self.stats.discarded += 1;
                        self.cursor = next_start;
                        continue;
                    }
                },
                other => {
                    self.cursor = next_start;
                    other
                }
            };

            match decoded {
                Decoded::Content(Some(content)) if !content.is_empty() => {
                    self.stats.deltas += 1;
                    events.push(SseEvent::Delta(content));
                }
                Decoded::Done if !at_eof => {
                    events.push(SseEvent::Done);
                    break;
                }
                _ => {}
            }
        }

        events
    }

    fn continue_payload(&self, mut joined: Vec<u8>, mut pos: usize, at_eof: bool) -> Continuation {
        for _ in 0..self.max_continuation_lines {
            let Some((content_end, next_start)) = self.next_line(pos, at_eof) else {
                return if at_eof { Continuation::Malformed } else { Continuation::Pending };
            };
            let line = strip_cr(&self.buf[pos..content_end]);
            // A blank line, a comment or a new event cannot be part of this payload.
            if line.is_empty() || line[0] == COMMENT_MARKER || line.starts_with(b"data:") {
                return Continuation::Malformed;
            }

            joined.push(b'\n');
            joined.extend_from_slice(line);
            match decode_payload(&joined) {
                Decoded::Incomplete => pos = next_start,
                decoded => return Continuation::Joined { next_start, decoded },
            }
        }
        Continuation::Malformed
    }

    /// (end of line content, start of the following line)
    fn next_line(&self, from: usize, at_eof: bool) -> Option<(usize, usize)> {
        if from >= self.buf.len() {
            return None;
        }
        match self.buf[from..].iter().position(|&b| b == b'\n') {
            Some(rel) => Some((from + rel, from + rel + 1)),
            None if at_eof => Some((self.buf.len(), self.buf.len())),
            None => None,
        }
    }
}

fn strip_cr(line: &[u8]) -> &[u8] {
    line.strip_suffix(b"\r").unwrap_or(line)
}

fn decode_payload(payload: &[u8]) -> Decoded {
    let text = String::from_utf8_lossy(payload);
    if text.trim() == DONE_SENTINEL {
        return Decoded::Done;
    }
    match serde_json::from_str::<ChatChunk>(&text) {
        Ok(chunk) => Decoded::Content(
            chunk
                .choices
                .into_iter()
                .next()
                .and_then(|c| c.delta)
                .and_then(|d| d.content),
        ),
        // Well-formed JSON of another shape carries no content.
        Err(e) if e.is_data() => Decoded::Content(None),
        Err(_) => Decoded::Incomplete,
    }
}

fn decode_failure(payload: &[u8]) -> String {
    match serde_json::from_slice::<serde_json::Value>(payload) {
        Ok(_) => "unexpected shape".to_string(),
        Err(e) => e.to_string(),
    }
}
