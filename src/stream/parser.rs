//! Incremental Server-Sent-Events framing.
//!
//! [`SseParser`] turns response body chunks into [`StreamMessage`]s. Chunk
//! boundaries are arbitrary: a line, a field name, or a UTF-8 code point
//! may be split across reads, and a message's `event:` and `data:` lines
//! may arrive in different chunks.

use tracing::debug;

/// Event type used when a message has no `event:` line.
pub const DEFAULT_EVENT: &str = "message";

const LF: u8 = b'\n';
const CR: u8 = b'\r';

/// One framed SSE message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamMessage {
    pub event_type: String,
    pub data: String,
}

impl StreamMessage {
    pub fn new(event_type: impl Into<String>, data: impl Into<String>) -> Self {
        Self {
            event_type: event_type.into(),
            data: data.into(),
        }
    }
}

/// Parser state carried between chunks.
#[derive(Debug, Default)]
pub struct SseParser {
    /// Bytes after the last line break seen so far.
    pending: Vec<u8>,
    current_event: String,
    current_data: String,
}

impl SseParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Consumes one chunk and returns every message it completed.
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<StreamMessage> {
        let start = self.pending.len();
        self.pending.extend_from_slice(chunk);

        // Bytes before `start` were already searched.
        let Some(last_lf) = chunk.iter().rposition(|&b| b == LF).map(|i| start + i) else {
            return Vec::new();
        };

        let rest = self.pending.split_off(last_lf + 1);
        let complete = std::mem::replace(&mut self.pending, rest);

        let mut messages = Vec::new();
        for line in complete[..last_lf].split(|&b| b == LF) {
            let line = line.strip_suffix(&[CR]).unwrap_or(line);
            if let Some(message) = self.process_line(&String::from_utf8_lossy(line)) {
                messages.push(message);
            }
        }
        messages
    }

    /// Signals the end of the body.
    ///
    /// A trailing line without a terminator and a message without its
    /// closing blank line are discarded.
    pub fn finish(&mut self) {
        if !self.pending.is_empty() || !self.current_data.is_empty() {
            debug!(
                pending_bytes = self.pending.len(),
                pending_data = self.current_data.len(),
                "Discarding unterminated SSE message"
            );
        }
        *self = Self::default();
    }

    fn process_line(&mut self, line: &str) -> Option<StreamMessage> {
        if line.is_empty() {
            return self.dispatch();
        }

        if line.starts_with(':') {
            return None;
        }

        let (field, value) = match line.split_once(':') {
            Some((field, value)) => (field, value.strip_prefix(' ').unwrap_or(value)),
            None => (line, ""),
        };

        match field {
            "event" => self.current_event = value.trim().to_string(),
            "data" => {
                if !self.current_data.is_empty() {
                    self.current_data.push('\n');
                }
                self.current_data.push_str(value);
            }
            _ => {}
        }
        None
    }

    /// Emits the accumulated message on a blank line.
    ///
    /// A blank line with no data keeps the event type so a stray
    /// separator before the data does not lose it.
    fn dispatch(&mut self) -> Option<StreamMessage> {
        if self.current_data.is_empty() {
            return None;
        }

        let event_type = match std::mem::take(&mut self.current_event) {
            event if event.is_empty() => DEFAULT_EVENT.to_string(),
            event => event,
        };
        Some(StreamMessage {
            event_type,
            data: std::mem::take(&mut self.current_data),
        })
    }
}
