//! `text/event-stream` framing.

use crate::stream::source::SourceEvent;

/// Incremental parser for server-sent events.
///
/// Bytes may arrive split at any point, including inside a UTF-8 sequence or
/// between the `\r` and `\n` of a line ending.
#[derive(Debug, Default)]
pub struct EventStreamParser {
    pending: Vec<u8>,
    data: Vec<String>,
    has_data: bool,
    event_type: String,
}

impl EventStreamParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feeds one chunk and returns every event it completed, in order.
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<SourceEvent> {
        self.pending.extend_from_slice(chunk);
        let mut events = Vec::new();
        while let Some((line_end, next_start)) = self.next_line_break() {
            let line: Vec<u8> = self.pending.drain(..next_start).take(line_end).collect();
            let line = String::from_utf8_lossy(&line);
            if let Some(event) = self.process_line(&line) {
                events.push(event);
            }
        }
        events
    }

    fn next_line_break(&self) -> Option<(usize, usize)> {
        let position = self
            .pending
            .iter()
            .position(|&b| b == b'\n' || b == b'\r')?;
        if self.pending[position] == b'\n' {
            return Some((position, position + 1));
        }
        // A trailing '\r' may be the first half of "\r\n"; wait for more bytes.
        match self.pending.get(position + 1) {
            Some(b'\n') => Some((position, position + 2)),
            Some(_) => Some((position, position + 1)),
            None => None,
        }
    }

    fn process_line(&mut self, line: &str) -> Option<SourceEvent> {
        if line.is_empty() {
            return self.dispatch();
        }
        if line.starts_with(':') {
            return Some(SourceEvent::Heartbeat);
        }
        let (field, value) = match line.split_once(':') {
            Some((field, value)) => (field, value.strip_prefix(' ').unwrap_or(value)),
            None => (line, ""),
        };
        match field {
            "data" => {
                self.data.push(value.to_string());
                self.has_data = true;
            }
            "event" => self.event_type = value.to_string(),
            // `id` and `retry` carry nothing the dashboard uses.
            _ => {}
        }
        None
    }

    /// Only unnamed or `message` events carry snapshots; named events still
    /// count as traffic on the connection.
    fn dispatch(&mut self) -> Option<SourceEvent> {
        let event_type = std::mem::take(&mut self.event_type);
        if !self.has_data {
            return Some(SourceEvent::Heartbeat);
        }
        let payload = self.data.join("\n");
        self.data.clear();
        self.has_data = false;
        if event_type.is_empty() || event_type == "message" {
            Some(SourceEvent::Message(payload))
        } else {
            Some(SourceEvent::Heartbeat)
        }
    }
}
