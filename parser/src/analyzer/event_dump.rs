use std::io::Write;

use serde::Serialize;
use tracing::warn;

use crate::analyzer::Analyzer;
use crate::analyzer::events::{Decoded, LogEvent, decode_message};
use crate::line::parse_line;
use crate::types::Timestamp;

#[derive(Serialize)]
struct DumpedEvent<'a> {
    clock: Timestamp,
    #[serde(flatten)]
    event: &'a LogEvent,
}

/// Writes every recognised event as one JSON object per line.
pub struct EventDump<W> {
    output: W,
}

impl<W: Write> EventDump<W> {
    pub fn new(output: W) -> Self {
        Self { output }
    }

    pub fn into_inner(self) -> W {
        self.output
    }
}

impl<W: Write> Analyzer for EventDump<W> {
    fn process(&mut self, line: &str) {
        let Some(parsed) = parse_line(line) else {
            return;
        };
        let Decoded::Event(event) = decode_message(parsed.message) else {
            return;
        };

        let dumped = DumpedEvent {
            clock: parsed.timestamp,
            event: &event,
        };
        let written = serde_json::to_writer(&mut self.output, &dumped)
            .map_err(std::io::Error::from)
            .and_then(|_| self.output.write_all(b"\n"));
        if let Err(e) = written {
            warn!("failed to write event: {e}");
        }
    }

    fn finish(&mut self) {
        if let Err(e) = self.output.flush() {
            warn!("failed to flush event dump: {e}");
        }
    }
}
