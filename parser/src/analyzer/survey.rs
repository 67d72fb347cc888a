use std::collections::BTreeMap;

use kinded::Kinded;
use serde::Serialize;

use super::events::{LogEvent, LogEventKind};

/// Line accounting for one parse. Everything the engine skips ends up in one
/// of these counters.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct SurveyStats {
    pub total_lines: u64,
    /// Lines with a `MM:SS` clock.
    pub event_lines: u64,
    /// Lines without a clock.
    pub malformed_lines: u64,
    /// Clocked lines no grammar recognised.
    pub unmatched_messages: u64,
    /// Recognised lines with a numeric field that does not fit.
    pub rejected_messages: u64,
    /// Events naming a slot or player nobody holds.
    pub unresolved_references: u64,
    pub events_by_kind: BTreeMap<LogEventKind, u64>,
}

impl SurveyStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn record(&mut self, event: &LogEvent) {
        *self.events_by_kind.entry(event.kind()).or_default() += 1;
    }

    pub fn events(&self) -> u64 {
        self.events_by_kind.values().sum()
    }
}
