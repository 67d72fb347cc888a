//! Event grammars recognised in a log message and the typed events they decode to.
//!
//! Grammars are tried in a fixed order and the first pattern that matches
//! decides the event. Several flag announcements are free-text sentences that
//! only differ in their tail, so the order is part of the format.

use std::str::FromStr;

use kinded::Kinded;
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use serde::Serialize;

use crate::types::{FlagColor, Slot, Team};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Kinded)]
#[kinded(derive(Serialize, PartialOrd, Ord))]
#[serde(tag = "type")]
pub enum LogEvent {
    /// A new match started. Slots handed out before this line are void.
    InitGame,
    ClientConnect {
        slot: Slot,
        name: String,
        /// Dotted-quad address with the port stripped.
        address: String,
    },
    ClientUserinfoChanged {
        slot: Slot,
        name: String,
        team: Team,
        class: String,
        /// Raw "wfc" value. `"0"` means the client is not playing a class.
        wfc: String,
    },
    ClientDisconnect {
        slot: Slot,
    },
    Kill {
        killer: Slot,
        victim: Slot,
        /// Numeric means-of-death code, kept as logged.
        cause_code: String,
        killer_name: String,
        victim_name: String,
        cause: String,
    },
    BaseDefend {
        name: String,
        color: FlagColor,
    },
    FlagDefend {
        name: String,
        color: FlagColor,
    },
    FlagGrab {
        name: String,
        color: FlagColor,
    },
    CarrierAssist {
        name: String,
        color: FlagColor,
    },
    FlagCapture {
        name: String,
        color: FlagColor,
    },
}

/// Outcome of running a message through the grammar table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decoded {
    Event(LogEvent),
    /// No grammar matched.
    Unmatched,
    /// A grammar matched but one of its numeric fields does not fit the
    /// event type (e.g. a slot wider than `u32`). Later grammars are not tried.
    Rejected(LogEventKind),
}

struct Grammar {
    kind: LogEventKind,
    pattern: Regex,
    extract: fn(&Captures<'_>) -> Option<LogEvent>,
}

fn grammar(
    kind: LogEventKind,
    pattern: &str,
    extract: fn(&Captures<'_>) -> Option<LogEvent>,
) -> Grammar {
    Grammar {
        kind,
        pattern: Regex::new(pattern).expect("event grammar pattern is a valid regex"),
        extract,
    }
}

fn text(caps: &Captures<'_>, name: &str) -> Option<String> {
    caps.name(name).map(|m| m.as_str().to_owned())
}

fn parsed<T: FromStr>(caps: &Captures<'_>, name: &str) -> Option<T> {
    caps.name(name)?.as_str().parse().ok()
}

static GRAMMARS: Lazy<Vec<Grammar>> = Lazy::new(|| {
    vec![
        grammar(LogEventKind::InitGame, r"^InitGame:", |_| Some(LogEvent::InitGame)),
        grammar(
            LogEventKind::ClientConnect,
            r"^ClientConnect: (?P<slot>\d+), Name: (?P<name>.*), Ip: (?P<address>\d{1,3}\.\d{1,3}\.\d{1,3}\.\d{1,3}):\d{1,5} DATE:",
            |caps| {
                Some(LogEvent::ClientConnect {
                    slot: parsed(caps, "slot")?,
                    name: text(caps, "name")?,
                    address: text(caps, "address")?,
                })
            },
        ),
        grammar(
            LogEventKind::ClientUserinfoChanged,
            r"^ClientUserinfoChanged: (?P<slot>\d+) n\\(?P<name>.*)\\t\\\d+\\.*(?P<team>blue|red)(?P<class>\w+)\\hmodel\\.*\\wfc\\(?P<wfc>\d+)",
            |caps| {
                Some(LogEvent::ClientUserinfoChanged {
                    slot: parsed(caps, "slot")?,
                    name: text(caps, "name")?,
                    team: parsed(caps, "team")?,
                    class: text(caps, "class")?,
                    wfc: text(caps, "wfc")?,
                })
            },
        ),
        grammar(
            LogEventKind::ClientDisconnect,
            r"^ClientDisconnect: (?P<slot>\d+)",
            |caps| {
                Some(LogEvent::ClientDisconnect {
                    slot: parsed(caps, "slot")?,
                })
            },
        ),
        grammar(
            LogEventKind::Kill,
            r"^Kill: (?P<killer>\d+) (?P<victim>\d+) (?P<cause_code>\d+): (?P<killer_name>.*) killed (?P<victim_name>.*) by (?P<cause>.*)",
            |caps| {
                Some(LogEvent::Kill {
                    killer: parsed(caps, "killer")?,
                    victim: parsed(caps, "victim")?,
                    cause_code: text(caps, "cause_code")?,
                    killer_name: text(caps, "killer_name")?,
                    victim_name: text(caps, "victim_name")?,
                    cause: text(caps, "cause")?,
                })
            },
        ),
        grammar(
            LogEventKind::BaseDefend,
            r"^(?P<name>.*) defends the (?P<color>RED|BLUE) base!",
            |caps| {
                Some(LogEvent::BaseDefend {
                    name: text(caps, "name")?,
                    color: parsed(caps, "color")?,
                })
            },
        ),
        grammar(
            LogEventKind::FlagDefend,
            r"^(?P<name>.*) defends the (?P<color>RED|BLUE) flag!",
            |caps| {
                Some(LogEvent::FlagDefend {
                    name: text(caps, "name")?,
                    color: parsed(caps, "color")?,
                })
            },
        ),
        grammar(
            LogEventKind::FlagGrab,
            r"^(?P<name>.*) got the (?P<color>RED|BLUE) flag!",
            |caps| {
                Some(LogEvent::FlagGrab {
                    name: text(caps, "name")?,
                    color: parsed(caps, "color")?,
                })
            },
        ),
        // "agressive" is spelled this way by the server.
        grammar(
            LogEventKind::CarrierAssist,
            r"^(?P<name>.*) defends a (?P<color>RED|BLUE) carrier from an agressive enemy!",
            |caps| {
                Some(LogEvent::CarrierAssist {
                    name: text(caps, "name")?,
                    color: parsed(caps, "color")?,
                })
            },
        ),
        grammar(
            LogEventKind::FlagCapture,
            r"^(?P<name>.*) captured the (?P<color>RED|BLUE) flag!",
            |caps| {
                Some(LogEvent::FlagCapture {
                    name: text(caps, "name")?,
                    color: parsed(caps, "color")?,
                })
            },
        ),
    ]
});

/// Match `message` against the grammar table. The first grammar whose
/// pattern matches wins.
pub fn decode_message(message: &str) -> Decoded {
    for grammar in GRAMMARS.iter() {
        if let Some(caps) = grammar.pattern.captures(message) {
            return match (grammar.extract)(&caps) {
                Some(event) => Decoded::Event(event),
                None => Decoded::Rejected(grammar.kind),
            };
        }
    }
    Decoded::Unmatched
}

/// Event kinds in the order their grammars are tried.
pub fn grammar_order() -> impl Iterator<Item = LogEventKind> {
    GRAMMARS.iter().map(|grammar| grammar.kind)
}
