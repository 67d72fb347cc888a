use std::collections::BTreeMap;

use serde::Serialize;

use crate::types::{FlagColor, Timestamp};

use super::report::PlayerRecord;

/// Counter keyed by a free-text name from the log (cause of death, class).
pub type Tally = BTreeMap<String, u64>;

fn bump(tally: &mut Tally, key: &str, amount: u64) {
    *tally.entry(key.to_owned()).or_default() += amount;
}

/// The class a player is currently spawned as.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClassSession {
    pub class: String,
    pub since: Timestamp,
}

/// An enemy flag currently held by the player.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FlagCarry {
    pub color: FlagColor,
    pub since: Timestamp,
}

/// Consecutive kills without dying.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Killstreak {
    current: u32,
    best: u32,
}

impl Killstreak {
    pub fn current(&self) -> u32 {
        self.current
    }

    /// Longest streak that has been closed out. The running streak only
    /// counts once it ends.
    pub fn best(&self) -> u32 {
        self.best
    }

    fn extend(&mut self) {
        self.current += 1;
    }

    fn end(&mut self) {
        self.best = self.best.max(self.current);
        self.current = 0;
    }
}

/// Cumulative totals for a player across every match in the log.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct PlayerStats {
    pub kills: u64,
    pub kills_by_cause: Tally,
    pub deaths: u64,
    pub deaths_by_cause: Tally,
    /// Self-inflicted deaths that were not deliberate.
    pub oopsies: u64,
    pub assists: u64,
    pub base_defends: u64,
    pub flag_defends: u64,
    pub flag_grabs: u64,
    pub flag_captures: u64,
    /// Seconds spent carrying a flag.
    pub flag_carry_time: u64,
    /// Seconds spent playing any class.
    pub played_time: u64,
    pub played_time_by_class: Tally,
}

/// One human across the whole log, however many times they reconnected or
/// renamed.
#[derive(Debug, Clone, Serialize)]
pub struct Player {
    name: String,
    aliases: Vec<String>,
    address: String,
    stats: PlayerStats,
    killstreak: Killstreak,
    class: Option<ClassSession>,
    flag: Option<FlagCarry>,
}

impl Player {
    pub fn new(name: &str, address: &str) -> Player {
        Player {
            name: name.to_owned(),
            aliases: vec![name.to_owned()],
            address: address.to_owned(),
            stats: PlayerStats::default(),
            killstreak: Killstreak::default(),
            class: None,
            flag: None,
        }
    }

    pub fn name(&self) -> &str {
        self.name.as_ref()
    }

    /// Every name this player has used, oldest first.
    pub fn aliases(&self) -> &[String] {
        self.aliases.as_ref()
    }

    pub fn address(&self) -> &str {
        self.address.as_ref()
    }

    pub fn stats(&self) -> &PlayerStats {
        &self.stats
    }

    pub fn killstreak(&self) -> Killstreak {
        self.killstreak
    }

    pub fn class(&self) -> Option<&ClassSession> {
        self.class.as_ref()
    }

    pub fn flag(&self) -> Option<&FlagCarry> {
        self.flag.as_ref()
    }

    pub(crate) fn set_address(&mut self, address: &str) {
        if self.address != address {
            self.address = address.to_owned();
        }
    }

    /// Make `name` canonical, remembering it as an alias the first time it is seen.
    pub(crate) fn rename(&mut self, name: &str) {
        if !self.aliases.iter().any(|alias| alias == name) {
            self.aliases.push(name.to_owned());
        }
        if self.name != name {
            self.name = name.to_owned();
        }
    }

    /// Switch to `class` (or to no class) at `at`. Repeating the current
    /// class keeps the running session.
    pub(crate) fn change_class(&mut self, at: Timestamp, class: Option<&str>) {
        let current = self.class.as_ref().map(|session| session.class.as_str());
        if current == class {
            return;
        }

        self.end_class(at);
        if let Some(class) = class {
            self.class = Some(ClassSession {
                class: class.to_owned(),
                since: at,
            });
        }
    }

    fn end_class(&mut self, at: Timestamp) {
        let Some(session) = self.class.take() else {
            return;
        };
        let played = at.elapsed_since(session.since);
        if played > 0 {
            bump(&mut self.stats.played_time_by_class, &session.class, played);
            self.stats.played_time += played;
        }
    }

    fn drop_flag(&mut self, at: Timestamp) {
        if let Some(carry) = self.flag.take() {
            self.stats.flag_carry_time += at.elapsed_since(carry.since);
        }
    }

    /// Close every open session at `at`: the match ended, the client left,
    /// or the log ran out.
    pub(crate) fn close_sessions(&mut self, at: Timestamp) {
        self.drop_flag(at);
        self.killstreak.end();
        self.end_class(at);
    }

    pub(crate) fn frag(&mut self, cause: &str) {
        bump(&mut self.stats.kills_by_cause, cause, 1);
        self.stats.kills += 1;
        self.killstreak.extend();
    }

    /// A deliberate self-kill: the flag is lost but no death is counted.
    pub(crate) fn intentional_death(&mut self, at: Timestamp) {
        self.drop_flag(at);
    }

    pub(crate) fn death(&mut self, at: Timestamp, cause: &str, self_inflicted: bool) {
        self.drop_flag(at);
        self.killstreak.end();
        self.stats.deaths += 1;
        bump(&mut self.stats.deaths_by_cause, cause, 1);
        if self_inflicted {
            self.stats.oopsies += 1;
        }
    }

    pub(crate) fn defend_base(&mut self) {
        self.stats.base_defends += 1;
    }

    pub(crate) fn defend_flag(&mut self) {
        self.stats.flag_defends += 1;
    }

    pub(crate) fn assist_carrier(&mut self) {
        self.stats.assists += 1;
    }

    /// Picking up a flag restarts the carry timer; an uncaptured earlier
    /// carry is not credited.
    pub(crate) fn grab_flag(&mut self, at: Timestamp, color: FlagColor) {
        self.stats.flag_grabs += 1;
        self.flag = Some(FlagCarry { color, since: at });
    }

    pub(crate) fn capture_flag(&mut self, at: Timestamp) {
        self.drop_flag(at);
        self.stats.flag_captures += 1;
    }

    pub fn to_record(&self, unnamed_sentinel: &str) -> PlayerRecord {
        PlayerRecord {
            aliases: self
                .aliases
                .iter()
                .filter(|alias| alias.as_str() != unnamed_sentinel)
                .cloned()
                .collect(),
            assists: self.stats.assists,
            base_defends: self.stats.base_defends,
            deaths: self.stats.deaths,
            deaths_by_type: self.stats.deaths_by_cause.clone(),
            flag_captures: self.stats.flag_captures,
            flag_carry_time: self.stats.flag_carry_time,
            flag_defends: self.stats.flag_defends,
            flag_grabs: self.stats.flag_grabs,
            killstreak: self.killstreak.best(),
            kills: self.stats.kills,
            kills_by_type: self.stats.kills_by_cause.clone(),
            last_client_name: self.name.clone(),
            last_ip_address: self.address.clone(),
            oopsies: self.stats.oopsies,
            played_time: self.stats.played_time,
            played_time_by_class: self.stats.played_time_by_class.clone(),
        }
    }
}
