use std::io::Write;

use serde::{Deserialize, Serialize};

use super::player::Tally;
use crate::Error;

/// Exported statistics for one player.
///
/// Fields are declared in key order so the JSON output is sorted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerRecord {
    pub aliases: Vec<String>,
    pub assists: u64,
    pub base_defends: u64,
    pub deaths: u64,
    pub deaths_by_type: Tally,
    pub flag_captures: u64,
    pub flag_carry_time: u64,
    pub flag_defends: u64,
    pub flag_grabs: u64,
    /// Best closed-out killstreak.
    pub killstreak: u32,
    pub kills: u64,
    pub kills_by_type: Tally,
    pub last_client_name: String,
    pub last_ip_address: String,
    pub oopsies: u64,
    pub played_time: u64,
    pub played_time_by_class: Tally,
}

/// Every player seen in a log, in the order they first connected.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StatsReport {
    players: Vec<PlayerRecord>,
}

impl StatsReport {
    pub fn new(players: Vec<PlayerRecord>) -> Self {
        Self { players }
    }

    pub fn players(&self) -> &[PlayerRecord] {
        self.players.as_ref()
    }

    pub fn find(&self, name: &str) -> Option<&PlayerRecord> {
        self.players
            .iter()
            .find(|player| player.last_client_name == name)
    }

    pub fn into_players(self) -> Vec<PlayerRecord> {
        self.players
    }

    /// Write the report as a JSON array indented by four spaces. The writer
    /// is flushed before returning so buffered failures surface here.
    pub fn write_json<W: Write>(&self, writer: W) -> Result<(), Error> {
        let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
        let mut serializer = serde_json::Serializer::with_formatter(writer, formatter);
        self.serialize(&mut serializer)?;
        serializer.into_inner().flush()?;
        Ok(())
    }

    pub fn to_json_string(&self) -> Result<String, Error> {
        let mut out = Vec::new();
        self.write_json(&mut out)?;
        Ok(String::from_utf8_lossy(&out).into_owned())
    }
}
