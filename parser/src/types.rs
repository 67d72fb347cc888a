use serde::{Deserialize, Serialize};
use std::fmt;
use strum_macros::{AsRefStr, EnumString};

/// Per-match client slot number assigned by the server (`ClientConnect: 3`).
/// Slots are reused between matches and are meaningless across an `InitGame`.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Slot(pub u32);

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for Slot {
    fn from(v: u32) -> Self {
        Slot(v)
    }
}

impl std::str::FromStr for Slot {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse().map(Slot)
    }
}

/// A log clock value in whole seconds since the server started writing the log.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timestamp(pub u64);

impl Timestamp {
    pub fn from_minutes_seconds(minutes: u64, seconds: u64) -> Self {
        Timestamp(minutes.saturating_mul(60).saturating_add(seconds))
    }

    /// Seconds elapsed from `since` to `self`. Zero when the clock went
    /// backwards or did not move.
    pub fn elapsed_since(self, since: Timestamp) -> u64 {
        self.0.saturating_sub(since.0)
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{:02}", self.0 / 60, self.0 % 60)
    }
}

impl From<u64> for Timestamp {
    fn from(v: u64) -> Self {
        Timestamp(v)
    }
}

/// Flag colors as they appear in the capture-the-flag announcements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumString, AsRefStr)]
#[strum(serialize_all = "UPPERCASE")]
pub enum FlagColor {
    Red,
    Blue,
}

/// Team prefix of the model string in a userinfo line (`redsoldier`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumString, AsRefStr)]
#[strum(serialize_all = "lowercase")]
pub enum Team {
    Red,
    Blue,
}
