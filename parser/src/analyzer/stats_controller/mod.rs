mod controller;
pub mod player;
pub mod registry;
pub mod report;

pub use controller::StatsController;
pub use player::{ClassSession, FlagCarry, Killstreak, Player, PlayerStats, Tally};
pub use registry::{PlayerId, PlayerRegistry};
pub use report::{PlayerRecord, StatsReport};
