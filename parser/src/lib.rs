pub mod analyzer;
pub mod config;
mod error;
pub mod line;
mod log_file;
pub mod types;

pub use config::ParserConfig;
pub use error::*;
pub use log_file::*;
pub use strum;

pub use analyzer::stats_controller::{PlayerRecord, StatsController, StatsReport};
