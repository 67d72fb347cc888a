#[allow(clippy::module_inception)]
pub mod analyzer;
pub mod event_dump;
pub mod events;
pub mod stats_controller;
pub mod survey;

pub use analyzer::*;
