//! Grotto clearing simulator
//!
//! Estimates, by Monte Carlo simulation, the expected time needed to clear
//! every probabilistic spawn in a small directed travel graph, given that
//! reloads at a station periodically re-roll the spawns.

pub mod budget;
pub mod config;
pub mod events;
pub mod graph;
pub mod location;
pub mod logging;
pub mod simulation;
pub mod stats;
pub mod walker;

#[cfg(feature = "python")]
mod python;

pub use config::{ConfigError, SimConfig};
pub use simulation::{run_and_aggregate, RunOptions, Scenario};
pub use stats::{AggregatedStats, SimResult};
