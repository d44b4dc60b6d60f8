//! # Bootstrap Simulation
//!
//! Scenario runner that drives the real engine and fee curve against the
//! in-memory collaborators and prints one table per scenario.

pub mod report;
pub mod scenarios;

pub use report::Table;
pub use scenarios::Scenario;
