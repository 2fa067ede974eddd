//! Library crate for db-latency-probe exposing reusable modules.
pub mod aggregator;
pub mod cli;
pub mod error;
pub mod prober;
pub mod report;
pub mod runner;
pub mod targets;
pub mod types;
