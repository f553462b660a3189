//! Driver-hours-and-route planning engine: HOS compliance, rest
//! optimization, stop sequencing, route simulation, and dynamic
//! replanning for heavy-truck operations.

pub mod config;
pub mod error;
pub mod types;

pub mod hos;
pub mod providers;
pub mod rest;
pub mod tsp;

pub mod simulator;

pub mod engine;
pub mod store;

pub mod dynamic;

pub mod concurrency;

pub use config::EngineConfig;
pub use error::{PlannerError, PlannerResult};
