//! Simulation engine for the ATC traffic simulation.
//!
//! Owns the structure-of-arrays aircraft register, runs the per-tick
//! pipeline (resize, kinematics, conflict interface, feed reconciliation)
//! and produces `TrafficSnapshot`s for external readers.

pub mod config;
pub mod engine;
pub mod error;
pub mod scenario;
pub mod spawn;
pub mod systems;
pub mod traffic;

pub use atcsim_core as core;
pub use atcsim_replay as replay;
pub use config::SimConfig;
pub use engine::SimulationEngine;
pub use error::TrafficError;
pub use traffic::{LockstepArrays, Traffic};

#[cfg(test)]
mod tests;
