//! Per-tick stages that operate on the traffic register.
//!
//! Stages are free functions taking the register (or `Traffic`) and their
//! collaborators explicitly. They hold no hidden state; anything that
//! persists between ticks is passed in.

pub mod conflict;
pub mod datafeed;
pub mod kinematics;
pub mod snapshot;
pub mod wind;
