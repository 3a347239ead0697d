//! Core types and definitions for the ATC traffic simulation.
//!
//! This crate defines the vocabulary shared across all other crates:
//! units and constants, the standard atmosphere, geodesy helpers,
//! identity types, scenario commands, events and read-only snapshots.
//! It has no dependency on the simulation runtime.

pub mod aero;
pub mod commands;
pub mod constants;
pub mod error;
pub mod events;
pub mod geo;
pub mod state;
pub mod types;

#[cfg(test)]
mod tests;
