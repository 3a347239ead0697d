//! Events emitted by the simulation for logging and client feedback.

use serde::{Deserialize, Serialize};

/// Why an aircraft left the register.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeleteReason {
    /// Explicit delete command (scripted or manual).
    Command,
    /// No fresh track data within the coast timeout.
    CoastTimeout,
}

/// Simulation events, drained by the host after each tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum SimEvent {
    /// Aircraft entered the register.
    AircraftCreated { callsign: String },
    /// Aircraft left the register.
    AircraftDeleted {
        callsign: String,
        reason: DeleteReason,
    },
    /// Aircraft joined (`fed = true`) or left the feed roster.
    RosterChanged { callsign: String, fed: bool },
    /// A feed sample or roster member could not be reconciled.
    ReconcileSkipped { callsign: String, reason: String },
    /// A replay dataset was loaded and armed.
    ReplayLoaded {
        dataset: String,
        flights: usize,
        rows: usize,
        from_cache: bool,
    },
    /// A command could not be applied.
    CommandFailed { command: String, message: String },
}
