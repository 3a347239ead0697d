//! Fundamental identity, time and track-data types.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Stable logical identity of an aircraft.
///
/// The register row of an aircraft shifts when other rows are deleted; the
/// id does not. A slot is reused only with a bumped generation, so an id kept
/// across a delete never resolves to the aircraft that took its slot.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct AircraftId {
    pub slot: u32,
    pub generation: u32,
}

impl AircraftId {
    pub fn new(slot: u32, generation: u32) -> Self {
        Self { slot, generation }
    }
}

impl fmt::Display for AircraftId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "A{}g{}", self.slot, self.generation)
    }
}

/// Simulation time tracking.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SimTime {
    /// Current tick number (increments by 1 each tick).
    pub tick: u64,
    /// Elapsed simulation time in seconds.
    pub elapsed_secs: f64,
}

impl SimTime {
    /// Advance by one tick of `dt` seconds.
    pub fn advance(&mut self, dt: f64) {
        self.tick += 1;
        self.elapsed_secs += dt;
    }
}

/// One externally supplied position report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackSample {
    /// Report time (s, simulation time base).
    pub timestamp: f64,
    pub callsign: String,
    /// Latitude (degrees).
    pub lat: f64,
    /// Longitude (degrees).
    pub lon: f64,
    /// True heading (degrees).
    pub heading: f64,
    /// Altitude (m).
    pub altitude: f64,
    /// Ground speed (m/s).
    pub ground_speed: f64,
}
