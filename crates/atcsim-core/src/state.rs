//! Traffic snapshot: the read-only view of the register between ticks.
//!
//! External readers (telemetry, visualization, tests) consume snapshots and
//! never hold references into the live register.

use serde::{Deserialize, Serialize};

use crate::types::{AircraftId, SimTime};

/// Complete traffic state after one tick.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrafficSnapshot {
    pub time: SimTime,
    pub aircraft: Vec<AircraftView>,
    pub conflicts: ConflictView,
    /// Callsigns currently driven by external track data, sorted.
    pub feed_roster: Vec<String>,
    pub wind_active: bool,
}

impl TrafficSnapshot {
    pub fn find(&self, callsign: &str) -> Option<&AircraftView> {
        self.aircraft.iter().find(|a| a.callsign == callsign)
    }
}

/// One aircraft as seen by a client.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AircraftView {
    pub id: AircraftId,
    pub callsign: String,
    pub actype: String,
    pub origin: String,
    pub destination: String,
    /// Latitude (degrees).
    pub lat: f64,
    /// Longitude (degrees).
    pub lon: f64,
    /// Altitude (m).
    pub alt: f64,
    /// Heading (degrees).
    pub hdg: f64,
    /// Track over ground (degrees).
    pub trk: f64,
    /// True airspeed (m/s).
    pub tas: f64,
    /// Calibrated airspeed (m/s).
    pub cas: f64,
    /// Ground speed (m/s).
    pub gs: f64,
    pub mach: f64,
    /// Vertical speed (m/s).
    pub vs: f64,
    pub sel_hdg: f64,
    pub sel_alt: f64,
    pub fed: bool,
    pub in_conflict: bool,
    /// Time to closest point of approach of the nearest conflict (s).
    pub time_to_cpa: f64,
    /// Distance flown under simulation (m).
    pub dist_flown: f64,
}

/// Conflict and loss-of-separation bookkeeping.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConflictView {
    /// Current conflict pairs, each ordered (a < b).
    pub conflict_pairs: Vec<(String, String)>,
    /// Current loss-of-separation pairs.
    pub los_pairs: Vec<(String, String)>,
    pub unique_conflicts: usize,
    pub total_conflicts: usize,
    pub unique_los: usize,
    pub total_los: usize,
    /// Sim time of the most recent detection run (s).
    pub last_detection_secs: Option<f64>,
}
