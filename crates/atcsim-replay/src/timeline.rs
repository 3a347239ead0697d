//! Scripted scenario-bootstrap timeline derived from a track table.
//!
//! Every flight gets creation, origin/destination and roster commands at its
//! first track time and a deletion shortly after its last one.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use atcsim_core::aero::tas_to_cas;
use atcsim_core::commands::{ScenarioCommand, TimedCommand};

use crate::table::{TrackRow, TrackTable};

/// Flight metadata kept after filtering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlightInfo {
    pub flight_id: String,
    pub callsign: String,
    pub actype: String,
    pub origin: String,
    pub destination: String,
}

/// Build the command timeline, sorted by time. Commands sharing a time keep
/// flight order, creation first.
pub fn build_timeline(
    table: &TrackTable,
    flights: &[FlightInfo],
    delete_delay: f64,
) -> Vec<TimedCommand> {
    // callsign -> (first row, last time)
    let mut spans: HashMap<&str, (&TrackRow, f64)> = HashMap::new();
    for row in table.rows() {
        spans
            .entry(row.callsign.as_str())
            .and_modify(|span| span.1 = row.sim_time)
            .or_insert((row, row.sim_time));
    }

    let mut timeline = Vec::new();
    let mut seen: Vec<&str> = Vec::new();

    for flight in flights {
        let Some(&(first, last)) = spans.get(flight.callsign.as_str()) else {
            continue;
        };
        if seen.contains(&flight.callsign.as_str()) {
            tracing::warn!(callsign = %flight.callsign, flight_id = %flight.flight_id, "duplicate callsign in replay, keeping first flight");
            continue;
        }
        seen.push(flight.callsign.as_str());

        let t0 = first.sim_time;
        let callsign = flight.callsign.clone();
        timeline.push(TimedCommand::new(
            t0,
            ScenarioCommand::Create {
                callsign: callsign.clone(),
                actype: flight.actype.clone(),
                lat: first.lat,
                lon: first.lon,
                hdg: first.heading,
                alt: first.alt,
                cas: tas_to_cas(first.speed, first.alt),
            },
        ));
        if !flight.origin.is_empty() {
            timeline.push(TimedCommand::new(
                t0,
                ScenarioCommand::Origin {
                    callsign: callsign.clone(),
                    airport: flight.origin.clone(),
                },
            ));
        }
        if !flight.destination.is_empty() {
            timeline.push(TimedCommand::new(
                t0,
                ScenarioCommand::Destination {
                    callsign: callsign.clone(),
                    airport: flight.destination.clone(),
                },
            ));
        }
        timeline.push(TimedCommand::new(
            t0,
            ScenarioCommand::AddReplay {
                callsign: callsign.clone(),
            },
        ));
        timeline.push(TimedCommand::new(
            last + delete_delay,
            ScenarioCommand::Delete { callsign },
        ));
    }

    timeline.sort_by(|a, b| a.time.total_cmp(&b.time));
    timeline
}
