//! Snapshot system: copies the register into a read-only `TrafficSnapshot`.

use std::collections::BTreeSet;

use atcsim_core::state::{AircraftView, TrafficSnapshot};
use atcsim_core::types::SimTime;

use crate::systems::wind::WindField;
use crate::traffic::Traffic;

/// Build a snapshot of the current traffic state.
pub fn build_snapshot(
    traffic: &Traffic,
    time: &SimTime,
    roster: &BTreeSet<String>,
    wind: &WindField,
) -> TrafficSnapshot {
    TrafficSnapshot {
        time: *time,
        aircraft: build_aircraft(traffic),
        conflicts: traffic.conflict.view(),
        feed_roster: roster.iter().cloned().collect(),
        wind_active: wind.is_active(),
    }
}

fn build_aircraft(traffic: &Traffic) -> Vec<AircraftView> {
    let reg = &traffic.register;
    let conflict = &traffic.conflict;
    (0..reg.ntraf())
        .map(|i| AircraftView {
            id: reg.id[i],
            callsign: reg.callsign[i].clone(),
            actype: reg.actype[i].clone(),
            origin: reg.origin[i].clone(),
            destination: reg.destination[i].clone(),
            lat: reg.lat[i],
            lon: reg.lon[i],
            alt: reg.alt[i],
            hdg: reg.hdg[i],
            trk: reg.trk[i],
            tas: reg.tas[i],
            cas: reg.cas[i],
            gs: reg.gs[i],
            mach: reg.mach[i],
            vs: reg.vs[i],
            sel_hdg: reg.sel_hdg[i],
            sel_alt: reg.sel_alt[i],
            fed: reg.fed[i],
            in_conflict: conflict.in_conflict[i],
            time_to_cpa: conflict.time_to_cpa[i],
            dist_flown: reg.dist_flown[i],
        })
        .collect()
}
