//! Structure-of-arrays aircraft register.
//!
//! One `Vec` per attribute, all indexed by the same row. Rows are compacted
//! on delete, so a row index is only valid until the next create/delete;
//! anything that must survive a resize holds an `AircraftId` or a callsign.

use std::collections::HashMap;
use std::ops::Range;

use atcsim_core::aero::{cas_to_tas, tas_to_cas, tas_to_mach};
use atcsim_core::constants::DEFAULT_AX_MAX;
use atcsim_core::geo::{normalize_heading, wrap_lon};
use atcsim_core::types::{AircraftId, TrackSample};

use super::ids::IdTable;
use super::lockstep::{remove_rows, LockstepArrays};

/// Applies `$body` to every column of the register, bound as `$col`.
macro_rules! for_each_column {
    (@each mut $reg:expr, $col:ident, $body:expr; $($field:ident)+) => {{
        $({
            let $col = &mut $reg.$field;
            $body;
        })+
    }};
    (@each ref $reg:expr, $col:ident, $body:expr; $($field:ident)+) => {{
        $({
            let $col = &$reg.$field;
            $body;
        })+
    }};
    ($mode:tt $reg:expr, |$col:ident| $body:expr) => {
        for_each_column!(@each $mode $reg, $col, $body;
            id callsign actype origin destination
            lat lon alt hdg trk tas cas mach gs gs_north gs_east vs
            sel_hdg sel_tas sel_alt sel_vs bank ax_max
            alt_select lnav vnav manual fed
            dist_flown created_at)
    };
}

/// Initial state of a new aircraft.
#[derive(Debug, Clone, PartialEq)]
pub struct NewAircraft {
    pub callsign: String,
    pub actype: String,
    /// Degrees.
    pub lat: f64,
    /// Degrees.
    pub lon: f64,
    /// Degrees.
    pub hdg: f64,
    /// Meters.
    pub alt: f64,
    /// Calibrated airspeed (m/s).
    pub cas: f64,
}

impl NewAircraft {
    /// Seed a row from an external track report. Ground speed stands in for
    /// airspeed until the reconciler derives the real value.
    pub fn from_sample(sample: &TrackSample, actype: &str) -> Self {
        Self {
            callsign: sample.callsign.clone(),
            actype: actype.to_string(),
            lat: sample.lat,
            lon: sample.lon,
            hdg: sample.heading,
            alt: sample.altitude,
            cas: tas_to_cas(sample.ground_speed, sample.altitude),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct AircraftRegister {
    // --- Identity ---
    pub id: Vec<AircraftId>,
    pub callsign: Vec<String>,
    pub actype: Vec<String>,
    pub origin: Vec<String>,
    pub destination: Vec<String>,

    // --- Position (degrees, m) ---
    pub lat: Vec<f64>,
    pub lon: Vec<f64>,
    pub alt: Vec<f64>,

    // --- Velocity (degrees, m/s) ---
    pub hdg: Vec<f64>,
    pub trk: Vec<f64>,
    pub tas: Vec<f64>,
    pub cas: Vec<f64>,
    pub mach: Vec<f64>,
    pub gs: Vec<f64>,
    pub gs_north: Vec<f64>,
    pub gs_east: Vec<f64>,
    pub vs: Vec<f64>,

    // --- Selected targets ---
    pub sel_hdg: Vec<f64>,
    pub sel_tas: Vec<f64>,
    pub sel_alt: Vec<f64>,
    /// Climb/descent rate magnitude for altitude changes (m/s); 0 = default.
    pub sel_vs: Vec<f64>,

    // --- Limits ---
    /// Commanded bank angle (degrees); at or near 0 means default bank.
    pub bank: Vec<f64>,
    /// Maximum longitudinal acceleration (m/s²).
    pub ax_max: Vec<f64>,

    // --- Mode flags ---
    pub alt_select: Vec<bool>,
    pub lnav: Vec<bool>,
    pub vnav: Vec<bool>,
    pub manual: Vec<bool>,
    pub fed: Vec<bool>,

    pub dist_flown: Vec<f64>,
    /// Sim time at creation (s).
    pub created_at: Vec<f64>,

    index: HashMap<String, usize>,
    ids: IdTable,
}

impl AircraftRegister {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ntraf(&self) -> usize {
        self.id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.id.is_empty()
    }

    /// Length of every column, in declaration order.
    pub fn column_lengths(&self) -> Vec<usize> {
        let mut lengths = Vec::new();
        for_each_column!(ref self, |col| lengths.push(col.len()));
        lengths
    }

    /// True when every column has `ntraf` rows.
    pub fn is_aligned(&self) -> bool {
        let n = self.ntraf();
        self.column_lengths().iter().all(|&len| len == n)
            && self.index.len() == n
            && self.ids.live() == n
    }

    /// Append one row per entry. Callers check callsign uniqueness first.
    pub fn create(&mut self, aircraft: &[NewAircraft], now: f64) -> Range<usize> {
        let rows = self.on_create(aircraft.len());
        for (row, new) in rows.clone().zip(aircraft) {
            let tas = cas_to_tas(new.cas, new.alt);
            let hdg = normalize_heading(new.hdg);
            let (east, north) = (hdg.to_radians().sin() * tas, hdg.to_radians().cos() * tas);

            self.callsign[row] = new.callsign.clone();
            self.actype[row] = new.actype.clone();
            self.lat[row] = new.lat;
            self.lon[row] = wrap_lon(new.lon);
            self.alt[row] = new.alt;
            self.hdg[row] = hdg;
            self.trk[row] = hdg;
            self.tas[row] = tas;
            self.cas[row] = new.cas;
            self.mach[row] = tas_to_mach(tas, new.alt);
            self.gs[row] = tas;
            self.gs_north[row] = north;
            self.gs_east[row] = east;
            self.sel_hdg[row] = hdg;
            self.sel_tas[row] = tas;
            self.sel_alt[row] = new.alt;
            self.ax_max[row] = DEFAULT_AX_MAX;
            self.created_at[row] = now;

            self.index.insert(new.callsign.clone(), row);
        }
        rows
    }

    /// Row of the aircraft with this callsign.
    pub fn id2idx(&self, callsign: &str) -> Option<usize> {
        self.index.get(callsign).copied()
    }

    pub fn id2idx_batch(&self, callsigns: &[&str]) -> Vec<Option<usize>> {
        callsigns.iter().map(|cs| self.id2idx(cs)).collect()
    }

    /// Current row of a stable id; `None` once the aircraft is deleted.
    pub fn row_of(&self, id: AircraftId) -> Option<usize> {
        self.ids.row_of(id)
    }

    pub fn contains(&self, callsign: &str) -> bool {
        self.index.contains_key(callsign)
    }

    /// Rebuild lookup tables for every row at or after `from`.
    fn reindex_from(&mut self, from: usize) {
        for row in from..self.ntraf() {
            self.index.insert(self.callsign[row].clone(), row);
            self.ids.relocate(self.id[row], row);
        }
    }
}

impl LockstepArrays for AircraftRegister {
    fn on_create(&mut self, n: usize) -> Range<usize> {
        let start = self.ntraf();
        let end = start + n;
        for_each_column!(mut self, |col| col.resize_with(end, Default::default));

        for row in start..end {
            self.id[row] = self.ids.issue(row);
        }
        start..end
    }

    fn on_delete(&mut self, rows: &[usize]) {
        let Some(&lowest) = rows.last() else {
            return;
        };
        for &row in rows {
            if row >= self.ntraf() {
                continue;
            }
            self.ids.retire(self.id[row]);
            self.index.remove(&self.callsign[row]);
        }
        for_each_column!(mut self, |col| remove_rows(col, rows));
        self.reindex_from(lowest);
    }

    fn len(&self) -> usize {
        self.ntraf()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traffic::lockstep::descending_rows;

    fn aircraft(callsign: &str, lat: f64) -> NewAircraft {
        NewAircraft {
            callsign: callsign.into(),
            actype: "B738".into(),
            lat,
            lon: 4.0,
            hdg: 90.0,
            alt: 3000.0,
            cas: 120.0,
        }
    }

    #[test]
    fn test_create_fills_row_and_index() {
        let mut reg = AircraftRegister::new();
        let rows = reg.create(&[aircraft("A", 52.0), aircraft("B", 53.0)], 10.0);
        assert_eq!(rows, 0..2);
        assert_eq!(reg.ntraf(), 2);
        assert!(reg.is_aligned());
        assert_eq!(reg.id2idx("B"), Some(1));
        assert_eq!(reg.lat[1], 53.0);
        assert_eq!(reg.sel_alt[0], 3000.0);
        assert!(reg.tas[0] > reg.cas[0], "TAS exceeds CAS above sea level");
        assert_eq!(reg.created_at[1], 10.0);
    }

    #[test]
    fn test_delete_compacts_and_reindexes() {
        let mut reg = AircraftRegister::new();
        reg.create(
            &[aircraft("A", 50.0), aircraft("B", 51.0), aircraft("C", 52.0), aircraft("D", 53.0)],
            0.0,
        );
        let id_d = reg.id[3];
        let id_b = reg.id[1];

        reg.on_delete(&descending_rows(&[0, 1], reg.ntraf()));
        assert_eq!(reg.ntraf(), 2);
        assert!(reg.is_aligned());
        assert_eq!(reg.id2idx("A"), None);
        assert_eq!(reg.id2idx("C"), Some(0));
        assert_eq!(reg.id2idx("D"), Some(1));
        assert_eq!(reg.lat[reg.row_of(id_d).unwrap()], 53.0);
        assert_eq!(reg.row_of(id_b), None);
    }

    #[test]
    fn test_stale_id_does_not_resolve_to_reused_slot() {
        let mut reg = AircraftRegister::new();
        reg.create(&[aircraft("A", 50.0)], 0.0);
        let old = reg.id[0];
        reg.on_delete(&[0]);
        reg.create(&[aircraft("B", 51.0)], 0.0);
        assert_eq!(reg.id[0].slot, old.slot);
        assert_eq!(reg.row_of(old), None);
        assert_eq!(reg.row_of(reg.id[0]), Some(0));
    }

    #[test]
    fn test_batch_lookup() {
        let mut reg = AircraftRegister::new();
        reg.create(&[aircraft("A", 50.0), aircraft("B", 51.0)], 0.0);
        assert_eq!(reg.id2idx_batch(&["B", "X", "A"]), vec![Some(1), None, Some(0)]);
    }
}
