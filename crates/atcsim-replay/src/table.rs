//! Canonical, time-indexed track table.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use atcsim_core::constants::TIME_EPSILON;
use atcsim_core::types::TrackSample;

use crate::error::{ReplayError, Result};

/// One normalized track point. SI units, degrees for angles.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackRow {
    /// Seconds since the start of the replay slice.
    pub sim_time: f64,
    pub callsign: String,
    pub lat: f64,
    pub lon: f64,
    /// Altitude (m).
    pub alt: f64,
    /// True heading (degrees).
    pub heading: f64,
    /// Ground speed (m/s).
    pub speed: f64,
}

impl TrackRow {
    /// Convert to a feed sample stamped at `offset + sim_time`.
    pub fn to_sample(&self, offset: f64) -> TrackSample {
        TrackSample {
            timestamp: offset + self.sim_time,
            callsign: self.callsign.clone(),
            lat: self.lat,
            lon: self.lon,
            heading: self.heading,
            altitude: self.alt,
            ground_speed: self.speed,
        }
    }
}

/// Rows sorted ascending by `sim_time`; rows sharing a time keep insertion order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrackTable {
    rows: Vec<TrackRow>,
}

/// Index of the fixed-width time bucket containing `t`.
pub fn bucket_index(t: f64, cadence: f64) -> i64 {
    ((t + TIME_EPSILON) / cadence).floor() as i64
}

impl TrackTable {
    pub fn from_rows(mut rows: Vec<TrackRow>) -> Self {
        rows.sort_by(|a, b| a.sim_time.total_cmp(&b.sim_time));
        Self { rows }
    }

    /// Resample onto a fixed cadence. Each row moves to the start of its
    /// bucket; per (bucket, callsign) the latest row wins.
    pub fn resampled(self, cadence: f64) -> Result<Self> {
        if !(cadence.is_finite() && cadence > 0.0) {
            return Err(ReplayError::BadCadence(cadence));
        }

        let mut buckets: BTreeMap<(i64, String), TrackRow> = BTreeMap::new();
        for mut row in self.rows {
            let bucket = bucket_index(row.sim_time, cadence);
            row.sim_time = bucket as f64 * cadence;
            buckets.insert((bucket, row.callsign.clone()), row);
        }

        Ok(Self {
            rows: buckets.into_values().collect(),
        })
    }

    pub fn rows(&self) -> &[TrackRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Time of the last row (s), zero when empty.
    pub fn duration(&self) -> f64 {
        self.rows.last().map_or(0.0, |r| r.sim_time)
    }

    pub fn callsigns(&self) -> BTreeSet<&str> {
        self.rows.iter().map(|r| r.callsign.as_str()).collect()
    }

    /// First and last row time of one callsign.
    pub fn span_of(&self, callsign: &str) -> Option<(f64, f64)> {
        let mut rows = self.rows.iter().filter(|r| r.callsign == callsign);
        let first = rows.next()?.sim_time;
        let last = rows.last().map_or(first, |r| r.sim_time);
        Some((first, last))
    }
}
