//! Data-feed reconciliation.
//!
//! Aircraft on the feed roster are driven by external track samples instead
//! of local integration. Each tick, after kinematics, their rows are either
//! overwritten from a fresh sample or restored from the last reconciled
//! state (coasting), and derived airspeeds are recomputed.

use std::collections::{BTreeSet, HashMap};

use glam::DVec2;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use atcsim_core::aero::{tas_to_cas, tas_to_mach};
use atcsim_core::constants::{TIME_EPSILON, WIND_MIN_ALT};
use atcsim_core::geo::{normalize_heading, wrap_lon};
use atcsim_core::types::TrackSample;

use crate::config::FeedConfig;
use crate::systems::wind::WindField;
use crate::traffic::{AircraftRegister, Traffic};

/// Externally driven state of one fed aircraft, as last reconciled.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FedState {
    pub lat: f64,
    pub lon: f64,
    pub alt: f64,
    /// Reported heading, taken as track over ground (degrees).
    pub hdg: f64,
    pub gs: f64,
    pub vs: f64,
}

impl FedState {
    /// State of a simulated row, with its track as the reported heading.
    fn from_simulated(reg: &AircraftRegister, row: usize) -> Self {
        Self {
            lat: reg.lat[row],
            lon: reg.lon[row],
            alt: reg.alt[row],
            hdg: reg.trk[row],
            gs: reg.gs[row],
            vs: reg.vs[row],
        }
    }

    /// State of a row just overwritten or restored, before airspeeds are
    /// derived, so `hdg` still holds the reported value.
    fn from_reconciled(reg: &AircraftRegister, row: usize) -> Self {
        Self {
            hdg: reg.hdg[row],
            ..Self::from_simulated(reg, row)
        }
    }

    fn write(&self, reg: &mut AircraftRegister, row: usize) {
        reg.lat[row] = self.lat;
        reg.lon[row] = self.lon;
        reg.alt[row] = self.alt;
        reg.hdg[row] = self.hdg;
        reg.gs[row] = self.gs;
        reg.vs[row] = self.vs;
    }
}

/// When a roster member last had fresh data.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Freshness {
    since: f64,
    /// False until the first real sample; the roster add time stands in.
    sampled: bool,
}

/// What one reconciliation pass did.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReconcileReport {
    pub fresh: Vec<String>,
    pub coasted: Vec<String>,
    /// (callsign, reason) pairs that could not be reconciled.
    pub skipped: Vec<(String, String)>,
    /// Roster members past the coast timeout.
    pub timed_out: Vec<String>,
}

#[derive(Debug, Clone, Default)]
pub struct DataFeedReconciler {
    roster: BTreeSet<String>,
    previous: HashMap<String, FedState>,
    freshness: HashMap<String, Freshness>,
    staged: Option<Vec<TrackSample>>,
    config: FeedConfig,
}

impl DataFeedReconciler {
    pub fn new(config: FeedConfig) -> Self {
        Self {
            config,
            ..Default::default()
        }
    }

    pub fn config(&self) -> &FeedConfig {
        &self.config
    }

    pub fn roster(&self) -> &BTreeSet<String> {
        &self.roster
    }

    pub fn is_fed(&self, callsign: &str) -> bool {
        self.roster.contains(callsign)
    }

    pub fn previous(&self, callsign: &str) -> Option<&FedState> {
        self.previous.get(callsign)
    }

    pub fn has_staged(&self) -> bool {
        self.staged.is_some()
    }

    /// Put an aircraft under feed control. Its current state seeds the coast
    /// snapshot so it holds position until the first sample arrives.
    /// Returns `false` if it was already on the roster.
    pub fn add(&mut self, traffic: &mut Traffic, row: usize, now: f64) -> bool {
        let reg = &mut traffic.register;
        let callsign = reg.callsign[row].clone();
        if !self.roster.insert(callsign.clone()) {
            return false;
        }
        reg.fed[row] = true;
        self.previous
            .insert(callsign.clone(), FedState::from_simulated(reg, row));
        self.freshness.insert(
            callsign.clone(),
            Freshness {
                since: now,
                sampled: false,
            },
        );
        info!(callsign = %callsign, "added to feed roster");
        true
    }

    /// Return an aircraft to full simulation. Idempotent: returns `false`
    /// when it was not on the roster.
    pub fn release(&mut self, traffic: &mut Traffic, callsign: &str) -> bool {
        if !self.roster.remove(callsign) {
            return false;
        }
        self.previous.remove(callsign);
        self.freshness.remove(callsign);
        if let Some(row) = traffic.id2idx(callsign) {
            traffic.register.fed[row] = false;
        }
        info!(callsign = %callsign, "released from feed roster");
        true
    }

    /// Forget a deleted aircraft.
    pub fn purge(&mut self, callsign: &str) {
        self.roster.remove(callsign);
        self.previous.remove(callsign);
        self.freshness.remove(callsign);
    }

    /// Stage a batch for the next reconciliation. A batch staged on top of an
    /// unconsumed one is appended, so later samples still win.
    pub fn stage_batch(&mut self, samples: Vec<TrackSample>) {
        match &mut self.staged {
            Some(staged) => staged.extend(samples),
            None => self.staged = Some(samples),
        }
    }

    pub fn discard_staged(&mut self) {
        self.staged = None;
    }

    /// Reconcile every roster member against the staged batch, if any.
    pub fn run(&mut self, traffic: &mut Traffic, wind: &WindField, now: f64) -> ReconcileReport {
        let batch = self.staged.take();
        let mut report = ReconcileReport::default();
        if self.roster.is_empty() {
            return report;
        }

        let reg = &mut traffic.register;
        for callsign in &self.roster {
            if !reg.contains(callsign) {
                report
                    .skipped
                    .push((callsign.clone(), "roster member not in register".into()));
            }
        }

        // Last sample per callsign wins.
        let mut latest: HashMap<&str, &TrackSample> = HashMap::new();
        let mut unknown: BTreeSet<&str> = BTreeSet::new();
        for sample in batch.iter().flatten() {
            latest.insert(sample.callsign.as_str(), sample);
            if !reg.contains(&sample.callsign) {
                unknown.insert(sample.callsign.as_str());
            }
        }
        for callsign in unknown {
            report
                .skipped
                .push((callsign.to_string(), "sample for unknown callsign".into()));
        }

        // Roster rows in register order, split into fresh and stale.
        let mut fresh: Vec<(usize, &TrackSample)> = Vec::new();
        let mut stale: Vec<usize> = Vec::new();
        let mut members: Vec<usize> = Vec::new();
        for row in 0..reg.ntraf() {
            if !self.roster.contains(&reg.callsign[row]) {
                continue;
            }
            members.push(row);
            match latest.get(reg.callsign[row].as_str()) {
                Some(&sample) => fresh.push((row, sample)),
                None => stale.push(row),
            }
        }

        for &(row, sample) in &fresh {
            let callsign = reg.callsign[row].clone();
            let vs = match (self.previous.get(&callsign), self.freshness.get(&callsign)) {
                (Some(prev), Some(f)) if f.sampled && now - f.since > TIME_EPSILON => {
                    (sample.altitude - prev.alt) / (now - f.since)
                }
                (Some(prev), Some(f)) if f.sampled => prev.vs,
                _ => 0.0,
            };
            FedState {
                lat: sample.lat,
                lon: wrap_lon(sample.lon),
                alt: sample.altitude,
                hdg: normalize_heading(sample.heading),
                gs: sample.ground_speed,
                vs: if vs.is_finite() { vs } else { 0.0 },
            }
            .write(reg, row);
            self.freshness.insert(
                callsign.clone(),
                Freshness {
                    since: now,
                    sampled: true,
                },
            );
            report.fresh.push(callsign);
        }

        for &row in &stale {
            let callsign = reg.callsign[row].clone();
            match self.previous.get(&callsign) {
                Some(prev) => prev.write(reg, row),
                None => report
                    .skipped
                    .push((callsign.clone(), "no reconciled state to coast from".into())),
            }
            if let (Some(timeout), Some(f)) =
                (self.config.coast_timeout_secs, self.freshness.get(&callsign))
            {
                if now - f.since > timeout {
                    report.timed_out.push(callsign.clone());
                }
            }
            report.coasted.push(callsign);
        }

        for &row in &members {
            self.previous
                .insert(reg.callsign[row].clone(), FedState::from_reconciled(reg, row));
        }

        derive_airspeeds(reg, &members, wind);

        for (callsign, reason) in &report.skipped {
            warn!(callsign = %callsign, reason = %reason, "reconciliation skipped");
        }
        for callsign in &report.timed_out {
            info!(callsign = %callsign, "feed coast timeout");
        }
        debug!(
            fresh = report.fresh.len(),
            coasted = report.coasted.len(),
            "feed reconciled"
        );
        report
    }
}

/// Recompute airspeeds, track and targets of fed rows from their
/// reported ground vector.
fn derive_airspeeds(reg: &mut AircraftRegister, rows: &[usize], wind: &WindField) {
    for &row in rows {
        let track = reg.hdg[row];
        let t = track.to_radians();
        let ground = DVec2::new(reg.gs[row] * t.sin(), reg.gs[row] * t.cos());
        reg.gs_east[row] = ground.x;
        reg.gs_north[row] = ground.y;
        reg.trk[row] = track;

        let (tas, hdg) = if wind.is_active() && reg.alt[row] > WIND_MIN_ALT {
            let air = ground - wind.at(reg.alt[row]);
            (air.length(), normalize_heading(air.x.atan2(air.y).to_degrees()))
        } else {
            (reg.gs[row], track)
        };
        reg.tas[row] = tas;
        reg.hdg[row] = hdg;
        reg.cas[row] = tas_to_cas(tas, reg.alt[row]);
        reg.mach[row] = tas_to_mach(tas, reg.alt[row]);

        reg.sel_hdg[row] = hdg;
        reg.sel_tas[row] = tas;
        reg.sel_alt[row] = reg.alt[row];
    }
}
