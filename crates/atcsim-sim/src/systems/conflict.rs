//! Conflict detection and resolution interface.
//!
//! Detection and resolution are pluggable (`ConflictDetector`,
//! `ConflictResolver`) and run on a throttled schedule. Their outputs live in
//! `ConflictState`, a lockstep dependent of the register, and persist
//! unchanged between runs.

use std::collections::BTreeSet;
use std::ops::Range;

use glam::DVec2;
use tracing::{debug, warn};

use atcsim_core::constants::TIME_EPSILON;
use atcsim_core::geo::bearing_distance;
use atcsim_core::state::ConflictView;

use crate::config::ConflictConfig;
use crate::traffic::lockstep::{remove_rows, LockstepArrays};
use crate::traffic::{AircraftRegister, Traffic};

/// Relative speeds below this are treated as parallel flight (m/s, squared).
const REL_SPEED_EPSILON_SQ: f64 = 1e-9;

/// Vertical closure below this is treated as level (m/s).
const REL_VS_EPSILON: f64 = 1e-6;

/// A predicted conflict between rows `a < b`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PairConflict {
    pub a: usize,
    pub b: usize,
    /// Time to closest point of approach (s).
    pub tcpa: f64,
    /// Horizontal distance at CPA (m).
    pub dcpa: f64,
}

/// Output of one detection run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Detection {
    pub conflicts: Vec<PairConflict>,
    /// Pairs already inside each other's protected zone.
    pub los: Vec<(usize, usize)>,
}

/// Resolver output, one entry per register row.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Resolution {
    /// Rows on which the resolver asserts authority.
    pub active: Vec<bool>,
    /// True airspeed targets (m/s).
    pub tas: Vec<f64>,
    /// Vertical speed magnitudes (m/s).
    pub vs: Vec<f64>,
    /// Altitude targets (m).
    pub alt: Vec<f64>,
}

impl Resolution {
    fn len_matches(&self, n: usize) -> bool {
        self.active.len() == n && self.tas.len() == n && self.vs.len() == n && self.alt.len() == n
    }
}

pub trait ConflictDetector {
    fn detect(&mut self, register: &AircraftRegister) -> Detection;
}

pub trait ConflictResolver {
    fn resolve(
        &mut self,
        state: &ConflictState,
        ownship: &AircraftRegister,
        intruders: &AircraftRegister,
    ) -> Resolution;
}

/// Per-row conflict results, resolution outputs and running pair counters.
#[derive(Debug, Clone, Default)]
pub struct ConflictState {
    pub in_conflict: Vec<bool>,
    pub time_to_cpa: Vec<f64>,

    pub resolution_active: Vec<bool>,
    pub resolution_tas: Vec<f64>,
    pub resolution_vs: Vec<f64>,
    pub resolution_alt: Vec<f64>,

    /// Current pairs by callsign, each ordered.
    pub conflict_pairs: BTreeSet<(String, String)>,
    pub los_pairs: BTreeSet<(String, String)>,
    all_conflicts: BTreeSet<(String, String)>,
    all_los: BTreeSet<(String, String)>,
    /// Conflict onsets seen so far.
    pub total_conflicts: usize,
    pub total_los: usize,
    pub last_run: Option<f64>,
}

fn ordered(a: &str, b: &str) -> (String, String) {
    if a <= b {
        (a.to_string(), b.to_string())
    } else {
        (b.to_string(), a.to_string())
    }
}

impl ConflictState {
    pub fn unique_conflicts(&self) -> usize {
        self.all_conflicts.len()
    }

    pub fn unique_los(&self) -> usize {
        self.all_los.len()
    }

    /// Record a detection run.
    pub fn apply(&mut self, detection: &Detection, register: &AircraftRegister, now: f64) {
        let n = register.ntraf();
        let mut tcpa = vec![f64::INFINITY; n];
        self.in_conflict.iter_mut().for_each(|c| *c = false);

        let mut pairs = BTreeSet::new();
        for c in &detection.conflicts {
            if c.a >= n || c.b >= n {
                continue;
            }
            for row in [c.a, c.b] {
                self.in_conflict[row] = true;
                tcpa[row] = tcpa[row].min(c.tcpa);
            }
            pairs.insert(ordered(&register.callsign[c.a], &register.callsign[c.b]));
        }
        for (row, t) in tcpa.into_iter().enumerate() {
            self.time_to_cpa[row] = if t.is_finite() { t } else { 0.0 };
        }

        let los: BTreeSet<_> = detection
            .los
            .iter()
            .filter(|(a, b)| *a < n && *b < n)
            .map(|&(a, b)| ordered(&register.callsign[a], &register.callsign[b]))
            .collect();

        self.total_conflicts += pairs.difference(&self.conflict_pairs).count();
        self.total_los += los.difference(&self.los_pairs).count();
        self.all_conflicts.extend(pairs.iter().cloned());
        self.all_los.extend(los.iter().cloned());
        self.conflict_pairs = pairs;
        self.los_pairs = los;
        self.last_run = Some(now);
    }

    /// Take resolver output. A length mismatch is rejected and authority is
    /// withdrawn from every row.
    pub fn accept(&mut self, resolution: Resolution) -> bool {
        let n = self.in_conflict.len();
        if !resolution.len_matches(n) {
            self.resolution_active.iter_mut().for_each(|a| *a = false);
            return false;
        }
        self.resolution_active = resolution.active;
        self.resolution_tas = resolution.tas;
        self.resolution_vs = resolution.vs;
        self.resolution_alt = resolution.alt;
        true
    }

    /// Drop current pairs that involve deleted callsigns.
    pub fn forget(&mut self, callsigns: &[String]) {
        let gone = |pair: &(String, String)| callsigns.contains(&pair.0) || callsigns.contains(&pair.1);
        self.conflict_pairs.retain(|p| !gone(p));
        self.los_pairs.retain(|p| !gone(p));
    }

    pub fn view(&self) -> ConflictView {
        ConflictView {
            conflict_pairs: self.conflict_pairs.iter().cloned().collect(),
            los_pairs: self.los_pairs.iter().cloned().collect(),
            unique_conflicts: self.unique_conflicts(),
            total_conflicts: self.total_conflicts,
            unique_los: self.unique_los(),
            total_los: self.total_los,
            last_detection_secs: self.last_run,
        }
    }
}

impl LockstepArrays for ConflictState {
    fn on_create(&mut self, n: usize) -> Range<usize> {
        let start = self.in_conflict.len();
        let end = start + n;
        self.in_conflict.resize(end, false);
        self.time_to_cpa.resize(end, 0.0);
        self.resolution_active.resize(end, false);
        self.resolution_tas.resize(end, 0.0);
        self.resolution_vs.resize(end, 0.0);
        self.resolution_alt.resize(end, 0.0);
        start..end
    }

    fn on_delete(&mut self, rows: &[usize]) {
        remove_rows(&mut self.in_conflict, rows);
        remove_rows(&mut self.time_to_cpa, rows);
        remove_rows(&mut self.resolution_active, rows);
        remove_rows(&mut self.resolution_tas, rows);
        remove_rows(&mut self.resolution_vs, rows);
        remove_rows(&mut self.resolution_alt, rows);
    }

    fn len(&self) -> usize {
        self.in_conflict.len()
    }
}

/// Explicit timer for throttled detection.
#[derive(Debug, Clone, PartialEq)]
pub struct ConflictSchedule {
    interval: f64,
    next_due: f64,
}

impl ConflictSchedule {
    pub fn new(interval: f64) -> Self {
        Self {
            interval,
            next_due: 0.0,
        }
    }

    pub fn interval(&self) -> f64 {
        self.interval
    }

    /// Takes effect after the next run.
    pub fn set_interval(&mut self, interval: f64) {
        self.interval = interval;
    }

    pub fn is_due(&self, now: f64) -> bool {
        now + TIME_EPSILON >= self.next_due
    }

    pub fn mark_run(&mut self, now: f64) {
        self.next_due = now + self.interval;
    }
}

/// Straight-line CPA detector with cylindrical protected zones.
#[derive(Debug, Clone, PartialEq)]
pub struct StateBasedDetector {
    /// Horizontal protected zone radius (m).
    pub rpz: f64,
    /// Vertical protected zone half-height (m).
    pub hpz: f64,
    pub lookahead: f64,
}

impl StateBasedDetector {
    pub fn from_config(config: &ConflictConfig) -> Self {
        Self {
            rpz: config.rpz(),
            hpz: config.hpz(),
            lookahead: config.lookahead_secs,
        }
    }

    /// Check one pair; `None` if they never meet within the lookahead.
    fn check(&self, reg: &AircraftRegister, a: usize, b: usize) -> Option<(PairConflict, bool)> {
        let (qdr, dist) = bearing_distance(reg.lat[a], reg.lon[a], reg.lat[b], reg.lon[b]);
        let qdr = qdr.to_radians();
        let rel_pos = DVec2::new(dist * qdr.sin(), dist * qdr.cos());
        let rel_vel = DVec2::new(reg.gs_east[b] - reg.gs_east[a], reg.gs_north[b] - reg.gs_north[a]);
        let dalt = reg.alt[b] - reg.alt[a];
        let dvs = reg.vs[b] - reg.vs[a];

        let v2 = rel_vel.length_squared();
        let (tcpa, dcpa) = if v2 > REL_SPEED_EPSILON_SQ {
            let t = -rel_pos.dot(rel_vel) / v2;
            (t, (rel_pos + rel_vel * t).length())
        } else {
            (0.0, dist)
        };
        if dcpa >= self.rpz {
            return None;
        }

        let (h_in, h_out) = if v2 > REL_SPEED_EPSILON_SQ {
            let half = (self.rpz * self.rpz - dcpa * dcpa).sqrt() / v2.sqrt();
            (tcpa - half, tcpa + half)
        } else {
            (f64::NEG_INFINITY, f64::INFINITY)
        };

        let (v_in, v_out) = if dvs.abs() > REL_VS_EPSILON {
            let t1 = (-self.hpz - dalt) / dvs;
            let t2 = (self.hpz - dalt) / dvs;
            (t1.min(t2), t1.max(t2))
        } else if dalt.abs() < self.hpz {
            (f64::NEG_INFINITY, f64::INFINITY)
        } else {
            return None;
        };

        let t_in = h_in.max(v_in);
        let t_out = h_out.min(v_out);
        if t_in >= t_out || t_out <= 0.0 || t_in >= self.lookahead {
            return None;
        }

        let los = dist < self.rpz && dalt.abs() < self.hpz;
        Some((PairConflict { a, b, tcpa, dcpa }, los))
    }
}

impl ConflictDetector for StateBasedDetector {
    fn detect(&mut self, register: &AircraftRegister) -> Detection {
        let n = register.ntraf();
        let mut detection = Detection::default();
        for a in 0..n {
            for b in (a + 1)..n {
                if let Some((conflict, los)) = self.check(register, a, b) {
                    detection.conflicts.push(conflict);
                    if los {
                        detection.los.push((a, b));
                    }
                }
            }
        }
        detection
    }
}

/// Resolver that never takes control; targets mirror the selected values.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoResolution;

impl ConflictResolver for NoResolution {
    fn resolve(
        &mut self,
        _state: &ConflictState,
        ownship: &AircraftRegister,
        _intruders: &AircraftRegister,
    ) -> Resolution {
        Resolution {
            active: vec![false; ownship.ntraf()],
            tas: ownship.sel_tas.clone(),
            vs: ownship.sel_vs.clone(),
            alt: ownship.sel_alt.clone(),
        }
    }
}

/// Run detection then resolution, storing both in `traffic.conflict`.
pub fn run(
    traffic: &mut Traffic,
    detector: &mut dyn ConflictDetector,
    resolver: &mut dyn ConflictResolver,
    now: f64,
) {
    let detection = detector.detect(&traffic.register);
    traffic.conflict.apply(&detection, &traffic.register, now);

    let resolution = resolver.resolve(&traffic.conflict, &traffic.register, &traffic.register);
    if !traffic.conflict.accept(resolution) {
        warn!(
            ntraf = traffic.ntraf(),
            "resolver output does not match register length, authority withdrawn"
        );
    }

    debug!(
        conflicts = traffic.conflict.conflict_pairs.len(),
        los = traffic.conflict.los_pairs.len(),
        time = now,
        "conflict detection"
    );
}
