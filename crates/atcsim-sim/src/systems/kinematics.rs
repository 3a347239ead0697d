//! Kinematic integration over the whole register.
//!
//! Each stage is one pass over every row with no per-aircraft control flow
//! beyond element-wise selects, so results depend only on register contents
//! and `dt`.

use glam::DVec2;

use atcsim_core::aero::{tas_to_cas, tas_to_mach};
use atcsim_core::constants::{
    ALT_CAPTURE_MARGIN, BANK_EPSILON_DEG, DEFAULT_BANK_DEG, DEFAULT_VS, EARTH_RADIUS_M, G0,
    TAS_EPSILON, VS_ACCEL, VS_ENGAGE_THRESHOLD, WIND_MIN_ALT,
};
use atcsim_core::geo::{heading_delta, normalize_heading, wrap_lon};

use crate::systems::conflict::ConflictState;
use crate::systems::wind::WindField;
use crate::traffic::AircraftRegister;

/// Advance every aircraft by `dt` seconds.
pub fn run(reg: &mut AircraftRegister, conflict: &ConflictState, wind: &WindField, dt: f64) {
    if reg.is_empty() {
        return;
    }
    update_airspeed(reg, conflict, dt);
    update_heading(reg, dt);
    update_vertical(reg, conflict, dt);
    update_groundspeed(reg, wind);
    update_position(reg, dt);
}

/// One rate-limited step from `current` toward `target`.
pub fn step_toward(current: f64, target: f64, max_step: f64) -> f64 {
    let delta = target - current;
    if delta.abs() > max_step {
        current + max_step * delta.signum()
    } else {
        target
    }
}

/// Turn rate in degrees per second for a bank angle (degrees) and TAS (m/s).
pub fn turn_rate(bank_deg: f64, tas: f64) -> f64 {
    let bank = if bank_deg > BANK_EPSILON_DEG {
        bank_deg
    } else {
        DEFAULT_BANK_DEG
    };
    (G0 * bank.to_radians().tan() / tas.max(TAS_EPSILON)).to_degrees()
}

fn update_airspeed(reg: &mut AircraftRegister, conflict: &ConflictState, dt: f64) {
    for i in 0..reg.ntraf() {
        let target = if conflict.resolution_active[i] {
            conflict.resolution_tas[i]
        } else {
            reg.sel_tas[i]
        };
        reg.tas[i] = step_toward(reg.tas[i], target, dt * reg.ax_max[i]);
        reg.cas[i] = tas_to_cas(reg.tas[i], reg.alt[i]);
        reg.mach[i] = tas_to_mach(reg.tas[i], reg.alt[i]);
    }
}

fn update_heading(reg: &mut AircraftRegister, dt: f64) {
    for i in 0..reg.ntraf() {
        let rate = turn_rate(reg.bank[i], reg.tas[i]);
        let delta = heading_delta(reg.hdg[i], reg.sel_hdg[i]);
        reg.hdg[i] = if delta.abs() > dt * rate {
            normalize_heading(reg.hdg[i] + dt * rate * delta.signum())
        } else {
            normalize_heading(reg.sel_hdg[i])
        };
    }
}

fn update_vertical(reg: &mut AircraftRegister, conflict: &ConflictState, dt: f64) {
    for i in 0..reg.ntraf() {
        let (target_alt, rate) = if conflict.resolution_active[i] {
            (conflict.resolution_alt[i], conflict.resolution_vs[i])
        } else {
            (reg.sel_alt[i], reg.sel_vs[i])
        };
        let rate = if rate.abs() > 0.0 { rate.abs() } else { DEFAULT_VS };

        let alt_error = target_alt - reg.alt[i];
        let dead_band = ALT_CAPTURE_MARGIN * (dt * rate).abs().max((dt * reg.vs[i]).abs());
        reg.alt_select[i] = alt_error.abs() > dead_band;

        let target_vs = if reg.alt_select[i] {
            rate * alt_error.signum()
        } else {
            0.0
        };
        let vs_error = target_vs - reg.vs[i];
        let vs = if vs_error.abs() > VS_ENGAGE_THRESHOLD {
            step_toward(reg.vs[i], target_vs, VS_ACCEL * dt)
        } else {
            target_vs
        };
        reg.vs[i] = if vs.is_finite() { vs } else { 0.0 };

        reg.alt[i] = if reg.alt_select[i] {
            reg.alt[i] + reg.vs[i] * dt
        } else {
            target_alt
        };
    }
}

fn update_groundspeed(reg: &mut AircraftRegister, wind: &WindField) {
    let windy = wind.is_active();
    for i in 0..reg.ntraf() {
        let hdg = reg.hdg[i].to_radians();
        let air = DVec2::new(reg.tas[i] * hdg.sin(), reg.tas[i] * hdg.cos());
        let ground = if windy && reg.alt[i] > WIND_MIN_ALT {
            air + wind.at(reg.alt[i])
        } else {
            air
        };
        reg.gs_east[i] = ground.x;
        reg.gs_north[i] = ground.y;
        reg.gs[i] = ground.length();
        reg.trk[i] = if ground == air {
            reg.hdg[i]
        } else {
            normalize_heading(ground.x.atan2(ground.y).to_degrees())
        };
    }
}

fn update_position(reg: &mut AircraftRegister, dt: f64) {
    for i in 0..reg.ntraf() {
        reg.lat[i] += (dt * reg.gs_north[i] / EARTH_RADIUS_M).to_degrees();
        let coslat = reg.lat[i].to_radians().cos();
        reg.lon[i] = wrap_lon(reg.lon[i] + (dt * reg.gs_east[i] / (coslat * EARTH_RADIUS_M)).to_degrees());
        if !reg.fed[i] {
            reg.dist_flown[i] += reg.gs[i] * dt;
        }
    }
}
