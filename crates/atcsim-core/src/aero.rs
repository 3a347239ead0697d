//! International Standard Atmosphere and airspeed conversions.
//!
//! Troposphere with a constant lapse rate up to 11 km, isothermal above.
//! Airspeed conversions use the compressible (subsonic) pitot relations.

use crate::constants::G0;

/// Sea level temperature (K).
pub const T0: f64 = 288.15;
/// Sea level pressure (Pa).
pub const P0: f64 = 101_325.0;
/// Sea level density (kg/m³).
pub const RHO0: f64 = 1.225;
/// Specific gas constant for dry air (J/kg/K).
pub const R_AIR: f64 = 287.052_87;
/// Ratio of specific heats.
pub const GAMMA: f64 = 1.40;
/// Temperature lapse rate in the troposphere (K/m).
pub const LAPSE_RATE: f64 = -0.0065;
/// Tropopause altitude (m).
pub const H_TROPOPAUSE: f64 = 11_000.0;
/// Temperature at and above the tropopause (K).
pub const T_TROPOPAUSE: f64 = T0 + LAPSE_RATE * H_TROPOPAUSE;

/// Atmospheric state at one altitude.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Atmosphere {
    /// Static pressure (Pa).
    pub pressure: f64,
    /// Density (kg/m³).
    pub density: f64,
    /// Static temperature (K).
    pub temperature: f64,
}

impl Atmosphere {
    /// ISA state at geopotential altitude `h` (m).
    pub fn at(h: f64) -> Self {
        let temperature = temperature(h);
        let pressure = pressure(h);
        Self {
            pressure,
            density: pressure / (R_AIR * temperature),
            temperature,
        }
    }

    /// Speed of sound (m/s).
    pub fn speed_of_sound(&self) -> f64 {
        (GAMMA * R_AIR * self.temperature).sqrt()
    }
}

/// Static temperature at altitude `h` (K).
pub fn temperature(h: f64) -> f64 {
    (T0 + LAPSE_RATE * h).max(T_TROPOPAUSE)
}

/// Static pressure at altitude `h` (Pa).
pub fn pressure(h: f64) -> f64 {
    let exponent = -G0 / (LAPSE_RATE * R_AIR);
    if h <= H_TROPOPAUSE {
        P0 * (temperature(h) / T0).powf(exponent)
    } else {
        let p_trop = P0 * (T_TROPOPAUSE / T0).powf(exponent);
        p_trop * (-G0 / (R_AIR * T_TROPOPAUSE) * (h - H_TROPOPAUSE)).exp()
    }
}

/// True airspeed to calibrated airspeed (m/s).
pub fn tas_to_cas(tas: f64, h: f64) -> f64 {
    let atm = Atmosphere::at(h);
    let qdyn = atm.pressure
        * ((1.0 + atm.density * tas * tas / (7.0 * atm.pressure)).powf(3.5) - 1.0);
    let cas = (7.0 * P0 / RHO0 * ((qdyn / P0 + 1.0).powf(2.0 / 7.0) - 1.0)).sqrt();
    cas.copysign(tas)
}

/// Calibrated airspeed to true airspeed (m/s).
pub fn cas_to_tas(cas: f64, h: f64) -> f64 {
    let atm = Atmosphere::at(h);
    let qdyn = P0 * ((1.0 + RHO0 * cas * cas / (7.0 * P0)).powf(3.5) - 1.0);
    let tas = (7.0 * atm.pressure / atm.density * ((1.0 + qdyn / atm.pressure).powf(2.0 / 7.0) - 1.0))
        .sqrt();
    tas.copysign(cas)
}

/// True airspeed to Mach number.
pub fn tas_to_mach(tas: f64, h: f64) -> f64 {
    tas / Atmosphere::at(h).speed_of_sound()
}

/// Mach number to true airspeed (m/s).
pub fn mach_to_tas(mach: f64, h: f64) -> f64 {
    mach * Atmosphere::at(h).speed_of_sound()
}
