//! Unit conversions and simulation tuning parameters.
//!
//! All internal quantities are SI (meters, seconds, m/s). Angles for
//! latitude, longitude, heading and track are kept in degrees.

// --- Units ---

/// One foot in meters.
pub const FT: f64 = 0.3048;

/// One knot in m/s.
pub const KTS: f64 = 1852.0 / 3600.0;

/// One foot per minute in m/s.
pub const FPM: f64 = FT / 60.0;

/// One nautical mile in meters.
pub const NM: f64 = 1852.0;

// --- Physics ---

/// Standard gravitational acceleration (m/s²).
pub const G0: f64 = 9.80665;

/// Mean Earth radius in meters.
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

// --- Kinematics ---

/// Default tick length in seconds.
pub const DEFAULT_DT: f64 = 1.0;

/// Bank angle used when no explicit bank is commanded (degrees).
pub const DEFAULT_BANK_DEG: f64 = 25.0;

/// Commanded bank angles at or below this are treated as "not set" (degrees).
pub const BANK_EPSILON_DEG: f64 = 0.1;

/// Floor on true airspeed in the turn-rate denominator (m/s).
pub const TAS_EPSILON: f64 = 0.1;

/// Default maximum longitudinal acceleration (m/s²).
pub const DEFAULT_AX_MAX: f64 = 1.0;

/// Vertical acceleration used while capturing a target vertical speed (m/s²).
pub const VS_ACCEL: f64 = 1.6;

/// Vertical speed error below which the target vertical speed is taken directly (m/s).
pub const VS_ENGAGE_THRESHOLD: f64 = 300.0 * FPM;

/// Factor applied to the per-tick altitude step to form the capture dead-band.
pub const ALT_CAPTURE_MARGIN: f64 = 1.05;

/// Climb/descent rate used when an altitude is commanded without a rate (m/s).
pub const DEFAULT_VS: f64 = 1500.0 * FPM;

/// Height above which wind affects the ground vector (m).
pub const WIND_MIN_ALT: f64 = 50.0 * FT;

// --- Conflict detection defaults ---

/// Horizontal separation minimum (m).
pub const DEFAULT_RPZ: f64 = 5.0 * NM;

/// Vertical separation minimum (m).
pub const DEFAULT_HPZ: f64 = 1000.0 * FT;

/// Look-ahead time for conflict prediction (s).
pub const DEFAULT_LOOKAHEAD_SECS: f64 = 300.0;

/// Interval between conflict detection runs (s).
pub const DEFAULT_CONFLICT_INTERVAL_SECS: f64 = 1.0;

// --- Traffic ---

/// Largest batch a single random-traffic command may create.
pub const MAX_RANDOM_AIRCRAFT: u32 = 10_000;

// --- Replay ---

/// Default resampling cadence of replay track tables (s).
pub const DEFAULT_RESAMPLE_SECS: f64 = 5.0;

/// Tolerance when comparing replay bucket times against sim time (s).
pub const TIME_EPSILON: f64 = 1e-6;
