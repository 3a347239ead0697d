//! Spherical-earth geodesy helpers.
//!
//! Latitudes, longitudes and bearings are in degrees, distances in meters.
//! Bearings are true, measured clockwise from North.

use crate::constants::EARTH_RADIUS_M;

/// Normalize a heading into [0, 360).
pub fn normalize_heading(deg: f64) -> f64 {
    deg.rem_euclid(360.0)
}

/// Shortest signed turn from `from` to `to`, in [-180, 180).
pub fn heading_delta(from: f64, to: f64) -> f64 {
    (to - from + 180.0).rem_euclid(360.0) - 180.0
}

/// Wrap a longitude into [-180, 180).
pub fn wrap_lon(lon: f64) -> f64 {
    (lon + 180.0).rem_euclid(360.0) - 180.0
}

/// Point reached from (`lat`, `lon`) after `dist` meters along `bearing`.
pub fn destination_point(lat: f64, lon: f64, bearing: f64, dist: f64) -> (f64, f64) {
    let phi1 = lat.to_radians();
    let lambda1 = lon.to_radians();
    let theta = bearing.to_radians();
    let delta = dist / EARTH_RADIUS_M;

    let sin_phi2 = phi1.sin() * delta.cos() + phi1.cos() * delta.sin() * theta.cos();
    let phi2 = sin_phi2.clamp(-1.0, 1.0).asin();
    let lambda2 = lambda1
        + (theta.sin() * delta.sin() * phi1.cos()).atan2(delta.cos() - phi1.sin() * sin_phi2);

    (phi2.to_degrees(), wrap_lon(lambda2.to_degrees()))
}

/// Initial bearing (degrees) and great-circle distance (m) between two points.
pub fn bearing_distance(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> (f64, f64) {
    let phi1 = lat1.to_radians();
    let phi2 = lat2.to_radians();
    let dphi = phi2 - phi1;
    let dlambda = (lon2 - lon1).to_radians();

    let a = (dphi / 2.0).sin().powi(2) + phi1.cos() * phi2.cos() * (dlambda / 2.0).sin().powi(2);
    let dist = 2.0 * EARTH_RADIUS_M * a.sqrt().min(1.0).asin();

    let y = dlambda.sin() * phi2.cos();
    let x = phi1.cos() * phi2.sin() - phi1.sin() * phi2.cos() * dlambda.cos();
    (normalize_heading(y.atan2(x).to_degrees()), dist)
}
