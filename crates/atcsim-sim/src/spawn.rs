//! Random traffic generation for `MCRE`.

use rand::seq::SliceRandom;
use rand::Rng;
use rand_chacha::ChaCha8Rng;

use atcsim_core::constants::{FT, KTS};

use crate::config::TrafficArea;
use crate::traffic::NewAircraft;

const ACTYPES: [&str; 6] = ["A320", "A321", "B738", "B77W", "E190", "A333"];

/// `count` aircraft spread over `area`, level between FL100 and FL350.
///
/// Callsigns are `RNDnnnn` from `serial` upward, skipping any for which
/// `taken` is true, so the result never collides with live traffic.
pub fn random_aircraft(
    rng: &mut ChaCha8Rng,
    count: u32,
    area: &TrafficArea,
    taken: impl Fn(&str) -> bool,
    serial: &mut u32,
) -> Vec<NewAircraft> {
    let w = area.half_width_deg;
    let mut aircraft = Vec::with_capacity(count as usize);
    for _ in 0..count {
        let callsign = loop {
            *serial += 1;
            let candidate = format!("RND{:04}", *serial);
            if !taken(&candidate) {
                break candidate;
            }
        };
        let actype = ACTYPES.choose(rng).copied().unwrap_or("B738");
        let fl: u32 = rng.gen_range(100..=350);
        aircraft.push(NewAircraft {
            callsign,
            actype: actype.to_string(),
            lat: area.lat + rng.gen_range(-w..=w),
            lon: area.lon + rng.gen_range(-w..=w),
            hdg: rng.gen_range(0.0..360.0),
            alt: f64::from(fl) * 100.0 * FT,
            cas: rng.gen_range(250.0..=300.0) * KTS,
        });
    }
    aircraft
}
