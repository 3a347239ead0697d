//! Wind field: an altitude profile of horizontal wind vectors.
//!
//! Vectors use x = east, y = north (m/s), pointing where the air moves to.

use glam::DVec2;
use serde::{Deserialize, Serialize};

/// Layers within this height of each other are the same layer (m).
const LAYER_MERGE_M: f64 = 1.0;

/// Wind at one altitude.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WindLayer {
    /// Meters.
    pub alt: f64,
    pub velocity: DVec2,
}

/// Wind profile. Linear between layers, constant beyond the outermost ones.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "WindProfile")]
pub struct WindField {
    /// Sorted by altitude, finite values only.
    layers: Vec<WindLayer>,
}

/// Wind profile as written in a config file, in any order.
#[derive(Deserialize)]
struct WindProfile {
    #[serde(default)]
    layers: Vec<WindLayer>,
}

impl TryFrom<WindProfile> for WindField {
    type Error = String;

    fn try_from(profile: WindProfile) -> Result<Self, Self::Error> {
        let mut field = Self::default();
        for layer in profile.layers {
            if !layer.alt.is_finite() || !layer.velocity.is_finite() {
                return Err(format!("wind layer at {} m is not finite", layer.alt));
            }
            field.insert(layer);
        }
        Ok(field)
    }
}

/// Velocity of a wind blowing *from* `from_deg` at `speed` m/s.
pub fn wind_vector(from_deg: f64, speed: f64) -> DVec2 {
    let to = (from_deg + 180.0).to_radians();
    DVec2::new(speed * to.sin(), speed * to.cos())
}

impl WindField {
    /// Same wind at every altitude.
    pub fn uniform(from_deg: f64, speed: f64) -> Self {
        Self {
            layers: vec![WindLayer {
                alt: 0.0,
                velocity: wind_vector(from_deg, speed),
            }],
        }
    }

    pub fn is_active(&self) -> bool {
        !self.layers.is_empty()
    }

    pub fn layers(&self) -> &[WindLayer] {
        &self.layers
    }

    /// Add or replace the layer at `alt`. Without an altitude the whole
    /// profile is replaced by a uniform wind.
    pub fn set(&mut self, from_deg: f64, speed: f64, alt: Option<f64>) {
        let Some(alt) = alt else {
            *self = Self::uniform(from_deg, speed);
            return;
        };
        self.insert(WindLayer {
            alt,
            velocity: wind_vector(from_deg, speed),
        });
    }

    /// Keep layers sorted; a layer at an existing altitude replaces it.
    fn insert(&mut self, layer: WindLayer) {
        match self
            .layers
            .iter_mut()
            .find(|l| (l.alt - layer.alt).abs() < LAYER_MERGE_M)
        {
            Some(existing) => *existing = layer,
            None => {
                self.layers.push(layer);
                self.layers.sort_by(|a, b| a.alt.total_cmp(&b.alt));
            }
        }
    }

    pub fn clear(&mut self) {
        self.layers.clear();
    }

    /// Wind velocity at altitude `alt`; zero when inactive.
    pub fn at(&self, alt: f64) -> DVec2 {
        let (first, last) = match (self.layers.first(), self.layers.last()) {
            (Some(first), Some(last)) => (first, last),
            _ => return DVec2::ZERO,
        };
        if alt <= first.alt {
            return first.velocity;
        }
        if alt >= last.alt {
            return last.velocity;
        }
        let upper = self.layers.partition_point(|l| l.alt <= alt);
        let (lo, hi) = (&self.layers[upper - 1], &self.layers[upper]);
        let f = (alt - lo.alt) / (hi.alt - lo.alt);
        lo.velocity.lerp(hi.velocity, f)
    }
}
