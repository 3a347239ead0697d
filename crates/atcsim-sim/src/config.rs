//! Simulation configuration, loadable from JSON.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use atcsim_core::constants::{
    DEFAULT_CONFLICT_INTERVAL_SECS, DEFAULT_HPZ, DEFAULT_LOOKAHEAD_SECS, DEFAULT_RPZ, FT, NM,
};

use crate::error::{Result, TrafficError};
use crate::systems::wind::WindField;

/// Configuration for starting a new simulation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// RNG seed for determinism. Same seed = same random traffic.
    pub seed: u64,
    pub conflict: ConflictConfig,
    pub feed: FeedConfig,
    pub replay: ReplayConfig,
    /// Initial wind profile. Empty = no wind.
    pub wind: WindField,
    /// Area in which `MCRE` places random traffic.
    pub traffic_area: TrafficArea,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            conflict: ConflictConfig::default(),
            feed: FeedConfig::default(),
            replay: ReplayConfig::default(),
            wind: WindField::default(),
            traffic_area: TrafficArea::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConflictConfig {
    pub enabled: bool,
    /// Seconds between detection runs.
    pub interval_secs: f64,
    pub lookahead_secs: f64,
    /// Horizontal protected zone radius (NM).
    pub rpz_nm: f64,
    /// Vertical protected zone half-height (ft).
    pub hpz_ft: f64,
}

impl Default for ConflictConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            interval_secs: DEFAULT_CONFLICT_INTERVAL_SECS,
            lookahead_secs: DEFAULT_LOOKAHEAD_SECS,
            rpz_nm: DEFAULT_RPZ / NM,
            hpz_ft: DEFAULT_HPZ / FT,
        }
    }
}

impl ConflictConfig {
    /// Horizontal protected zone in meters.
    pub fn rpz(&self) -> f64 {
        self.rpz_nm * NM
    }

    /// Vertical protected zone in meters.
    pub fn hpz(&self) -> f64 {
        self.hpz_ft * FT
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedConfig {
    /// Create a register row for live samples with an unknown callsign.
    pub auto_create: bool,
    /// Delete a roster member after this many seconds without a fresh sample.
    pub coast_timeout_secs: Option<f64>,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            auto_create: true,
            coast_timeout_secs: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReplayConfig {
    /// Where ingested datasets are cached. `None` disables the cache.
    pub cache_dir: Option<PathBuf>,
    /// Resampling cadence of replay track tables (s).
    pub resample_secs: Option<f64>,
}

/// Lat/lon box for random traffic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrafficArea {
    pub lat: f64,
    pub lon: f64,
    /// Half-width of the box in degrees.
    pub half_width_deg: f64,
}

impl Default for TrafficArea {
    fn default() -> Self {
        Self {
            lat: 52.3,
            lon: 4.8,
            half_width_deg: 1.0,
        }
    }
}

impl SimConfig {
    /// Read and validate a JSON config file. Missing fields take defaults.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = fs::read_to_string(path.as_ref())?;
        let config: Self = serde_json::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        let c = &self.conflict;
        if !(c.interval_secs > 0.0) {
            return Err(invalid(format!(
                "conflict.interval_secs must be positive, got {}",
                c.interval_secs
            )));
        }
        if !(c.lookahead_secs > 0.0) {
            return Err(invalid(format!(
                "conflict.lookahead_secs must be positive, got {}",
                c.lookahead_secs
            )));
        }
        if !(c.rpz_nm > 0.0 && c.hpz_ft > 0.0) {
            return Err(invalid("protected zone dimensions must be positive".into()));
        }
        if let Some(t) = self.feed.coast_timeout_secs {
            if !(t > 0.0) {
                return Err(invalid(format!(
                    "feed.coast_timeout_secs must be positive, got {t}"
                )));
            }
        }
        if let Some(r) = self.replay.resample_secs {
            if !(r > 0.0) {
                return Err(invalid(format!(
                    "replay.resample_secs must be positive, got {r}"
                )));
            }
        }
        if !(self.traffic_area.half_width_deg >= 0.0) {
            return Err(invalid("traffic_area.half_width_deg must not be negative".into()));
        }
        Ok(())
    }
}

fn invalid(message: String) -> TrafficError {
    TrafficError::InvalidConfig(message)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_validate() {
        assert!(SimConfig::default().validate().is_ok());
    }

    #[test]
    fn test_partial_json_takes_defaults() {
        let config: SimConfig =
            serde_json::from_str(r#"{ "seed": 7, "conflict": { "interval_secs": 5.0 } }"#).unwrap();
        assert_eq!(config.seed, 7);
        assert_eq!(config.conflict.interval_secs, 5.0);
        assert_eq!(config.conflict.lookahead_secs, DEFAULT_LOOKAHEAD_SECS);
        assert!(config.feed.auto_create);
    }

    #[test]
    fn test_rejects_non_positive_interval() {
        let mut config = SimConfig::default();
        config.conflict.interval_secs = 0.0;
        assert!(matches!(
            config.validate(),
            Err(TrafficError::InvalidConfig(_))
        ));

        let mut config = SimConfig::default();
        config.replay.resample_secs = Some(-1.0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_wind_layers_from_json_are_ordered() {
        let config: SimConfig = serde_json::from_str(
            r#"{ "wind": { "layers": [
                { "alt": 3000.0, "velocity": [30.0, 0.0] },
                { "alt": 0.0, "velocity": [0.0, 0.0] }
            ] } }"#,
        )
        .unwrap();
        assert!((config.wind.at(1500.0).x - 15.0).abs() < 1e-9);
    }

    #[test]
    fn test_from_json_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sim.json");
        fs::write(&path, r#"{ "feed": { "coast_timeout_secs": 30.0 } }"#).unwrap();
        let config = SimConfig::from_json_file(&path).unwrap();
        assert_eq!(config.feed.coast_timeout_secs, Some(30.0));

        fs::write(&path, r#"{ "conflict": { "rpz_nm": 0.0 } }"#).unwrap();
        assert!(SimConfig::from_json_file(&path).is_err());
    }
}
