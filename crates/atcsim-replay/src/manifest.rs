//! Dataset manifest (`dataset.json`) describing provider-specific encodings.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Result;

pub const MANIFEST_FILE: &str = "dataset.json";

/// Geographic reference of a polar export.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReferencePoint {
    /// Latitude (degrees).
    pub lat: f64,
    /// Longitude (degrees).
    pub lon: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatasetManifest {
    /// Radar reference point for range/bearing positions.
    pub reference: Option<ReferencePoint>,
    /// Added to exported bearings and headings to make them true (degrees).
    pub magnetic_variation_deg: f64,
    /// Flight status codes that mark a flight as cancelled (case-insensitive).
    pub cancelled_status: Vec<String>,
}

impl Default for DatasetManifest {
    fn default() -> Self {
        Self {
            reference: None,
            magnetic_variation_deg: 0.0,
            cancelled_status: vec!["CNL".into(), "CANCELLED".into()],
        }
    }
}

impl DatasetManifest {
    /// Read `dataset.json` from a dataset directory; absent file yields defaults.
    pub fn load(dir: &Path) -> Result<Self> {
        let path = dir.join(MANIFEST_FILE);
        if !path.is_file() {
            return Ok(Self::default());
        }
        let text = fs::read_to_string(&path)?;
        Ok(serde_json::from_str(&text)?)
    }

    pub fn is_cancelled(&self, status: &str) -> bool {
        let status = status.trim();
        self.cancelled_status
            .iter()
            .any(|s| s.eq_ignore_ascii_case(status))
    }
}
