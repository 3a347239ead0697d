//! Replay source types and load requests.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ReplayError;

/// Raw export formats understood by the ingester.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceType {
    /// Radar export: range/bearing about a reference point, flight levels,
    /// time of day.
    Polar,
    /// Positional export: lat/lon, feet, RFC 3339 timestamps.
    Geo,
}

impl SourceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Polar => "polar",
            Self::Geo => "geo",
        }
    }
}

impl fmt::Display for SourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SourceType {
    type Err = ReplayError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "polar" => Ok(Self::Polar),
            "geo" => Ok(Self::Geo),
            _ => Err(ReplayError::UnknownSourceType(s.to_string())),
        }
    }
}

/// What to load: a dataset directory of one source type, sliced from
/// `start_time` seconds after its earliest sample.
#[derive(Debug, Clone, PartialEq)]
pub struct ReplayRequest {
    pub source_type: SourceType,
    pub dataset: PathBuf,
    pub start_time: f64,
}

impl ReplayRequest {
    pub fn new(source_type: SourceType, dataset: impl Into<PathBuf>) -> Self {
        Self {
            source_type,
            dataset: dataset.into(),
            start_time: 0.0,
        }
    }

    pub fn with_start_time(mut self, start_time: f64) -> Self {
        self.start_time = start_time.max(0.0);
        self
    }
}
