//! Raw export rows, as they appear in the provider CSV files.
//!
//! Every source has a `flights.csv` with flight metadata; the track file
//! layout depends on the source type.

use std::path::Path;

use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::error::{ReplayError, Result};

pub const FLIGHTS_FILE: &str = "flights.csv";
pub const TRACKS_FILE: &str = "tracks.csv";

/// Flight plan metadata row.
#[derive(Debug, Clone, Deserialize)]
pub struct FlightRecord {
    pub flight_id: String,
    #[serde(default)]
    pub callsign: String,
    #[serde(default)]
    pub actype: String,
    #[serde(default)]
    pub origin: String,
    #[serde(default)]
    pub destination: String,
    #[serde(default)]
    pub status: String,
}

/// Polar radar plot: position relative to the reference point.
#[derive(Debug, Clone, Deserialize)]
pub struct PolarTrackRecord {
    pub flight_id: String,
    /// Local time of day, `HH:MM:SS[.fff]`.
    pub time: String,
    pub range_nm: f64,
    pub bearing_deg: f64,
    pub flight_level: f64,
    pub heading_deg: f64,
    pub speed_kts: f64,
}

/// Geographic plot.
#[derive(Debug, Clone, Deserialize)]
pub struct GeoTrackRecord {
    pub flight_id: String,
    /// RFC 3339 timestamp.
    pub timestamp: String,
    pub lat: f64,
    pub lon: f64,
    pub alt_ft: f64,
    pub heading_deg: f64,
    pub speed_kts: f64,
}

/// Read every row of a required CSV file in a dataset directory.
pub fn read_rows<T: DeserializeOwned>(dir: &Path, name: &str) -> Result<Vec<T>> {
    let path = dir.join(name);
    if !path.is_file() {
        return Err(ReplayError::MissingFile(path));
    }

    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(&path)
        .map_err(|source| ReplayError::Csv {
            file: path.clone(),
            source,
        })?;

    reader
        .deserialize()
        .collect::<std::result::Result<Vec<T>, _>>()
        .map_err(|source| ReplayError::Csv { file: path, source })
}
