//! Raw export ingestion: filter flights, join metadata to track rows,
//! convert provider encodings and anchor time at the earliest sample.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use chrono::{DateTime, NaiveTime, Timelike};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use atcsim_core::commands::TimedCommand;
use atcsim_core::constants::{DEFAULT_RESAMPLE_SECS, FT, KTS, NM, TIME_EPSILON};
use atcsim_core::geo::{destination_point, normalize_heading, wrap_lon};

use crate::error::{ReplayError, Result};
use crate::manifest::{DatasetManifest, MANIFEST_FILE};
use crate::raw::{read_rows, FlightRecord, GeoTrackRecord, PolarTrackRecord, FLIGHTS_FILE, TRACKS_FILE};
use crate::source::{ReplayRequest, SourceType};
use crate::table::{TrackRow, TrackTable};
use crate::timeline::{build_timeline, FlightInfo};

/// Seconds in one day, for time-of-day rollover.
const DAY_SECS: f64 = 86_400.0;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct IngestOptions {
    /// Fixed cadence of the output table; `None` keeps raw sample times.
    pub resample_secs: Option<f64>,
}

/// What was discarded during ingestion.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DropStats {
    pub cancelled: usize,
    pub incomplete: usize,
    pub orphan_rows: usize,
    pub before_start: usize,
}

/// A normalized replay dataset: track table plus command timeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReplayDataset {
    pub source_type: SourceType,
    pub dataset: PathBuf,
    pub start_time: f64,
    /// Source time of the earliest observed sample (s).
    pub anchor: f64,
    pub flights: Vec<FlightInfo>,
    pub table: TrackTable,
    pub timeline: Vec<TimedCommand>,
    pub dropped: DropStats,
}

/// One converted track point before time anchoring.
#[derive(Debug, Clone)]
struct RawPoint {
    flight_id: String,
    time: f64,
    lat: f64,
    lon: f64,
    alt: f64,
    heading: f64,
    speed: f64,
}

/// Ingest a dataset directory. Fails without side effects on any malformed input.
pub fn ingest(request: &ReplayRequest, options: &IngestOptions) -> Result<ReplayDataset> {
    let dir = request.dataset.as_path();
    if !dir.exists() {
        return Err(ReplayError::DatasetNotFound(dir.to_path_buf()));
    }
    if !dir.is_dir() {
        return Err(ReplayError::NotADirectory(dir.to_path_buf()));
    }

    let manifest = DatasetManifest::load(dir)?;
    let mut dropped = DropStats::default();

    let records: Vec<FlightRecord> = read_rows(dir, FLIGHTS_FILE)?;
    let mut flights: Vec<FlightInfo> = Vec::new();
    for rec in records {
        if manifest.is_cancelled(&rec.status) {
            dropped.cancelled += 1;
        } else if rec.callsign.trim().is_empty() {
            dropped.incomplete += 1;
        } else {
            flights.push(FlightInfo {
                flight_id: rec.flight_id,
                callsign: rec.callsign.trim().to_uppercase(),
                actype: rec.actype.trim().to_uppercase(),
                origin: rec.origin.trim().to_uppercase(),
                destination: rec.destination.trim().to_uppercase(),
            });
        }
    }

    let points = match request.source_type {
        SourceType::Polar => read_polar(dir, &manifest)?,
        SourceType::Geo => read_geo(dir, &manifest)?,
    };

    // Join: group points under kept flights, drop rows of unknown/dropped flights.
    let by_id: HashMap<&str, usize> = flights
        .iter()
        .enumerate()
        .map(|(i, f)| (f.flight_id.as_str(), i))
        .collect();
    let mut per_flight: Vec<Vec<RawPoint>> = vec![Vec::new(); flights.len()];
    for point in points {
        match by_id.get(point.flight_id.as_str()) {
            Some(&i) => per_flight[i].push(point),
            None => dropped.orphan_rows += 1,
        }
    }

    let mut kept = Vec::new();
    let mut kept_points = Vec::new();
    for (flight, points) in flights.into_iter().zip(per_flight) {
        if points.is_empty() {
            dropped.incomplete += 1;
        } else {
            kept_points.push(points);
            kept.push(flight);
        }
    }

    distinct_callsigns(&mut kept, &kept_points);

    let anchor = kept_points
        .iter()
        .flatten()
        .map(|p| p.time)
        .min_by(|a, b| a.total_cmp(b))
        .ok_or_else(|| ReplayError::EmptyDataset(dir.to_path_buf()))?;

    let mut rows = Vec::new();
    for (flight, points) in kept.iter().zip(&kept_points) {
        for p in points {
            let sim_time = p.time - anchor - request.start_time;
            if sim_time < -TIME_EPSILON {
                dropped.before_start += 1;
                continue;
            }
            rows.push(TrackRow {
                sim_time: sim_time.max(0.0),
                callsign: flight.callsign.clone(),
                lat: p.lat,
                lon: p.lon,
                alt: p.alt,
                heading: p.heading,
                speed: p.speed,
            });
        }
    }

    let mut table = TrackTable::from_rows(rows);
    if let Some(cadence) = options.resample_secs {
        table = table.resampled(cadence)?;
    }
    if table.is_empty() {
        return Err(ReplayError::EmptyDataset(dir.to_path_buf()));
    }

    let delete_delay = options.resample_secs.unwrap_or(DEFAULT_RESAMPLE_SECS);
    let timeline = build_timeline(&table, &kept, delete_delay);
    kept.retain(|f| table.span_of(&f.callsign).is_some());

    debug!(?dropped, "replay filter statistics");
    info!(
        dataset = %dir.display(),
        source = %request.source_type,
        flights = kept.len(),
        rows = table.len(),
        "ingested replay dataset"
    );

    Ok(ReplayDataset {
        source_type: request.source_type,
        dataset: dir.to_path_buf(),
        start_time: request.start_time,
        anchor,
        flights: kept,
        table,
        timeline,
        dropped,
    })
}

/// Give every kept flight its own callsign. When several flights share one,
/// the earliest keeps it and later ones get `-2`, `-3`, ... in order of
/// their first plot.
fn distinct_callsigns(flights: &mut [FlightInfo], points: &[Vec<RawPoint>]) {
    let first_time = |i: usize| {
        points[i]
            .iter()
            .map(|p| p.time)
            .min_by(|a, b| a.total_cmp(b))
            .unwrap_or(f64::INFINITY)
    };
    let mut order: Vec<usize> = (0..flights.len()).collect();
    order.sort_by(|&a, &b| first_time(a).total_cmp(&first_time(b)).then(a.cmp(&b)));

    let mut taken: HashSet<String> = HashSet::new();
    let mut repeats: HashMap<String, u32> = HashMap::new();
    for &i in &order {
        if !taken.contains(&flights[i].callsign) {
            taken.insert(flights[i].callsign.clone());
            continue;
        }
        let base = flights[i].callsign.clone();
        let n = repeats.entry(base.clone()).or_insert(1);
        let renamed = loop {
            *n += 1;
            let candidate = format!("{base}-{n}");
            if !flights.iter().any(|f| f.callsign == candidate) && !taken.contains(&candidate) {
                break candidate;
            }
        };
        warn!(
            callsign = %base,
            flight_id = %flights[i].flight_id,
            renamed = %renamed,
            "callsign already used by an earlier flight"
        );
        taken.insert(renamed.clone());
        flights[i].callsign = renamed;
    }
}

fn read_polar(dir: &Path, manifest: &DatasetManifest) -> Result<Vec<RawPoint>> {
    let reference = manifest
        .reference
        .ok_or_else(|| ReplayError::MissingReference(dir.join(MANIFEST_FILE)))?;
    let records: Vec<PolarTrackRecord> = read_rows(dir, TRACKS_FILE)?;
    let file = dir.join(TRACKS_FILE);

    // Times of day are unwrapped past midnight. A flight's first plot is
    // placed against the dataset's first plot; later plots against the
    // flight's previous one, so long tracks stay monotonic.
    let mut dataset_start: Option<f64> = None;
    let mut last_seen: HashMap<String, (f64, f64)> = HashMap::new();
    let mut points = Vec::with_capacity(records.len());

    for rec in records {
        let time_of_day = parse_time_of_day(&rec.time).ok_or_else(|| ReplayError::BadTime {
            file: file.clone(),
            value: rec.time.clone(),
        })?;
        let start = *dataset_start.get_or_insert(time_of_day);
        let (prev, mut day_offset) = last_seen
            .get(&rec.flight_id)
            .copied()
            .unwrap_or((start, 0.0));
        if time_of_day + DAY_SECS / 2.0 < prev {
            day_offset += DAY_SECS;
        }
        last_seen.insert(rec.flight_id.clone(), (time_of_day, day_offset));

        let bearing = rec.bearing_deg + manifest.magnetic_variation_deg;
        let (lat, lon) = destination_point(reference.lat, reference.lon, bearing, rec.range_nm * NM);
        points.push(RawPoint {
            flight_id: rec.flight_id,
            time: time_of_day + day_offset,
            lat,
            lon,
            alt: rec.flight_level * 100.0 * FT,
            heading: normalize_heading(rec.heading_deg + manifest.magnetic_variation_deg),
            speed: rec.speed_kts * KTS,
        });
    }
    Ok(points)
}

fn read_geo(dir: &Path, manifest: &DatasetManifest) -> Result<Vec<RawPoint>> {
    let records: Vec<GeoTrackRecord> = read_rows(dir, TRACKS_FILE)?;
    let file = dir.join(TRACKS_FILE);

    records
        .into_iter()
        .map(|rec| -> Result<RawPoint> {
            let stamp = DateTime::parse_from_rfc3339(&rec.timestamp).map_err(|_| ReplayError::BadTime {
                file: file.clone(),
                value: rec.timestamp.clone(),
            })?;
            Ok(RawPoint {
                flight_id: rec.flight_id,
                time: stamp.timestamp() as f64 + stamp.timestamp_subsec_nanos() as f64 * 1e-9,
                lat: rec.lat,
                lon: wrap_lon(rec.lon),
                alt: rec.alt_ft * FT,
                heading: normalize_heading(rec.heading_deg + manifest.magnetic_variation_deg),
                speed: rec.speed_kts * KTS,
            })
        })
        .collect()
}

/// Seconds since midnight of `HH:MM:SS[.fff]`.
fn parse_time_of_day(s: &str) -> Option<f64> {
    let t = NaiveTime::parse_from_str(s.trim(), "%H:%M:%S%.f").ok()?;
    Some(t.num_seconds_from_midnight() as f64 + t.nanosecond() as f64 * 1e-9)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_time_of_day() {
        assert_eq!(parse_time_of_day("00:00:05"), Some(5.0));
        let t = parse_time_of_day("12:30:00.500").unwrap();
        assert!((t - 45_000.5).abs() < 1e-9);
        assert_eq!(parse_time_of_day("25:00:00"), None);
    }
}
