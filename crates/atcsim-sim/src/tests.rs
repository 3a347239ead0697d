//! Tests for the simulation engine, the traffic register and the replay
//! pipeline end to end.

use std::cell::RefCell;
use std::fs;
use std::ops::Range;
use std::path::Path;
use std::rc::Rc;

use atcsim_core::commands::ScenarioCommand;
use atcsim_core::constants::{FPM, FT, KTS};
use atcsim_core::events::{DeleteReason, SimEvent};
use atcsim_core::types::TrackSample;

use crate::config::{FeedConfig, SimConfig};
use crate::engine::SimulationEngine;
use crate::traffic::{LockstepArrays, NewAircraft, Traffic};

fn aircraft(callsign: &str, lat: f64, lon: f64) -> NewAircraft {
    NewAircraft {
        callsign: callsign.into(),
        actype: "B738".into(),
        lat,
        lon,
        hdg: 90.0,
        alt: 10_000.0 * FT,
        cas: 250.0 * KTS,
    }
}

fn create(callsign: &str, lat: f64, lon: f64) -> ScenarioCommand {
    ScenarioCommand::Create {
        callsign: callsign.into(),
        actype: "B738".into(),
        lat,
        lon,
        hdg: 90.0,
        alt: 10_000.0 * FT,
        cas: 250.0 * KTS,
    }
}

fn no_conflicts() -> SimConfig {
    let mut config = SimConfig::default();
    config.conflict.enabled = false;
    config
}

fn sample(callsign: &str, t: f64, lat: f64, lon: f64) -> TrackSample {
    TrackSample {
        timestamp: t,
        callsign: callsign.into(),
        lat,
        lon,
        heading: 45.0,
        altitude: 8_000.0 * FT,
        ground_speed: 220.0 * KTS,
    }
}

fn write_geo_dataset(dir: &Path) {
    fs::write(
        dir.join("flights.csv"),
        "\
flight_id,callsign,actype,origin,destination,status
F1,KLM7,B738,EHAM,EGLL,ACT
",
    )
    .unwrap();
    fs::write(
        dir.join("tracks.csv"),
        "\
flight_id,timestamp,lat,lon,alt_ft,heading_deg,speed_kts
F1,2024-05-01T10:00:00Z,52.00,4.00,10000,90,250
F1,2024-05-01T10:00:05Z,52.00,4.05,10500,95,260
F1,2024-05-01T10:00:10Z,52.01,4.10,11000,100,270
",
    )
    .unwrap();
}

fn replay_command(dir: &Path) -> ScenarioCommand {
    ScenarioCommand::Replay {
        source_type: "geo".into(),
        dataset: dir.to_string_lossy().into_owned(),
        start_time: None,
    }
}

// ---- Entity store ----

#[test]
fn test_arrays_stay_aligned_through_create_and_delete() {
    let mut traffic = Traffic::new();
    traffic
        .create(
            &[
                aircraft("A", 52.0, 4.0),
                aircraft("B", 52.1, 4.0),
                aircraft("C", 52.2, 4.0),
                aircraft("D", 52.3, 4.0),
            ],
            0.0,
        )
        .unwrap();
    let n = traffic.ntraf();
    assert!(traffic.register.column_lengths().iter().all(|&len| len == n));

    // Unsorted with a duplicate and an out-of-range row.
    let removed = traffic.delete(&[0, 2, 0, 99]);
    assert_eq!(removed, vec!["A".to_string(), "C".to_string()]);
    assert_eq!(traffic.ntraf(), 2);
    assert!(traffic.register.column_lengths().iter().all(|&len| len == 2));
    assert!(traffic.is_aligned());

    traffic.create(&[aircraft("E", 52.4, 4.0)], 1.0).unwrap();
    assert!(traffic.register.column_lengths().iter().all(|&len| len == 3));
    assert!(traffic.is_aligned());
}

#[test]
fn test_survivors_keep_state_after_delete() {
    let mut traffic = Traffic::new();
    traffic
        .create(
            &[
                aircraft("A", 52.0, 4.0),
                aircraft("B", 52.1, 4.1),
                aircraft("C", 52.2, 4.2),
            ],
            0.0,
        )
        .unwrap();
    let c_id = traffic.register.id[2];

    traffic.delete(&[0]);

    let b = traffic.id2idx("B").unwrap();
    let c = traffic.id2idx("C").unwrap();
    assert_eq!(traffic.register.lat[b], 52.1);
    assert_eq!(traffic.register.lon[c], 4.2);
    assert_eq!(traffic.row_of(c_id), Some(c));
    assert_eq!(traffic.id2idx("A"), None);
    assert_eq!(traffic.id2idx_batch(&["A", "B", "C"]), vec![None, Some(0), Some(1)]);
}

#[test]
fn test_duplicate_callsign_rejected_without_side_effects() {
    let mut traffic = Traffic::new();
    traffic.create(&[aircraft("A", 52.0, 4.0)], 0.0).unwrap();

    assert!(traffic
        .create(&[aircraft("B", 52.0, 4.0), aircraft("A", 53.0, 5.0)], 0.0)
        .is_err());
    assert!(traffic
        .create(&[aircraft("X", 52.0, 4.0), aircraft("X", 53.0, 5.0)], 0.0)
        .is_err());
    assert_eq!(traffic.ntraf(), 1);
    assert_eq!(traffic.id2idx("B"), None);
    assert!(traffic.is_aligned());
}

/// Records every resize it receives.
struct Recorder {
    rows: Vec<u32>,
    log: Rc<RefCell<Vec<String>>>,
}

impl LockstepArrays for Recorder {
    fn on_create(&mut self, n: usize) -> Range<usize> {
        let start = self.rows.len();
        self.rows.resize(start + n, 0);
        self.log.borrow_mut().push(format!("create {n}"));
        start..self.rows.len()
    }

    fn on_delete(&mut self, rows: &[usize]) {
        for &row in rows {
            self.rows.remove(row);
        }
        self.log.borrow_mut().push(format!("delete {rows:?}"));
    }

    fn len(&self) -> usize {
        self.rows.len()
    }
}

#[test]
fn test_registered_dependent_resizes_in_lockstep() {
    let mut engine = SimulationEngine::new(no_conflicts());
    engine.queue_command(create("A", 52.0, 4.0));
    engine.advance(0.0);

    let log = Rc::new(RefCell::new(Vec::new()));
    engine
        .register_dependent(Box::new(Recorder {
            rows: Vec::new(),
            log: Rc::clone(&log),
        }))
        .unwrap();
    assert_eq!(log.borrow().as_slice(), ["create 1"], "grown to current ntraf");

    engine.queue_commands([create("B", 52.1, 4.0), create("C", 52.2, 4.0)]);
    engine.advance(1.0);
    engine.queue_command(ScenarioCommand::Delete { callsign: "A".into() });
    engine.advance(1.0);

    assert_eq!(
        log.borrow().as_slice(),
        ["create 1", "create 1", "create 1", "delete [0]"]
    );
    assert!(engine.traffic().is_aligned());
}

#[test]
fn test_oversized_dependent_is_rejected() {
    let mut traffic = Traffic::new();
    let result = traffic.register_dependent(Box::new(Recorder {
        rows: vec![0; 3],
        log: Rc::new(RefCell::new(Vec::new())),
    }));
    assert!(result.is_err());
    assert!(traffic.is_aligned());
}

// ---- Scenario commands ----

#[test]
fn test_create_then_delete_kl123() {
    let mut engine = SimulationEngine::new(no_conflicts());
    engine.queue_commands([
        create("AAL1", 51.0, 3.0),
        create("KL123", 52.3, 4.8),
        create("BAW2", 53.0, 6.0),
    ]);
    engine.advance(1.0);

    let row = engine.id2idx("KL123").unwrap();
    let reg = &engine.traffic().register;
    assert!((reg.alt[row] - 10_000.0 * FT).abs() < 1e-9);
    let before = engine.snapshot();
    let ntraf = engine.ntraf();

    engine.queue_line("DEL KL123").unwrap();
    engine.advance(0.0);

    assert_eq!(engine.id2idx("KL123"), None);
    assert_eq!(engine.ntraf(), ntraf - 1);
    let after = engine.snapshot();
    for callsign in ["AAL1", "BAW2"] {
        assert_eq!(
            serde_json::to_string(before.find(callsign).unwrap()).unwrap(),
            serde_json::to_string(after.find(callsign).unwrap()).unwrap(),
            "{callsign} changed"
        );
    }
    assert!(engine.take_events().contains(&SimEvent::AircraftDeleted {
        callsign: "KL123".into(),
        reason: DeleteReason::Command,
    }));
}

#[test]
fn test_unknown_callsign_command_reports_failure() {
    let mut engine = SimulationEngine::new(no_conflicts());
    engine.queue_command(ScenarioCommand::Heading {
        callsign: "NOBODY".into(),
        hdg: 90.0,
    });
    engine.advance(1.0);

    let events = engine.take_events();
    assert_eq!(events.len(), 1);
    assert!(matches!(events[0], SimEvent::CommandFailed { .. }));
    assert_eq!(engine.time().tick, 1, "failure does not abort the tick");
}

#[test]
fn test_oversized_random_batch_fails_without_killing_the_tick() {
    let mut engine = SimulationEngine::new(no_conflicts());
    assert!(engine.queue_line("MCRE 4000000000").is_err());

    engine.queue_command(ScenarioCommand::CreateRandom { count: u32::MAX });
    engine.queue_command(create("A", 52.0, 4.0));
    engine.advance(1.0);

    assert_eq!(engine.ntraf(), 1);
    let events = engine.take_events();
    assert!(matches!(events[0], SimEvent::CommandFailed { .. }));
    assert_eq!(engine.time().tick, 1);
}

#[test]
fn test_scenario_file_drives_targets() {
    let mut engine = SimulationEngine::new(no_conflicts());
    let count = engine
        .load_scenario(
            "\
# departure
00:00:00.00>CRE KL123 B738 52.3 4.8 90 FL100 250
00:00:00.00>ALT KL123 FL120
00:00:05.00>HDG KL123 180
",
        )
        .unwrap();
    assert_eq!(count, 3);

    engine.advance(0.0);
    let row = engine.id2idx("KL123").unwrap();
    assert!((engine.traffic().register.sel_alt[row] - 12_000.0 * FT).abs() < 1e-6);
    assert_eq!(engine.traffic().register.sel_hdg[row], 90.0);

    for _ in 0..5 {
        engine.advance(1.0);
    }
    let reg = &engine.traffic().register;
    assert_eq!(reg.sel_hdg[row], 180.0);
    assert!(reg.manual[row]);
    assert!(reg.alt[row] > 10_000.0 * FT, "climbing");
    assert!(engine.timeline().is_empty());
}

#[test]
fn test_vertical_speed_opens_climb() {
    let mut engine = SimulationEngine::new(no_conflicts());
    engine.queue_command(create("A", 52.0, 4.0));
    engine.queue_line("VS A 1500").unwrap();
    engine.advance(1.0);

    let reg = &engine.traffic().register;
    assert!((reg.sel_vs[0] - 1500.0 * FPM).abs() < 1e-9);
    assert!(reg.sel_alt[0] > reg.alt[0]);
    assert!(reg.vs[0] > 0.0);
}

#[test]
fn test_determinism_same_seed() {
    let config = SimConfig {
        seed: 12345,
        ..Default::default()
    };
    let mut engine_a = SimulationEngine::new(config.clone());
    let mut engine_b = SimulationEngine::new(config);

    engine_a.queue_line("MCRE 20").unwrap();
    engine_b.queue_line("MCRE 20").unwrap();

    for _ in 0..120 {
        engine_a.advance(1.0);
        engine_b.advance(1.0);
        let json_a = serde_json::to_string(&engine_a.snapshot()).unwrap();
        let json_b = serde_json::to_string(&engine_b.snapshot()).unwrap();
        assert_eq!(json_a, json_b, "Snapshots diverged with same seed");
    }
    assert_eq!(engine_a.ntraf(), 20);
}

#[test]
fn test_determinism_different_seeds() {
    let mut engine_a = SimulationEngine::new(SimConfig {
        seed: 111,
        ..Default::default()
    });
    let mut engine_b = SimulationEngine::new(SimConfig {
        seed: 222,
        ..Default::default()
    });
    engine_a.queue_line("MCRE 5").unwrap();
    engine_b.queue_line("MCRE 5").unwrap();
    engine_a.advance(1.0);
    engine_b.advance(1.0);

    let json_a = serde_json::to_string(&engine_a.snapshot().aircraft).unwrap();
    let json_b = serde_json::to_string(&engine_b.snapshot().aircraft).unwrap();
    assert_ne!(json_a, json_b);
}

#[test]
fn test_invalid_time_step_is_ignored() {
    let mut engine = SimulationEngine::new(no_conflicts());
    engine.queue_command(create("A", 52.0, 4.0));
    engine.advance(f64::NAN);
    engine.advance(-1.0);
    assert_eq!(engine.time().tick, 0);
    assert_eq!(engine.ntraf(), 0, "commands wait for a valid tick");
}

// ---- Conflict interface ----

#[test]
fn test_conflict_state_persists_between_runs() {
    let mut config = SimConfig::default();
    config.conflict.interval_secs = 5.0;
    let mut engine = SimulationEngine::new(config);
    engine.queue_commands([
        ScenarioCommand::Create {
            callsign: "EAST".into(),
            actype: "A320".into(),
            lat: 52.0,
            lon: 4.0,
            hdg: 90.0,
            alt: 10_000.0 * FT,
            cas: 250.0 * KTS,
        },
        ScenarioCommand::Create {
            callsign: "WEST".into(),
            actype: "A320".into(),
            lat: 52.0,
            lon: 4.5,
            hdg: 270.0,
            alt: 10_000.0 * FT,
            cas: 250.0 * KTS,
        },
    ]);
    engine.advance(1.0);

    let first = engine.snapshot().conflicts;
    assert_eq!(first.unique_conflicts, 1);
    assert_eq!(first.last_detection_secs, Some(1.0));

    engine.advance(1.0);
    let second = engine.snapshot().conflicts;
    assert_eq!(second.last_detection_secs, Some(1.0), "not due yet");
    assert_eq!(second.conflict_pairs, first.conflict_pairs);
    assert!(engine.snapshot().find("EAST").unwrap().in_conflict);
}

// ---- Data feed ----

#[test]
fn test_live_sample_creates_and_drives_aircraft() {
    let mut engine = SimulationEngine::new(no_conflicts());
    engine.stage_batch(vec![
        sample("LIVE1", 0.0, 52.0, 4.0),
        sample("LIVE1", 0.0, 52.5, 4.5),
    ]);
    assert_eq!(engine.ntraf(), 1, "created before reconciliation");
    assert!(engine.feed().is_fed("LIVE1"));

    engine.advance(1.0);
    let snap = engine.snapshot();
    let view = snap.find("LIVE1").unwrap();
    assert_eq!(view.lat, 52.5, "last sample wins");
    assert!((view.lon - 4.5).abs() < 1e-9);
    assert_eq!(view.trk, 45.0);
    assert!((view.gs - 220.0 * KTS).abs() < 1e-9);
    assert!(view.fed);
    assert_eq!(snap.feed_roster, vec!["LIVE1".to_string()]);
}

#[test]
fn test_sample_for_unknown_callsign_is_skipped_without_auto_create() {
    let config = SimConfig {
        feed: FeedConfig {
            auto_create: false,
            coast_timeout_secs: None,
        },
        ..no_conflicts()
    };
    let mut engine = SimulationEngine::new(config);
    engine.queue_commands([
        create("KL1", 52.0, 4.0),
        ScenarioCommand::AddReplay {
            callsign: "KL1".into(),
        },
    ]);
    engine.advance(1.0);
    engine.take_events();

    engine.stage_batch(vec![sample("GHOST", 1.0, 50.0, 3.0)]);
    engine.advance(1.0);

    assert_eq!(engine.ntraf(), 1);
    assert!(engine.take_events().contains(&SimEvent::ReconcileSkipped {
        callsign: "GHOST".into(),
        reason: "sample for unknown callsign".into(),
    }));
}

#[test]
fn test_coasting_aircraft_state_is_constant() {
    let mut engine = SimulationEngine::new(no_conflicts());
    engine.stage_batch(vec![sample("LIVE1", 0.0, 52.0, 4.0)]);
    engine.advance(1.0);
    let reference = serde_json::to_string(&engine.snapshot().aircraft).unwrap();

    for _ in 0..5 {
        engine.advance(1.0);
        let coasted = serde_json::to_string(&engine.snapshot().aircraft).unwrap();
        assert_eq!(coasted, reference);
    }
}

#[test]
fn test_release_is_idempotent_and_resumes_simulation() {
    let mut engine = SimulationEngine::new(no_conflicts());
    engine.stage_batch(vec![sample("LIVE1", 0.0, 52.0, 4.0)]);
    engine.advance(1.0);
    engine.take_events();

    engine.queue_line("UCO LIVE1").unwrap();
    engine.queue_line("UCO LIVE1").unwrap();
    engine.advance(1.0);

    let events = engine.take_events();
    assert_eq!(
        events,
        vec![SimEvent::RosterChanged {
            callsign: "LIVE1".into(),
            fed: false,
        }]
    );
    assert!(!engine.feed().is_fed("LIVE1"));

    let lat = engine.snapshot().find("LIVE1").unwrap().lat;
    engine.advance(10.0);
    let view = engine.snapshot();
    let view = view.find("LIVE1").unwrap();
    assert!(view.lat > lat, "flying north-east again");
    assert!(view.dist_flown > 0.0);
}

#[test]
fn test_coast_timeout_deletes_aircraft() {
    let config = SimConfig {
        feed: FeedConfig {
            auto_create: true,
            coast_timeout_secs: Some(3.0),
        },
        ..no_conflicts()
    };
    let mut engine = SimulationEngine::new(config);
    engine.stage_batch(vec![sample("LIVE1", 0.0, 52.0, 4.0)]);

    for _ in 0..10 {
        engine.advance(1.0);
    }
    assert_eq!(engine.ntraf(), 0);
    assert!(engine.feed().roster().is_empty());
    assert!(engine.take_events().contains(&SimEvent::AircraftDeleted {
        callsign: "LIVE1".into(),
        reason: DeleteReason::CoastTimeout,
    }));
}

// ---- Replay ----

#[test]
fn test_replay_reproduces_track_points() {
    let tmp = tempfile::tempdir().unwrap();
    write_geo_dataset(tmp.path());

    let mut engine = SimulationEngine::new(no_conflicts());
    engine.queue_command(replay_command(tmp.path()));
    engine.advance(0.0);
    assert!(engine.replay_active());

    let expected = [
        (0.0, 52.00, 4.00, 10_000.0, 90.0, 250.0),
        (5.0, 52.00, 4.05, 10_500.0, 95.0, 260.0),
        (10.0, 52.01, 4.10, 11_000.0, 100.0, 270.0),
    ];
    let mut snapshots = vec![engine.snapshot()];
    for _ in 0..10 {
        engine.advance(1.0);
        snapshots.push(engine.snapshot());
    }

    for (t, lat, lon, alt_ft, hdg, kts) in expected {
        let snap = &snapshots[t as usize];
        assert_eq!(snap.time.elapsed_secs, t);
        let view = snap.find("KLM7").unwrap();
        assert!((view.lat - lat).abs() < 1e-9, "lat at t={t}");
        assert!((view.lon - lon).abs() < 1e-9, "lon at t={t}");
        assert!((view.alt - alt_ft * FT).abs() < 1e-6, "alt at t={t}");
        assert!((view.trk - hdg).abs() < 1e-9, "track at t={t}");
        assert!((view.gs - kts * KTS).abs() < 1e-6, "speed at t={t}");
        assert!(view.fed);
        assert_eq!(view.origin, "EHAM");
        assert_eq!(view.destination, "EGLL");
    }

    // Coasts between reports.
    for t in [1, 2, 3, 4] {
        let coasted = snapshots[t].find("KLM7").unwrap();
        assert_eq!(coasted.lat, snapshots[0].find("KLM7").unwrap().lat);
        assert_eq!(coasted.lon, snapshots[0].find("KLM7").unwrap().lon);
    }
    let climbing = snapshots[10].find("KLM7").unwrap();
    assert!((climbing.vs - 500.0 * FT / 5.0).abs() < 1e-6);
    assert!(!engine.replay_active(), "all buckets read");

    // Scripted deletion after the last report.
    for _ in 0..10 {
        engine.advance(1.0);
    }
    assert_eq!(engine.id2idx("KLM7"), None);
    assert!(engine.feed().roster().is_empty());
}

fn lon_at_each_second(engine: &mut SimulationEngine, ticks: usize) -> Vec<Option<f64>> {
    (0..ticks)
        .map(|_| {
            engine.advance(1.0);
            engine.snapshot().find("KLM7").map(|view| view.lon)
        })
        .collect()
}

#[test]
fn test_replay_queued_before_first_tick_plays_on_time() {
    let tmp = tempfile::tempdir().unwrap();
    write_geo_dataset(tmp.path());

    let mut engine = SimulationEngine::new(no_conflicts());
    engine.queue_command(replay_command(tmp.path()));
    let lons = lon_at_each_second(&mut engine, 10);

    // lons[i] is the state at t = i + 1.
    for (i, lon) in lons.iter().enumerate() {
        let t = i + 1;
        let expected = match t {
            0..=4 => 4.00,
            5..=9 => 4.05,
            _ => 4.10,
        };
        let lon = lon.unwrap_or_else(|| panic!("KLM7 missing at t={t}"));
        assert!((lon - expected).abs() < 1e-9, "lon at t={t}: {lon}");
    }
}

#[test]
fn test_scenario_file_replay_plays_from_its_timestamp() {
    let tmp = tempfile::tempdir().unwrap();
    write_geo_dataset(tmp.path());

    let mut engine = SimulationEngine::new(no_conflicts());
    let scenario = format!("00:00:00.00>REPLAY geo {}\n", tmp.path().display());
    engine.load_scenario(&scenario).unwrap();
    let lons = lon_at_each_second(&mut engine, 10);

    assert!((lons[4].unwrap() - 4.05).abs() < 1e-9, "t=5");
    assert!((lons[9].unwrap() - 4.10).abs() < 1e-9, "t=10");
}

#[test]
fn test_scenario_replay_scheduled_mid_tick_anchors_at_its_time() {
    let tmp = tempfile::tempdir().unwrap();
    write_geo_dataset(tmp.path());

    let mut engine = SimulationEngine::new(no_conflicts());
    let scenario = format!("00:00:02.00>REPLAY geo {}\n", tmp.path().display());
    engine.load_scenario(&scenario).unwrap();
    for _ in 0..2 {
        engine.advance(1.0);
    }
    assert_eq!(engine.id2idx("KLM7"), Some(0));

    let lons = lon_at_each_second(&mut engine, 8);
    // t = 7 is the dataset's t = 5.
    assert!((lons[3].unwrap() - 4.00).abs() < 1e-9, "t=6");
    assert!((lons[4].unwrap() - 4.05).abs() < 1e-9, "t=7");
    assert!((lons[7].unwrap() - 4.05).abs() < 1e-9, "t=10 still holds the t=5 report");
}

#[test]
fn test_released_replay_aircraft_survives_scripted_delete() {
    let tmp = tempfile::tempdir().unwrap();
    write_geo_dataset(tmp.path());

    let mut engine = SimulationEngine::new(no_conflicts());
    engine.queue_command(replay_command(tmp.path()));
    engine.advance(0.0);
    engine.queue_line("UCO KLM7").unwrap();
    for _ in 0..30 {
        engine.advance(1.0);
    }
    assert!(engine.id2idx("KLM7").is_some());
    assert!(!engine.feed().is_fed("KLM7"));
}

#[test]
fn test_failed_replay_leaves_engine_untouched() {
    let mut engine = SimulationEngine::new(no_conflicts());
    engine.queue_command(create("A", 52.0, 4.0));
    engine.advance(1.0);
    let before = serde_json::to_string(&engine.snapshot().aircraft).unwrap();
    engine.take_events();

    engine.queue_command(ScenarioCommand::Replay {
        source_type: "geo".into(),
        dataset: "/nonexistent/replay/dataset".into(),
        start_time: None,
    });
    engine.advance(0.0);

    assert!(!engine.replay_active());
    assert!(engine.timeline().is_empty());
    assert_eq!(serde_json::to_string(&engine.snapshot().aircraft).unwrap(), before);
    let events = engine.take_events();
    assert!(matches!(events.as_slice(), [SimEvent::CommandFailed { .. }]));
}

#[test]
fn test_replay_uses_cache_on_second_load() {
    let data = tempfile::tempdir().unwrap();
    let cache = tempfile::tempdir().unwrap();
    write_geo_dataset(data.path());

    let mut config = no_conflicts();
    config.replay.cache_dir = Some(cache.path().to_path_buf());

    let mut first = SimulationEngine::new(config.clone());
    first.queue_command(replay_command(data.path()));
    first.advance(0.0);
    let mut second = SimulationEngine::new(config);
    second.queue_command(replay_command(data.path()));
    second.advance(0.0);

    let loaded = |events: Vec<SimEvent>| {
        events.into_iter().find_map(|e| match e {
            SimEvent::ReplayLoaded { from_cache, .. } => Some(from_cache),
            _ => None,
        })
    };
    assert_eq!(loaded(first.take_events()), Some(false));
    assert_eq!(loaded(second.take_events()), Some(true));
    let (a, b) = (first.snapshot(), second.snapshot());
    let (a, b) = (a.find("KLM7").unwrap(), b.find("KLM7").unwrap());
    assert!((a.lat - b.lat).abs() < 1e-9);
    assert!((a.lon - b.lon).abs() < 1e-9);
    assert!((a.alt - b.alt).abs() < 1e-6);
}
