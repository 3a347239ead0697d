//! Simulation engine: the tick driver.
//!
//! `SimulationEngine` owns the traffic register and all sim state, processes
//! scenario commands, runs the systems in a fixed order and produces
//! `TrafficSnapshot`s. Headless and single-threaded; the same seed and inputs
//! give the same run.

use std::collections::{HashMap, VecDeque};

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::{debug, info, warn};

use atcsim_core::aero::cas_to_tas;
use atcsim_core::commands::{self, ScenarioCommand};
use atcsim_core::constants::{FT, MAX_RANDOM_AIRCRAFT};
use atcsim_core::error::CommandError;
use atcsim_core::events::{DeleteReason, SimEvent};
use atcsim_core::geo::{normalize_heading, wrap_lon};
use atcsim_core::state::TrafficSnapshot;
use atcsim_core::types::{AircraftId, SimTime, TrackSample};
use atcsim_replay::{IngestOptions, ReplayCache, ReplayCursor, ReplayRequest, SourceType};

use crate::config::SimConfig;
use crate::error::{Result, TrafficError};
use crate::scenario::ScenarioTimeline;
use crate::spawn;
use crate::systems;
use crate::systems::conflict::{
    ConflictDetector, ConflictResolver, ConflictSchedule, NoResolution, StateBasedDetector,
};
use crate::systems::datafeed::{DataFeedReconciler, ReconcileReport};
use crate::systems::wind::WindField;
use crate::traffic::{LockstepArrays, NewAircraft, Traffic};

/// Aircraft type given to rows created from live feed samples.
const FEED_ACTYPE: &str = "UNKN";

/// Selected altitude for an open-ended climb (`VS` above current altitude).
const OPEN_CLIMB_ALT: f64 = 60_000.0 * FT;

/// A loaded replay being played back.
struct ActiveReplay {
    dataset: String,
    cursor: ReplayCursor,
}

/// The simulation engine. Owns the register and all sim state.
pub struct SimulationEngine {
    config: SimConfig,
    traffic: Traffic,
    time: SimTime,
    wind: WindField,
    feed: DataFeedReconciler,
    detector: Box<dyn ConflictDetector>,
    resolver: Box<dyn ConflictResolver>,
    schedule: ConflictSchedule,
    timeline: ScenarioTimeline,
    replay: Option<ActiveReplay>,
    rng: ChaCha8Rng,
    random_serial: u32,
    command_queue: VecDeque<ScenarioCommand>,
    pending_deletes: Vec<(AircraftId, DeleteReason)>,
    events: Vec<SimEvent>,
}

impl SimulationEngine {
    /// Create an engine with the state-based detector and no resolution.
    pub fn new(config: SimConfig) -> Self {
        Self {
            traffic: Traffic::new(),
            time: SimTime::default(),
            wind: config.wind.clone(),
            feed: DataFeedReconciler::new(config.feed.clone()),
            detector: Box::new(StateBasedDetector::from_config(&config.conflict)),
            resolver: Box::new(NoResolution),
            schedule: ConflictSchedule::new(config.conflict.interval_secs),
            timeline: ScenarioTimeline::new(),
            replay: None,
            rng: ChaCha8Rng::seed_from_u64(config.seed),
            random_serial: 0,
            command_queue: VecDeque::new(),
            pending_deletes: Vec::new(),
            events: Vec::new(),
            config,
        }
    }

    /// Replace the conflict detection and resolution implementations.
    pub fn with_conflict(
        mut self,
        detector: Box<dyn ConflictDetector>,
        resolver: Box<dyn ConflictResolver>,
    ) -> Self {
        self.detector = detector;
        self.resolver = resolver;
        self
    }

    /// Queue a command for processing at the next tick boundary.
    pub fn queue_command(&mut self, command: ScenarioCommand) {
        self.command_queue.push_back(command);
    }

    /// Queue multiple commands.
    pub fn queue_commands(&mut self, commands: impl IntoIterator<Item = ScenarioCommand>) {
        self.command_queue.extend(commands);
    }

    /// Parse one text command line and queue it.
    pub fn queue_line(&mut self, line: &str) -> std::result::Result<(), CommandError> {
        let command = commands::parse_line(line)?;
        self.queue_command(command);
        Ok(())
    }

    /// Parse a scenario file and merge it into the timeline, with its times
    /// relative to the current sim time. Returns the number of commands.
    pub fn load_scenario(&mut self, text: &str) -> std::result::Result<usize, CommandError> {
        let timed = commands::parse_scenario(text)?;
        let count = timed.len();
        self.timeline.merge(timed, self.time.elapsed_secs);
        info!(commands = count, "scenario loaded");
        Ok(count)
    }

    /// Stage a batch of live track samples for the next tick.
    ///
    /// With `feed.auto_create`, callsigns not yet in the register are created
    /// from their last sample and put on the feed roster first.
    pub fn stage_batch(&mut self, samples: Vec<TrackSample>) {
        if self.config.feed.auto_create {
            self.create_from_samples(&samples);
        }
        self.feed.stage_batch(samples);
    }

    /// Advance the simulation by `dt` seconds.
    pub fn advance(&mut self, dt: f64) {
        if !dt.is_finite() || dt < 0.0 {
            warn!(dt, "ignoring tick with invalid time step");
            return;
        }
        let now = self.time.elapsed_secs + dt;

        // 1. Commands due by the end of this tick
        self.process_commands(now);
        // 2. Replay buckets due by the end of this tick
        self.pull_replay(now);
        // 3. Resize
        self.apply_pending_deletes();

        if self.traffic.ntraf() == 0 {
            self.feed.discard_staged();
            self.time.advance(dt);
            return;
        }

        // 4. Kinematics
        systems::kinematics::run(
            &mut self.traffic.register,
            &self.traffic.conflict,
            &self.wind,
            dt,
        );
        // 5. Conflict detection and resolution, throttled
        if self.config.conflict.enabled && self.schedule.is_due(now) {
            systems::conflict::run(
                &mut self.traffic,
                self.detector.as_mut(),
                self.resolver.as_mut(),
                now,
            );
            self.schedule.mark_run(now);
        }
        // 6. Feed reconciliation
        let report = self.feed.run(&mut self.traffic, &self.wind, now);
        self.handle_report(report);

        self.time.advance(dt);
    }

    /// Read-only view of the state between ticks.
    pub fn snapshot(&self) -> TrafficSnapshot {
        systems::snapshot::build_snapshot(&self.traffic, &self.time, self.feed.roster(), &self.wind)
    }

    /// Drain events emitted since the last call.
    pub fn take_events(&mut self) -> Vec<SimEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn time(&self) -> SimTime {
        self.time
    }

    pub fn ntraf(&self) -> usize {
        self.traffic.ntraf()
    }

    pub fn traffic(&self) -> &Traffic {
        &self.traffic
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn wind(&self) -> &WindField {
        &self.wind
    }

    pub fn feed(&self) -> &DataFeedReconciler {
        &self.feed
    }

    pub fn timeline(&self) -> &ScenarioTimeline {
        &self.timeline
    }

    pub fn id2idx(&self, callsign: &str) -> Option<usize> {
        self.traffic.id2idx(callsign)
    }

    /// True while a replay still has unread track buckets.
    pub fn replay_active(&self) -> bool {
        self.replay.is_some()
    }

    /// Attach an external per-row structure (see [`Traffic::register_dependent`]).
    pub fn register_dependent(&mut self, dependent: Box<dyn LockstepArrays>) -> Result<()> {
        self.traffic.register_dependent(dependent)
    }

    /// Process queued commands, then timeline commands due at `now`.
    ///
    /// Queued commands count as issued at the start of the tick; timeline
    /// commands as issued at their scheduled time.
    fn process_commands(&mut self, now: f64) {
        let tick_start = self.time.elapsed_secs;
        while let Some(command) = self.command_queue.pop_front() {
            self.apply_command(command, tick_start, now);
        }
        while let Some(timed) = self.timeline.pop_due(now) {
            let issued = timed.time.clamp(tick_start, now);
            self.apply_command(timed.command, issued, now);
        }
    }

    fn apply_command(&mut self, command: ScenarioCommand, issued: f64, now: f64) {
        let label = format!("{command:?}");
        if let Err(e) = self.handle_command(command, issued, now) {
            warn!(command = %label, error = %e, "command failed");
            self.events.push(SimEvent::CommandFailed {
                command: label,
                message: e.to_string(),
            });
        }
    }

    /// Handle a single scenario command issued at sim time `issued` and
    /// applied at the tick end time `now`. Fails without side effects.
    fn handle_command(&mut self, command: ScenarioCommand, issued: f64, now: f64) -> Result<()> {
        match command {
            ScenarioCommand::Create {
                callsign,
                actype,
                lat,
                lon,
                hdg,
                alt,
                cas,
            } => {
                let new = NewAircraft {
                    callsign,
                    actype,
                    lat,
                    lon: wrap_lon(lon),
                    hdg: normalize_heading(hdg),
                    alt,
                    cas,
                };
                self.create(&[new], now)?;
            }
            ScenarioCommand::CreateRandom { count } => {
                if count > MAX_RANDOM_AIRCRAFT {
                    return Err(TrafficError::InvalidConfig(format!(
                        "at most {MAX_RANDOM_AIRCRAFT} random aircraft per command, got {count}"
                    )));
                }
                let register = &self.traffic.register;
                let aircraft = spawn::random_aircraft(
                    &mut self.rng,
                    count,
                    &self.config.traffic_area,
                    |cs| register.contains(cs),
                    &mut self.random_serial,
                );
                self.create(&aircraft, now)?;
            }
            ScenarioCommand::Delete { callsign } => {
                let row = self.traffic.require(&callsign)?;
                self.delete_rows(&[(row, DeleteReason::Command)]);
            }
            ScenarioCommand::Heading { callsign, hdg } => {
                let row = self.traffic.require(&callsign)?;
                let reg = &mut self.traffic.register;
                reg.sel_hdg[row] = normalize_heading(hdg);
                reg.lnav[row] = false;
                reg.manual[row] = true;
            }
            ScenarioCommand::Speed { callsign, cas } => {
                let row = self.traffic.require(&callsign)?;
                let reg = &mut self.traffic.register;
                reg.sel_tas[row] = cas_to_tas(cas, reg.alt[row]);
            }
            ScenarioCommand::Altitude { callsign, alt, vs } => {
                let row = self.traffic.require(&callsign)?;
                let reg = &mut self.traffic.register;
                reg.sel_alt[row] = alt.max(0.0);
                reg.vnav[row] = false;
                if let Some(vs) = vs {
                    reg.sel_vs[row] = vs.abs();
                }
            }
            ScenarioCommand::VerticalSpeed { callsign, vs } => {
                let row = self.traffic.require(&callsign)?;
                let reg = &mut self.traffic.register;
                reg.sel_vs[row] = vs.abs();
                reg.vnav[row] = false;
                if vs > 0.0 && reg.sel_alt[row] <= reg.alt[row] {
                    reg.sel_alt[row] = OPEN_CLIMB_ALT;
                } else if vs < 0.0 && reg.sel_alt[row] >= reg.alt[row] {
                    reg.sel_alt[row] = 0.0;
                } else if vs == 0.0 {
                    reg.sel_alt[row] = reg.alt[row];
                }
            }
            ScenarioCommand::Origin { callsign, airport } => {
                let row = self.traffic.require(&callsign)?;
                self.traffic.register.origin[row] = airport;
            }
            ScenarioCommand::Destination { callsign, airport } => {
                let row = self.traffic.require(&callsign)?;
                self.traffic.register.destination[row] = airport;
            }
            ScenarioCommand::Replay {
                source_type,
                dataset,
                start_time,
            } => {
                self.load_replay(&source_type, &dataset, start_time, issued)?;
            }
            ScenarioCommand::AddReplay { callsign } => {
                let row = self.traffic.require(&callsign)?;
                if self.feed.add(&mut self.traffic, row, now) {
                    self.events.push(SimEvent::RosterChanged {
                        callsign,
                        fed: true,
                    });
                }
            }
            ScenarioCommand::ReleaseReplay { callsign } => {
                if self.feed.release(&mut self.traffic, &callsign) {
                    let dropped = self.timeline.detach(&callsign);
                    debug!(callsign = %callsign, dropped, "detached scripted commands");
                    self.events.push(SimEvent::RosterChanged {
                        callsign,
                        fed: false,
                    });
                }
            }
            ScenarioCommand::Wind {
                from_deg,
                speed,
                alt,
            } => {
                if !from_deg.is_finite() || !speed.is_finite() || alt.is_some_and(|a| !a.is_finite()) {
                    return Err(TrafficError::InvalidConfig("wind values must be finite".into()));
                }
                self.wind.set(from_deg, speed, alt);
                info!(from_deg, speed, ?alt, "wind set");
            }
            ScenarioCommand::WindClear => {
                self.wind.clear();
                info!("wind cleared");
            }
            ScenarioCommand::ConflictInterval { secs } => {
                if secs.is_nan() || secs <= 0.0 {
                    return Err(TrafficError::InvalidConfig(format!(
                        "conflict interval must be positive, got {secs}"
                    )));
                }
                self.schedule.set_interval(secs);
            }
        }
        Ok(())
    }

    /// Create rows and emit one event per aircraft.
    fn create(&mut self, aircraft: &[NewAircraft], now: f64) -> Result<()> {
        self.traffic.create(aircraft, now)?;
        for new in aircraft {
            info!(callsign = %new.callsign, actype = %new.actype, "aircraft created");
            self.events.push(SimEvent::AircraftCreated {
                callsign: new.callsign.clone(),
            });
        }
        Ok(())
    }

    /// Delete rows in one compaction, then purge every callsign-keyed
    /// structure of the removed aircraft.
    fn delete_rows(&mut self, doomed: &[(usize, DeleteReason)]) {
        let reasons: HashMap<String, DeleteReason> = doomed
            .iter()
            .filter(|(row, _)| *row < self.traffic.ntraf())
            .map(|&(row, reason)| (self.traffic.register.callsign[row].clone(), reason))
            .collect();
        let rows: Vec<usize> = doomed.iter().map(|&(row, _)| row).collect();

        for callsign in self.traffic.delete(&rows) {
            let reason = reasons
                .get(&callsign)
                .copied()
                .unwrap_or(DeleteReason::Command);
            self.feed.purge(&callsign);
            self.timeline.detach(&callsign);
            info!(callsign = %callsign, ?reason, "aircraft deleted");
            self.events.push(SimEvent::AircraftDeleted { callsign, reason });
        }
    }

    /// Resolve deletes scheduled on an earlier tick. Ids whose aircraft is
    /// already gone are dropped.
    fn apply_pending_deletes(&mut self) {
        if self.pending_deletes.is_empty() {
            return;
        }
        let doomed: Vec<(usize, DeleteReason)> = std::mem::take(&mut self.pending_deletes)
            .into_iter()
            .filter_map(|(id, reason)| self.traffic.row_of(id).map(|row| (row, reason)))
            .collect();
        self.delete_rows(&doomed);
    }

    /// Load a replay dataset and arm its timeline and track cursor so the
    /// dataset's t = 0 plays at sim time `offset`. On failure nothing is
    /// changed.
    fn load_replay(
        &mut self,
        source_type: &str,
        dataset: &str,
        start_time: Option<f64>,
        offset: f64,
    ) -> Result<()> {
        let source_type: SourceType = source_type.parse()?;
        let mut request = ReplayRequest::new(source_type, dataset);
        if let Some(start) = start_time {
            request = request.with_start_time(start);
        }
        let options = IngestOptions {
            resample_secs: self.config.replay.resample_secs,
        };
        let cache = self.config.replay.cache_dir.as_ref().map(ReplayCache::new);

        let (loaded, from_cache) = atcsim_replay::load(&request, &options, cache.as_ref())?;

        if let Some(previous) = self.replay.take() {
            info!(dataset = %previous.dataset, "replacing active replay");
        }
        info!(
            dataset,
            flights = loaded.flights.len(),
            rows = loaded.table.len(),
            from_cache,
            offset,
            "replay armed"
        );
        self.events.push(SimEvent::ReplayLoaded {
            dataset: dataset.to_string(),
            flights: loaded.flights.len(),
            rows: loaded.table.len(),
            from_cache,
        });
        self.timeline.merge(loaded.timeline, offset);
        self.replay = Some(ActiveReplay {
            dataset: dataset.to_string(),
            cursor: ReplayCursor::new(loaded.table, offset),
        });
        Ok(())
    }

    /// Stage every replay bucket due at `now`, oldest first.
    fn pull_replay(&mut self, now: f64) {
        let Some(active) = self.replay.as_mut() else {
            return;
        };
        while let Some(batch) = active.cursor.next_batch(now) {
            self.feed.stage_batch(batch);
        }
        if active.cursor.is_finished() {
            info!(dataset = %active.dataset, "replay finished");
            self.replay = None;
        }
    }

    /// Create and roster aircraft for sample callsigns not in the register.
    fn create_from_samples(&mut self, samples: &[TrackSample]) {
        let now = self.time.elapsed_secs;
        let mut order: Vec<&str> = Vec::new();
        let mut latest: HashMap<&str, &TrackSample> = HashMap::new();
        for sample in samples {
            if self.traffic.register.contains(&sample.callsign) {
                continue;
            }
            if latest.insert(sample.callsign.as_str(), sample).is_none() {
                order.push(sample.callsign.as_str());
            }
        }
        let aircraft: Vec<NewAircraft> = order
            .iter()
            .filter_map(|cs| latest.get(cs))
            .map(|sample| NewAircraft::from_sample(sample, FEED_ACTYPE))
            .collect();
        if aircraft.is_empty() {
            return;
        }

        if let Err(e) = self.create(&aircraft, now) {
            warn!(error = %e, "could not create aircraft from feed samples");
            return;
        }
        for new in &aircraft {
            if let Some(row) = self.traffic.id2idx(&new.callsign) {
                if self.feed.add(&mut self.traffic, row, now) {
                    self.events.push(SimEvent::RosterChanged {
                        callsign: new.callsign.clone(),
                        fed: true,
                    });
                }
            }
        }
    }

    fn handle_report(&mut self, report: ReconcileReport) {
        for (callsign, reason) in report.skipped {
            self.events
                .push(SimEvent::ReconcileSkipped { callsign, reason });
        }
        for callsign in report.timed_out {
            if let Some(row) = self.traffic.id2idx(&callsign) {
                let id = self.traffic.register.id[row];
                if !self.pending_deletes.iter().any(|(p, _)| *p == id) {
                    self.pending_deletes.push((id, DeleteReason::CoastTimeout));
                }
            }
        }
    }
}
