//! atcsim: headless simulation runner and replay cache preparation.
//!
//! Usage:
//!   atcsim prep geo data/ams-0501 --cache-dir cache --resample 5
//!   atcsim run --scenario departures.scn --dt 1 --duration 600 --snapshot-out final.json
//!   atcsim run --replay polar data/radar-0501 --duration 3600

use std::fs;
use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use atcsim_sim::core::commands::ScenarioCommand;
use atcsim_sim::core::events::SimEvent;
use atcsim_sim::replay::{self, IngestOptions, ReplayCache, ReplayRequest, SourceType};
use atcsim_sim::{SimConfig, SimulationEngine};

#[derive(Parser)]
#[command(name = "atcsim")]
#[command(about = "Air traffic simulation kernel", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Ingest a replay dataset into the cache and print a summary
    Prep {
        /// Dataset format: polar or geo
        source_type: SourceType,

        /// Dataset directory
        dataset: PathBuf,

        /// Seconds after the earliest sample to start from
        #[arg(long, default_value = "0")]
        start: f64,

        /// Cache directory (summary only when omitted)
        #[arg(long)]
        cache_dir: Option<PathBuf>,

        /// Resample the track table to this cadence (s)
        #[arg(long)]
        resample: Option<f64>,
    },
    /// Run the simulation headless and write the final snapshot as JSON
    Run {
        /// JSON configuration file
        #[arg(long)]
        config: Option<PathBuf>,

        /// Scenario file (HH:MM:SS.ss>COMMAND lines)
        #[arg(long)]
        scenario: Option<PathBuf>,

        /// Replay dataset: <source_type> <dataset>
        #[arg(long, num_args = 2, value_names = ["SOURCE_TYPE", "DATASET"])]
        replay: Option<Vec<String>>,

        /// Time step (s)
        #[arg(long, default_value = "1")]
        dt: f64,

        /// Simulated duration (s)
        #[arg(long, default_value = "600")]
        duration: f64,

        /// Snapshot output file (stdout when omitted)
        #[arg(long)]
        snapshot_out: Option<PathBuf>,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let result = match cli.command {
        Command::Prep {
            source_type,
            dataset,
            start,
            cache_dir,
            resample,
        } => cmd_prep(source_type, dataset, start, cache_dir, resample),
        Command::Run {
            config,
            scenario,
            replay,
            dt,
            duration,
            snapshot_out,
        } => cmd_run(config, scenario, replay, dt, duration, snapshot_out),
    };

    if let Err(message) = result {
        eprintln!("Error: {message}");
        process::exit(1);
    }
}

fn cmd_prep(
    source_type: SourceType,
    dataset: PathBuf,
    start: f64,
    cache_dir: Option<PathBuf>,
    resample: Option<f64>,
) -> Result<(), String> {
    if resample.is_some_and(|r| !r.is_finite() || r <= 0.0) {
        return Err("--resample must be positive".into());
    }
    let request = ReplayRequest::new(source_type, &dataset).with_start_time(start);
    let options = IngestOptions {
        resample_secs: resample,
    };
    let cache = cache_dir.map(ReplayCache::new);

    let (loaded, from_cache) =
        replay::load(&request, &options, cache.as_ref()).map_err(|e| e.to_string())?;

    println!("Dataset:   {}", dataset.display());
    println!("Source:    {source_type}");
    println!("Flights:   {}", loaded.flights.len());
    println!("Rows:      {}", loaded.table.len());
    println!("Duration:  {:.1} s", loaded.table.duration());
    println!("Commands:  {}", loaded.timeline.len());
    println!(
        "Dropped:   {} cancelled, {} incomplete, {} orphan rows, {} before start",
        loaded.dropped.cancelled,
        loaded.dropped.incomplete,
        loaded.dropped.orphan_rows,
        loaded.dropped.before_start
    );
    if let Some(cache) = &cache {
        let key = replay::CacheKey::new(&request, &options);
        let state = if from_cache { "hit" } else { "written" };
        println!("Cache:     {} ({state})", cache.path_for(&key).display());
    }
    Ok(())
}

fn cmd_run(
    config: Option<PathBuf>,
    scenario: Option<PathBuf>,
    replay_dataset: Option<Vec<String>>,
    dt: f64,
    duration: f64,
    snapshot_out: Option<PathBuf>,
) -> Result<(), String> {
    if !dt.is_finite() || dt <= 0.0 || !duration.is_finite() || duration < 0.0 {
        return Err("--dt must be positive and --duration non-negative".into());
    }
    let config = match config {
        Some(path) => {
            SimConfig::from_json_file(&path).map_err(|e| format!("{}: {e}", path.display()))?
        }
        None => SimConfig::default(),
    };
    let mut engine = SimulationEngine::new(config);

    if let Some(path) = scenario {
        let text = fs::read_to_string(&path).map_err(|e| format!("{}: {e}", path.display()))?;
        let count = engine
            .load_scenario(&text)
            .map_err(|e| format!("{}: {e}", path.display()))?;
        info!(path = %path.display(), commands = count, "scenario file read");
    }
    if let Some([source_type, dataset]) = replay_dataset.as_deref() {
        engine.queue_command(ScenarioCommand::Replay {
            source_type: source_type.to_lowercase(),
            dataset: dataset.clone(),
            start_time: None,
        });
    }

    let ticks = (duration / dt).round() as u64;
    let mut failures = 0usize;
    for _ in 0..ticks {
        engine.advance(dt);
        for event in engine.take_events() {
            if matches!(event, SimEvent::CommandFailed { .. }) {
                failures += 1;
            }
            debug!(event = ?event, "sim event");
        }
    }

    let snapshot = engine.snapshot();
    info!(
        ticks,
        elapsed = snapshot.time.elapsed_secs,
        ntraf = snapshot.aircraft.len(),
        fed = snapshot.feed_roster.len(),
        conflicts = snapshot.conflicts.total_conflicts,
        los = snapshot.conflicts.total_los,
        failed_commands = failures,
        "run complete"
    );

    let json = serde_json::to_string_pretty(&snapshot).map_err(|e| e.to_string())?;
    match snapshot_out {
        Some(path) => fs::write(&path, json).map_err(|e| format!("{}: {e}", path.display()))?,
        None => println!("{json}"),
    }
    Ok(())
}
