//! Scenario commands and their text form.
//!
//! Commands arrive either as structured values (from code or JSON) or as
//! text lines such as `CRE KL123 B738 52.3 4.8 90 FL100 250`. Text lines are
//! resolved through a static descriptor table: each entry names the command,
//! the kind of every argument and a builder producing the typed command.
//! Commands are queued and applied at the next tick boundary.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::constants::{FPM, FT, KTS, MAX_RANDOM_AIRCRAFT};
use crate::error::{CommandError, Result};
use crate::geo::{normalize_heading, wrap_lon};

/// All scenario actions understood by the simulation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ScenarioCommand {
    // --- Traffic lifecycle ---
    /// Create one aircraft. Altitude in m, calibrated airspeed in m/s.
    Create {
        callsign: String,
        actype: String,
        lat: f64,
        lon: f64,
        hdg: f64,
        alt: f64,
        cas: f64,
    },
    /// Create `count` aircraft at random positions (seeded).
    CreateRandom { count: u32 },
    /// Delete an aircraft.
    Delete { callsign: String },

    // --- Targets ---
    /// Select a heading (degrees).
    Heading { callsign: String, hdg: f64 },
    /// Select a calibrated airspeed (m/s).
    Speed { callsign: String, cas: f64 },
    /// Select an altitude (m), optionally with a climb/descent rate (m/s).
    Altitude {
        callsign: String,
        alt: f64,
        vs: Option<f64>,
    },
    /// Select a vertical speed (m/s).
    VerticalSpeed { callsign: String, vs: f64 },
    /// Set the origin airport.
    Origin { callsign: String, airport: String },
    /// Set the destination airport.
    Destination { callsign: String, airport: String },

    // --- External track data ---
    /// Load a replay dataset and arm its command timeline.
    Replay {
        source_type: String,
        dataset: String,
        start_time: Option<f64>,
    },
    /// Put an aircraft under external track-data control.
    AddReplay { callsign: String },
    /// Return an aircraft to full simulation.
    ReleaseReplay { callsign: String },

    // --- Environment ---
    /// Wind from `from_deg` at `speed` m/s, at `alt` m or at all altitudes.
    Wind {
        from_deg: f64,
        speed: f64,
        alt: Option<f64>,
    },
    /// Remove all wind.
    WindClear,

    // --- Conflict detection ---
    /// Interval between conflict detection runs (s).
    ConflictInterval { secs: f64 },
}

impl ScenarioCommand {
    /// The aircraft this command is bound to, if any.
    pub fn callsign(&self) -> Option<&str> {
        match self {
            Self::Create { callsign, .. }
            | Self::Delete { callsign }
            | Self::Heading { callsign, .. }
            | Self::Speed { callsign, .. }
            | Self::Altitude { callsign, .. }
            | Self::VerticalSpeed { callsign, .. }
            | Self::Origin { callsign, .. }
            | Self::Destination { callsign, .. }
            | Self::AddReplay { callsign }
            | Self::ReleaseReplay { callsign } => Some(callsign),
            Self::CreateRandom { .. }
            | Self::Replay { .. }
            | Self::Wind { .. }
            | Self::WindClear
            | Self::ConflictInterval { .. } => None,
        }
    }

    pub fn is_creation(&self) -> bool {
        matches!(self, Self::Create { .. } | Self::CreateRandom { .. })
    }
}

/// A command scheduled at a simulation time (s).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimedCommand {
    pub time: f64,
    pub command: ScenarioCommand,
}

impl TimedCommand {
    pub fn new(time: f64, command: ScenarioCommand) -> Self {
        Self { time, command }
    }
}

// --- Descriptor table ---

/// How a text argument is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArgKind {
    /// Aircraft identification, upper-cased.
    Callsign,
    /// Free word, upper-cased.
    Word,
    /// File system path, kept verbatim.
    Path,
    /// Degrees, must lie in [-90, 90].
    Latitude,
    /// Degrees, wrapped into [-180, 180).
    Longitude,
    /// Degrees, normalized into [0, 360).
    Heading,
    /// Feet or `FLnnn`, stored in meters.
    Altitude,
    /// Knots, stored in m/s.
    Speed,
    /// Feet per minute, stored in m/s.
    VerticalSpeed,
    /// Non-negative seconds or `HH:MM:SS`.
    Seconds,
    /// Non-negative integer.
    Count,
}

#[derive(Debug, Clone, Copy)]
pub struct ArgSpec {
    pub name: &'static str,
    pub kind: ArgKind,
    pub optional: bool,
}

const fn req(name: &'static str, kind: ArgKind) -> ArgSpec {
    ArgSpec {
        name,
        kind,
        optional: false,
    }
}

const fn opt(name: &'static str, kind: ArgKind) -> ArgSpec {
    ArgSpec {
        name,
        kind,
        optional: true,
    }
}

#[derive(Debug, Clone, PartialEq)]
enum ArgValue {
    Text(String),
    Number(f64),
    Count(u32),
}

/// One entry of the command table.
pub struct CommandDescriptor {
    pub name: &'static str,
    pub aliases: &'static [&'static str],
    pub args: &'static [ArgSpec],
    build: fn(&mut Args) -> Result<ScenarioCommand>,
}

impl CommandDescriptor {
    /// Usage string, e.g. `ALT callsign alt [vs]`.
    pub fn usage(&self) -> String {
        let mut usage = self.name.to_string();
        for spec in self.args {
            if spec.optional {
                usage.push_str(&format!(" [{}]", spec.name));
            } else {
                usage.push_str(&format!(" {}", spec.name));
            }
        }
        usage
    }
}

use ArgKind::*;

pub static COMMANDS: &[CommandDescriptor] = &[
    CommandDescriptor {
        name: "CRE",
        aliases: &["CREATE"],
        args: &[
            req("callsign", Callsign),
            req("actype", Word),
            req("lat", Latitude),
            req("lon", Longitude),
            req("hdg", Heading),
            req("alt", Altitude),
            req("spd", Speed),
        ],
        build: build_create,
    },
    CommandDescriptor {
        name: "MCRE",
        aliases: &[],
        args: &[req("count", Count)],
        build: |a| {
            Ok(ScenarioCommand::CreateRandom {
                count: a.count()?,
            })
        },
    },
    CommandDescriptor {
        name: "DEL",
        aliases: &["DELETE"],
        args: &[req("callsign", Callsign)],
        build: |a| {
            Ok(ScenarioCommand::Delete {
                callsign: a.text()?,
            })
        },
    },
    CommandDescriptor {
        name: "HDG",
        aliases: &["HEADING"],
        args: &[req("callsign", Callsign), req("hdg", Heading)],
        build: |a| {
            Ok(ScenarioCommand::Heading {
                callsign: a.text()?,
                hdg: a.number()?,
            })
        },
    },
    CommandDescriptor {
        name: "SPD",
        aliases: &["SPEED"],
        args: &[req("callsign", Callsign), req("spd", Speed)],
        build: |a| {
            Ok(ScenarioCommand::Speed {
                callsign: a.text()?,
                cas: a.number()?,
            })
        },
    },
    CommandDescriptor {
        name: "ALT",
        aliases: &["ALTITUDE"],
        args: &[
            req("callsign", Callsign),
            req("alt", Altitude),
            opt("vs", VerticalSpeed),
        ],
        build: |a| {
            Ok(ScenarioCommand::Altitude {
                callsign: a.text()?,
                alt: a.number()?,
                vs: a.opt_number()?,
            })
        },
    },
    CommandDescriptor {
        name: "VS",
        aliases: &[],
        args: &[req("callsign", Callsign), req("vs", VerticalSpeed)],
        build: |a| {
            Ok(ScenarioCommand::VerticalSpeed {
                callsign: a.text()?,
                vs: a.number()?,
            })
        },
    },
    CommandDescriptor {
        name: "ORIG",
        aliases: &["ORIGIN"],
        args: &[req("callsign", Callsign), req("airport", Word)],
        build: |a| {
            Ok(ScenarioCommand::Origin {
                callsign: a.text()?,
                airport: a.text()?,
            })
        },
    },
    CommandDescriptor {
        name: "DEST",
        aliases: &["DESTINATION"],
        args: &[req("callsign", Callsign), req("airport", Word)],
        build: |a| {
            Ok(ScenarioCommand::Destination {
                callsign: a.text()?,
                airport: a.text()?,
            })
        },
    },
    CommandDescriptor {
        name: "REPLAY",
        aliases: &[],
        args: &[
            req("source_type", Word),
            req("dataset", Path),
            opt("start_time", Seconds),
        ],
        build: |a| {
            Ok(ScenarioCommand::Replay {
                source_type: a.text()?.to_lowercase(),
                dataset: a.text()?,
                start_time: a.opt_number()?,
            })
        },
    },
    CommandDescriptor {
        name: "ADDREPLAY",
        aliases: &[],
        args: &[req("callsign", Callsign)],
        build: |a| {
            Ok(ScenarioCommand::AddReplay {
                callsign: a.text()?,
            })
        },
    },
    CommandDescriptor {
        name: "UCO",
        aliases: &["RELEASE"],
        args: &[req("callsign", Callsign)],
        build: |a| {
            Ok(ScenarioCommand::ReleaseReplay {
                callsign: a.text()?,
            })
        },
    },
    CommandDescriptor {
        name: "WIND",
        aliases: &[],
        args: &[req("dir", Heading), req("spd", Speed), opt("alt", Altitude)],
        build: |a| {
            Ok(ScenarioCommand::Wind {
                from_deg: a.number()?,
                speed: a.number()?,
                alt: a.opt_number()?,
            })
        },
    },
    CommandDescriptor {
        name: "WINDCLEAR",
        aliases: &[],
        args: &[],
        build: |_| Ok(ScenarioCommand::WindClear),
    },
    CommandDescriptor {
        name: "ASASDT",
        aliases: &["DTASAS"],
        args: &[req("interval", Seconds)],
        build: |a| {
            Ok(ScenarioCommand::ConflictInterval {
                secs: a.number()?,
            })
        },
    },
];

fn build_create(a: &mut Args) -> Result<ScenarioCommand> {
    Ok(ScenarioCommand::Create {
        callsign: a.text()?,
        actype: a.text()?,
        lat: a.number()?,
        lon: a.number()?,
        hdg: a.number()?,
        alt: a.number()?,
        cas: a.number()?,
    })
}

/// Look up a command by name or alias (case-insensitive).
pub fn descriptor(name: &str) -> Option<&'static CommandDescriptor> {
    let name = name.to_uppercase();
    COMMANDS
        .iter()
        .find(|d| d.name == name || d.aliases.contains(&name.as_str()))
}

/// Parsed arguments handed to a descriptor's builder, consumed in order.
struct Args {
    command: &'static str,
    specs: &'static [ArgSpec],
    values: VecDeque<Option<ArgValue>>,
    next: usize,
}

impl Args {
    fn pop(&mut self) -> Result<(Option<ArgValue>, &'static str)> {
        let name = self.specs.get(self.next).map_or("?", |s| s.name);
        self.next += 1;
        match self.values.pop_front() {
            Some(value) => Ok((value, name)),
            None => Err(CommandError::MissingArgument {
                command: self.command,
                arg: name,
            }),
        }
    }

    fn mismatch(&self, arg: &'static str, value: Option<ArgValue>) -> CommandError {
        CommandError::BadValue {
            command: self.command,
            arg,
            value: format!("{value:?}"),
        }
    }

    fn text(&mut self) -> Result<String> {
        match self.pop()? {
            (Some(ArgValue::Text(s)), _) => Ok(s),
            (other, arg) => Err(self.mismatch(arg, other)),
        }
    }

    fn number(&mut self) -> Result<f64> {
        match self.opt_number()? {
            Some(n) => Ok(n),
            None => Err(CommandError::MissingArgument {
                command: self.command,
                arg: self.specs.get(self.next - 1).map_or("?", |s| s.name),
            }),
        }
    }

    fn opt_number(&mut self) -> Result<Option<f64>> {
        match self.pop()? {
            (Some(ArgValue::Number(n)), _) => Ok(Some(n)),
            (None, _) => Ok(None),
            (other, arg) => Err(self.mismatch(arg, other)),
        }
    }

    fn count(&mut self) -> Result<u32> {
        match self.pop()? {
            (Some(ArgValue::Count(n)), _) => Ok(n),
            (other, arg) => Err(self.mismatch(arg, other)),
        }
    }
}

/// Parse one command line into a typed command.
pub fn parse_line(line: &str) -> Result<ScenarioCommand> {
    let mut tokens = line
        .split(|c: char| c.is_whitespace() || c == ',')
        .filter(|t| !t.is_empty());

    let name = tokens.next().ok_or(CommandError::Empty)?;
    let desc = descriptor(name).ok_or_else(|| CommandError::UnknownCommand(name.to_uppercase()))?;
    let tokens: Vec<&str> = tokens.collect();

    if tokens.len() > desc.args.len() {
        return Err(CommandError::TooManyArguments { command: desc.name });
    }

    let mut values = VecDeque::with_capacity(desc.args.len());
    for (i, spec) in desc.args.iter().enumerate() {
        match tokens.get(i) {
            Some(token) => values.push_back(Some(parse_arg(desc.name, spec, token)?)),
            None if spec.optional => values.push_back(None),
            None => {
                return Err(CommandError::MissingArgument {
                    command: desc.name,
                    arg: spec.name,
                })
            }
        }
    }

    let mut args = Args {
        command: desc.name,
        specs: desc.args,
        values,
        next: 0,
    };
    (desc.build)(&mut args)
}

fn parse_arg(command: &'static str, spec: &ArgSpec, token: &str) -> Result<ArgValue> {
    let bad = || CommandError::BadValue {
        command,
        arg: spec.name,
        value: token.to_string(),
    };
    let number = || token.parse::<f64>().ok().filter(|v| v.is_finite()).ok_or_else(bad);

    let value = match spec.kind {
        Callsign => {
            if !token.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_') {
                return Err(bad());
            }
            ArgValue::Text(token.to_uppercase())
        }
        Word => ArgValue::Text(token.to_uppercase()),
        Path => ArgValue::Text(token.to_string()),
        Latitude => {
            let lat = number()?;
            if !(-90.0..=90.0).contains(&lat) {
                return Err(bad());
            }
            ArgValue::Number(lat)
        }
        Longitude => ArgValue::Number(wrap_lon(number()?)),
        Heading => ArgValue::Number(normalize_heading(number()?)),
        Altitude => ArgValue::Number(parse_altitude(token).ok_or_else(bad)?),
        Speed => ArgValue::Number(number()? * KTS),
        VerticalSpeed => ArgValue::Number(number()? * FPM),
        Seconds => {
            let secs = parse_timestamp(token).map_err(|_| bad())?;
            ArgValue::Number(secs)
        }
        Count => {
            let count: u32 = token.parse().map_err(|_| bad())?;
            if count > MAX_RANDOM_AIRCRAFT {
                return Err(bad());
            }
            ArgValue::Count(count)
        }
    };
    Ok(value)
}

/// Parse `FL350` or a plain number of feet into meters.
pub fn parse_altitude(token: &str) -> Option<f64> {
    let upper = token.to_uppercase();
    let feet = match upper.strip_prefix("FL") {
        Some(level) => level.parse::<f64>().ok()? * 100.0,
        None => upper.parse::<f64>().ok()?,
    };
    feet.is_finite().then_some(feet * FT)
}

/// Parse `HH:MM:SS.ss`, `MM:SS` or plain seconds.
pub fn parse_timestamp(token: &str) -> Result<f64> {
    let bad = || CommandError::BadTimestamp(token.to_string());
    let parts: Vec<&str> = token.trim().split(':').collect();
    if parts.is_empty() || parts.len() > 3 {
        return Err(bad());
    }

    let mut secs = 0.0;
    for part in parts {
        let value: f64 = part.parse().map_err(|_| bad())?;
        if !value.is_finite() || value < 0.0 {
            return Err(bad());
        }
        secs = secs * 60.0 + value;
    }
    Ok(secs)
}

/// Format seconds as `HH:MM:SS.ss`.
pub fn format_timestamp(secs: f64) -> String {
    let secs = secs.max(0.0);
    let hours = (secs / 3600.0).floor();
    let minutes = ((secs - hours * 3600.0) / 60.0).floor();
    let seconds = secs - hours * 3600.0 - minutes * 60.0;
    format!("{:02}:{:02}:{:05.2}", hours as u64, minutes as u64, seconds)
}

/// Parse a scenario file: `HH:MM:SS.ss>COMMAND args` per line, `#` comments.
///
/// The result is sorted by time; commands sharing a time keep file order.
pub fn parse_scenario(text: &str) -> Result<Vec<TimedCommand>> {
    let mut commands = Vec::new();

    for (i, raw) in text.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let parsed = line
            .split_once('>')
            .ok_or_else(|| CommandError::BadTimestamp(line.to_string()))
            .and_then(|(time, cmd)| Ok(TimedCommand::new(parse_timestamp(time)?, parse_line(cmd)?)));

        match parsed {
            Ok(cmd) => commands.push(cmd),
            Err(e) => {
                return Err(CommandError::Line {
                    line: i + 1,
                    source: Box::new(e),
                })
            }
        }
    }

    commands.sort_by(|a, b| a.time.total_cmp(&b.time));
    Ok(commands)
}
