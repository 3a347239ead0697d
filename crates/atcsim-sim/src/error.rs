//! Error type for the simulation runtime.

use thiserror::Error;

use atcsim_core::error::CommandError;
use atcsim_replay::ReplayError;

pub type Result<T> = std::result::Result<T, TrafficError>;

#[derive(Error, Debug)]
pub enum TrafficError {
    #[error("callsign {0} is already in use")]
    DuplicateCallsign(String),

    #[error("no aircraft with callsign {0}")]
    UnknownCallsign(String),

    #[error("dependent array has {found} rows, register has {expected}")]
    MisalignedDependent { expected: usize, found: usize },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error(transparent)]
    Command(#[from] CommandError),

    #[error(transparent)]
    Replay(#[from] ReplayError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
