//! Errors raised while ingesting or caching replay datasets.

use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, ReplayError>;

#[derive(Error, Debug)]
pub enum ReplayError {
    #[error("unknown replay source type {0:?} (expected polar or geo)")]
    UnknownSourceType(String),

    #[error("dataset directory {0} does not exist")]
    DatasetNotFound(PathBuf),

    #[error("dataset path {0} is not a directory")]
    NotADirectory(PathBuf),

    #[error("dataset is missing required file {0}")]
    MissingFile(PathBuf),

    #[error("dataset manifest {0} does not define a reference point")]
    MissingReference(PathBuf),

    #[error("{file}: {source}")]
    Csv {
        file: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("{file}: bad time {value:?}")]
    BadTime { file: PathBuf, value: String },

    #[error("dataset {0} has no usable flights after filtering")]
    EmptyDataset(PathBuf),

    #[error("resample cadence must be positive, got {0}")]
    BadCadence(f64),

    #[error("IO error {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error {0}")]
    Json(#[from] serde_json::Error),
}
