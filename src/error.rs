use std::path::PathBuf;

use thiserror::Error;

use crate::prediction::ModelKind;

/// Failures surfaced by the data and prediction layers.
///
/// Every variant is independently recoverable: a broken vegetation file does
/// not poison the climate cache, and a corrupt forest artifact leaves the
/// linear model usable.
#[derive(Debug, Error)]
pub enum Error {
    /// The source file is missing or cannot be read.
    #[error("data source unavailable: {}: {source}", .path.display())]
    DataSourceUnavailable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A token in the source could not be parsed.
    #[error("malformed data in {}: {detail}", .path.display())]
    DataFormat { path: PathBuf, detail: String },

    /// A pipeline artifact is absent, corrupt, or does not match the expected interface.
    #[error("cannot load {kind} pipeline from {}: {detail}", .path.display())]
    ModelLoad {
        kind: ModelKind,
        path: PathBuf,
        detail: String,
    },

    /// A feature vector was rejected before reaching the model.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error(transparent)]
    Csv(#[from] csv::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
