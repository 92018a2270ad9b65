use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::core::recovery::RecoveryError;

#[derive(Debug, Error)]
pub enum PlotError {
    #[error("i/o error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("csv error in {path}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("{path}: row {row}, column {column}: cannot parse {value:?} as a number")]
    MalformedField {
        path: PathBuf,
        row: usize,
        column: usize,
        value: String,
    },

    #[error("{path}: no row for contact number {contact}")]
    MissingContactRow { path: PathBuf, contact: usize },

    #[error("cannot read run parameters from file name {0:?}")]
    InvalidFileName(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("missing data: {0}")]
    MissingData(String),

    #[error("failed to render {path}: {message}")]
    Render { path: PathBuf, message: String },

    #[error(transparent)]
    Recovery(#[from] RecoveryError),
}

impl PlotError {
    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
