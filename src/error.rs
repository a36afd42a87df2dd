use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Fatal failures of an analysis run.
///
/// Per-line problems in the trace never surface here; they are logged and the
/// line is dropped (see [`crate::trace_record::ParseError`]).
#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("failed to read {}: {source}", .path.display())]
    Read { path: PathBuf, source: io::Error },

    #[error("failed to write {}: {source}", .path.display())]
    Write { path: PathBuf, source: io::Error },

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("failed to render chart {}: {message}", .path.display())]
    Chart { path: PathBuf, message: String },

    #[error("cache line size must be between 1 and 4096 bytes")]
    InvalidLineSize,
}

impl AnalysisError {
    pub(crate) fn read(path: impl Into<PathBuf>, source: io::Error) -> Self {
        AnalysisError::Read {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn write(path: impl Into<PathBuf>, source: io::Error) -> Self {
        AnalysisError::Write {
            path: path.into(),
            source,
        }
    }
}
