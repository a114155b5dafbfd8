//! Error types for fetching and writing price series

use std::path::PathBuf;
use thiserror::Error;

use crate::DateRange;

/// Failures of a single fetch or write operation
#[derive(Debug, Error)]
pub enum DataError {
    /// Network failure, error status or unreadable response from the provider
    #[error("provider error for {symbol}: {message}")]
    Provider { symbol: String, message: String },

    #[error("no rows returned for {symbol} in {range}")]
    EmptyResult { symbol: String, range: DateRange },

    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV error on {}: {source}", .path.display())]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
}

impl DataError {
    pub fn provider(symbol: impl Into<String>, message: impl Into<String>) -> Self {
        DataError::Provider {
            symbol: symbol.into(),
            message: message.into(),
        }
    }

    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        DataError::Io {
            path: path.into(),
            source,
        }
    }

    pub fn is_provider(&self) -> bool {
        matches!(self, DataError::Provider { .. })
    }

    pub fn is_empty_result(&self) -> bool {
        matches!(self, DataError::EmptyResult { .. })
    }

    /// Write-side failures (file system or CSV encoding)
    pub fn is_io(&self) -> bool {
        matches!(self, DataError::Io { .. } | DataError::Csv { .. })
    }
}

/// Stage-tagged failure of one dataset split
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("fetch failed for {split} range {range}")]
    Fetch {
        split: String,
        range: DateRange,
        #[source]
        source: DataError,
    },

    #[error("write failed for {split} range {range} ({})", .path.display())]
    Write {
        split: String,
        range: DateRange,
        path: PathBuf,
        #[source]
        source: DataError,
    },
}

impl PipelineError {
    pub fn split(&self) -> &str {
        match self {
            PipelineError::Fetch { split, .. } | PipelineError::Write { split, .. } => split,
        }
    }

    pub fn data_error(&self) -> &DataError {
        match self {
            PipelineError::Fetch { source, .. } | PipelineError::Write { source, .. } => source,
        }
    }
}
