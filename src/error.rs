//! Error taxonomy for raw-record mapping, canonicalization, and statistics.

use thiserror::Error;

/// A raw record could not be translated into a canonical record.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum MapError {
    #[error("missing required field '{field}'")]
    MissingField { field: &'static str },
    #[error("malformed value {value:?} in field '{field}'")]
    MalformedValue { field: &'static str, value: String },
    #[error("timestamp {value:?} in field '{field}' does not match format '{format}'")]
    MalformedTimestamp {
        field: &'static str,
        value: String,
        format: &'static str,
    },
}

/// A single record of a stream failed. `index` is 1-based.
#[derive(Debug, Error)]
pub enum RecordError {
    #[error("record {index}: {source}")]
    Map {
        index: u64,
        #[source]
        source: MapError,
    },
    #[error("record {index}: unreadable row: {source}")]
    Read {
        index: u64,
        #[source]
        source: csv::Error,
    },
}

impl RecordError {
    pub fn index(&self) -> u64 {
        match self {
            RecordError::Map { index, .. } | RecordError::Read { index, .. } => *index,
        }
    }

    /// I/O failures end the stream no matter what the error policy says.
    pub fn is_fatal(&self) -> bool {
        matches!(self, RecordError::Read { source, .. } if source.is_io_error())
    }
}

/// Statistic computation failures that are not "undefined for this group".
#[derive(Debug, Clone, PartialEq, Error)]
pub enum StatsError {
    #[error("sequence lengths differ ({left} vs {right})")]
    LengthMismatch { left: usize, right: usize },
    #[error("correlation is undefined: fewer than two points or zero variance")]
    DegenerateInput,
    #[error("day order must list each of the seven weekdays exactly once")]
    InvalidDayOrder,
    #[error("invalid histogram bins: width {width}, upper bound {max}")]
    InvalidBins { width: f64, max: f64 },
    #[error("invalid {name}: {minutes} minutes")]
    InvalidMinutes { name: &'static str, minutes: f64 },
}
