// src/error.rs

use thiserror::Error;

/// Configuration errors: fatal to the run (or to the aggregation group)
/// they concern, never to the batch as a whole.
///
/// Signal-quality conditions (no RPM signal, too-short flow window) are
/// deliberately *not* here; they are explicit fields of the result types so
/// downstream aggregation can filter or flag them instead of failing.
#[derive(Error, Debug)]
pub enum ReductionError {
    #[error("calibration factor for channel {channel} is zero")]
    ZeroCalibrationFactor { channel: usize },
    #[error("expected {expected} calibration values, got {actual}")]
    CalibrationCount { expected: usize, actual: usize },
    #[error("channel {channel} has {actual} samples, time vector has {expected}")]
    LengthMismatch {
        channel: usize,
        expected: usize,
        actual: usize,
    },
    #[error("window trims ({start_trim} + {end_trim} samples) leave no samples of {len}")]
    EmptyWindow {
        start_trim: usize,
        end_trim: usize,
        len: usize,
    },
    #[error("analysis window holds {samples} sample(s), need at least 2")]
    WindowTooShort { samples: usize },
    #[error("run group '{tag}' has an empty run-id range")]
    EmptyGroup { tag: String },
    #[error("run group '{tag}' matches no processed runs")]
    NoGroupMembers { tag: String },
    #[error("unknown propulsion configuration tag '{0}'")]
    UnknownConfigTag(String),
    #[error("malformed instrument log: {0}")]
    MalformedLog(String),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("delimited-text error: {0}")]
    Csv(#[from] csv::Error),
}

// src/error.rs
