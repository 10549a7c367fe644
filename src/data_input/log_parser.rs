// src/data_input/log_parser.rs

use csv::ReaderBuilder;
use log::{debug, warn};
use ndarray::Array1;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use crate::constants::CHANNEL_COUNT;
use crate::data_input::run_data::{CalibrationSet, ChannelRole, Run, WindowPolicy};
use crate::error::ReductionError;
use crate::types::ChannelSet;

/// Parses one instrument log into a `Run`.
///
/// The log is delimited text with a header row naming `time (s)` plus the
/// eleven channel columns (see `ChannelRole::column_name`). Rows with a
/// missing or unparseable timestamp are skipped with a warning; a missing
/// channel value within a kept row is treated as malformed because the DAQ
/// writes all channels on every scan.
pub fn parse_run_log(
    path: &Path,
    id: u32,
    calibration: CalibrationSet,
    window: WindowPolicy,
) -> Result<Run, ReductionError> {
    let file = File::open(path)?;
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(BufReader::new(file));

    // --- Header mapping ---
    let header_record = reader.headers()?.clone();
    let time_idx = header_record
        .iter()
        .position(|h| {
            let trimmed = h.trim();
            trimmed == "time (s)" || trimmed == "time"
        })
        .ok_or_else(|| ReductionError::MalformedLog("missing 'time (s)' column".into()))?;

    let mut channel_indices = [0usize; CHANNEL_COUNT];
    for role in ChannelRole::ALL {
        let name = role.column_name();
        let idx = header_record
            .iter()
            .position(|h| h.trim() == name)
            .ok_or_else(|| ReductionError::MalformedLog(format!("missing '{name}' column")))?;
        channel_indices[role.index()] = idx;
    }
    debug!("mapped {CHANNEL_COUNT} channel columns in {}", path.display());

    // --- Data rows ---
    let mut time: Vec<f64> = Vec::new();
    let mut channels: [Vec<f64>; CHANNEL_COUNT] = std::array::from_fn(|_| Vec::new());

    for (row_index, result) in reader.records().enumerate() {
        let record = match result {
            Ok(record) => record,
            Err(e) => {
                warn!("skipping row {} of {}: {}", row_index + 1, path.display(), e);
                continue;
            }
        };

        let parse_f64 =
            |csv_idx: usize| -> Option<f64> { record.get(csv_idx).and_then(|s| s.parse().ok()) };

        let Some(t) = parse_f64(time_idx) else {
            warn!(
                "skipping row {} of {}: missing or invalid timestamp",
                row_index + 1,
                path.display()
            );
            continue;
        };

        let mut row = [0.0f64; CHANNEL_COUNT];
        let mut row_ok = true;
        for (ch, value) in row.iter_mut().enumerate() {
            match parse_f64(channel_indices[ch]) {
                Some(v) => *value = v,
                None => {
                    row_ok = false;
                    break;
                }
            }
        }
        if !row_ok {
            return Err(ReductionError::MalformedLog(format!(
                "row {} of {} has a missing channel sample",
                row_index + 1,
                path.display()
            )));
        }

        time.push(t);
        for (ch, &value) in row.iter().enumerate() {
            channels[ch].push(value);
        }
    }

    if time.len() < 2 {
        return Err(ReductionError::MalformedLog(format!(
            "{} holds fewer than two samples",
            path.display()
        )));
    }
    debug!("read {} samples from {}", time.len(), path.display());

    // The logger's time base gets the same zero/factor treatment as the
    // channels, from the tail pair of the flat calibration layout.
    let (time_zero, time_scale) = (calibration.time_zero, calibration.time_scale);
    let time = Array1::from(time).mapv(|t| (t - time_zero) * time_scale);

    let channel_arrays: ChannelSet = channels.map(Array1::from);
    Run::new(id, time, channel_arrays, calibration, window)
}

/// Reads the flat 24-value calibration file: whitespace-, comma- or
/// line-separated numbers, `#`-prefixed comment lines ignored.
pub fn parse_calibration_file(path: &Path) -> Result<CalibrationSet, ReductionError> {
    let file = File::open(path)?;
    let mut values: Vec<f64> = Vec::new();
    for line in BufReader::new(file).lines() {
        let line = line?;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        for token in trimmed.split([' ', '\t', ',']) {
            if token.is_empty() {
                continue;
            }
            let value = token.parse::<f64>().map_err(|_| {
                ReductionError::MalformedLog(format!(
                    "bad calibration value '{token}' in {}",
                    path.display()
                ))
            })?;
            values.push(value);
        }
    }
    CalibrationSet::from_flat(&values)
}


// src/data_input/log_parser.rs
