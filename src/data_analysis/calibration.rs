// src/data_analysis/calibration.rs

use ndarray::Array1;

use crate::constants::WAVE_PROBE_KG_PER_VOLT;
use crate::data_input::run_data::CalibrationRecord;
use crate::types::Calibrated;

/// Converts a raw sample sequence into physical units:
/// `physical[i] = (raw[i] - zero) * factor`. Returns the calibrated
/// sequence together with its arithmetic mean.
///
/// Pure. A zero factor is a caller-side configuration error and is rejected
/// when the `CalibrationSet` is built, not here.
pub fn calibrate(raw: &Array1<f64>, record: CalibrationRecord) -> Calibrated {
    let physical = raw.mapv(|v| (v - record.zero) * record.factor);
    let mean = physical.mean().unwrap_or(0.0);
    (physical, mean)
}

/// Wave-probe variant: zero-subtracted volts scaled by the rig conversion
/// constant instead of the per-channel factor (see constants.rs for why the
/// nominal factor is overridden).
pub fn calibrate_wave_probe(raw: &Array1<f64>, zero: f64) -> Calibrated {
    calibrate(
        raw,
        CalibrationRecord {
            zero,
            factor: WAVE_PROBE_KG_PER_VOLT,
        },
    )
}


// src/data_analysis/calibration.rs
