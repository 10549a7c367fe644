// src/data_input/run_data.rs

use ndarray::Array1;

use crate::constants::{CALIBRATION_VALUE_COUNT, CHANNEL_COUNT, SAMPLE_RATE_HZ};
use crate::error::ReductionError;
use crate::types::ChannelSet;

/// Fixed semantic role of each DAQ channel. The rig wiring is static so the
/// index → role map is part of the data model, not configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelRole {
    WaveProbe,
    KielStbd,
    KielPort,
    StaticPressureStbd,
    StaticPressurePort,
    RpmStbd,
    RpmPort,
    ThrustStbd,
    ThrustPort,
    TorqueStbd,
    TorquePort,
}

impl ChannelRole {
    pub const ALL: [ChannelRole; CHANNEL_COUNT] = [
        ChannelRole::WaveProbe,
        ChannelRole::KielStbd,
        ChannelRole::KielPort,
        ChannelRole::StaticPressureStbd,
        ChannelRole::StaticPressurePort,
        ChannelRole::RpmStbd,
        ChannelRole::RpmPort,
        ChannelRole::ThrustStbd,
        ChannelRole::ThrustPort,
        ChannelRole::TorqueStbd,
        ChannelRole::TorquePort,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    /// Column name used by the instrument log export.
    pub fn column_name(self) -> &'static str {
        match self {
            ChannelRole::WaveProbe => "wave_probe",
            ChannelRole::KielStbd => "kiel_stbd",
            ChannelRole::KielPort => "kiel_port",
            ChannelRole::StaticPressureStbd => "static_press_stbd",
            ChannelRole::StaticPressurePort => "static_press_port",
            ChannelRole::RpmStbd => "rpm_stbd",
            ChannelRole::RpmPort => "rpm_port",
            ChannelRole::ThrustStbd => "thrust_stbd",
            ChannelRole::ThrustPort => "thrust_port",
            ChannelRole::TorqueStbd => "torque_stbd",
            ChannelRole::TorquePort => "torque_port",
        }
    }
}

/// Per-channel (zero, factor) pair. Loaded once per run, never mutated.
#[derive(Debug, Clone, Copy)]
pub struct CalibrationRecord {
    pub zero: f64,
    pub factor: f64,
}

/// Full calibration for a run: one record per channel plus the time
/// zero/scale pair, in the fixed flat layout the instrument log supplies
/// (11 channel pairs followed by the time pair, 24 values total).
#[derive(Debug, Clone)]
pub struct CalibrationSet {
    channels: [CalibrationRecord; CHANNEL_COUNT],
    pub time_zero: f64,
    pub time_scale: f64,
}

impl CalibrationSet {
    /// Builds a set from the flat 24-value array. A zero calibration factor
    /// is a configuration error; the wave probe is exempt because its
    /// factor is superseded by the rig conversion constant.
    pub fn from_flat(values: &[f64]) -> Result<Self, ReductionError> {
        if values.len() != CALIBRATION_VALUE_COUNT {
            return Err(ReductionError::CalibrationCount {
                expected: CALIBRATION_VALUE_COUNT,
                actual: values.len(),
            });
        }
        let mut channels = [CalibrationRecord {
            zero: 0.0,
            factor: 1.0,
        }; CHANNEL_COUNT];
        for (ch, record) in channels.iter_mut().enumerate() {
            let zero = values[2 * ch];
            let factor = values[2 * ch + 1];
            if factor == 0.0 && ch != ChannelRole::WaveProbe.index() {
                return Err(ReductionError::ZeroCalibrationFactor { channel: ch });
            }
            *record = CalibrationRecord { zero, factor };
        }
        Ok(CalibrationSet {
            channels,
            time_zero: values[2 * CHANNEL_COUNT],
            time_scale: values[2 * CHANNEL_COUNT + 1],
        })
    }

    pub fn channel(&self, role: ChannelRole) -> CalibrationRecord {
        self.channels[role.index()]
    }
}

/// Trims applied to both ends of a recording before analysis, excluding
/// carriage acceleration/deceleration transients.
#[derive(Debug, Clone, Copy)]
pub struct WindowPolicy {
    pub start_trim_s: f64,
    pub end_trim_s: f64,
}

impl WindowPolicy {
    pub fn standard() -> Self {
        WindowPolicy {
            start_trim_s: crate::constants::WINDOW_TRIM_S,
            end_trim_s: crate::constants::WINDOW_TRIM_S,
        }
    }

    /// Policy for short-duration runs, where a 10 s trim per end would eat
    /// most of the record.
    pub fn short() -> Self {
        WindowPolicy {
            start_trim_s: crate::constants::SHORT_RUN_TRIM_S,
            end_trim_s: crate::constants::SHORT_RUN_TRIM_S,
        }
    }

    /// Converts the second-valued trims into a half-open sample range
    /// `[start, end)`. An empty window is a configuration error.
    pub fn bounds(&self, len: usize, sample_rate: f64) -> Result<(usize, usize), ReductionError> {
        let start_trim = (self.start_trim_s * sample_rate).round() as usize;
        let end_trim = (self.end_trim_s * sample_rate).round() as usize;
        if start_trim + end_trim >= len {
            return Err(ReductionError::EmptyWindow {
                start_trim,
                end_trim,
                len,
            });
        }
        Ok((start_trim, len - end_trim))
    }
}

/// One recording session: shared time vector, eleven raw channels, the
/// run's calibration and windowing policy. Immutable once built.
#[derive(Debug, Clone)]
pub struct Run {
    pub id: u32,
    pub time: Array1<f64>,
    pub channels: ChannelSet,
    pub calibration: CalibrationSet,
    pub window: WindowPolicy,
}

impl Run {
    pub fn new(
        id: u32,
        time: Array1<f64>,
        channels: ChannelSet,
        calibration: CalibrationSet,
        window: WindowPolicy,
    ) -> Result<Self, ReductionError> {
        for (ch, samples) in channels.iter().enumerate() {
            if samples.len() != time.len() {
                return Err(ReductionError::LengthMismatch {
                    channel: ch,
                    expected: time.len(),
                    actual: samples.len(),
                });
            }
        }
        Ok(Run {
            id,
            time,
            channels,
            calibration,
            window,
        })
    }

    pub fn channel(&self, role: ChannelRole) -> &Array1<f64> {
        &self.channels[role.index()]
    }

    pub fn sample_count(&self) -> usize {
        self.time.len()
    }

    pub fn duration_s(&self) -> f64 {
        match (self.time.first(), self.time.last()) {
            (Some(first), Some(last)) => last - first,
            _ => 0.0,
        }
    }

    /// Measured acquisition rate from the time vector; falls back to the
    /// nominal DAQ rate when the record is too short to tell.
    pub fn sample_rate(&self) -> f64 {
        let duration = self.duration_s();
        if self.time.len() > 1 && duration > 0.0 {
            (self.time.len() - 1) as f64 / duration
        } else {
            SAMPLE_RATE_HZ
        }
    }

    /// Analysis-window sample range for this run.
    pub fn window_bounds(&self) -> Result<(usize, usize), ReductionError> {
        self.window.bounds(self.sample_count(), self.sample_rate())
    }
}


// src/data_input/run_data.rs
