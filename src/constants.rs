// src/constants.rs

// Nominal acquisition rate of the tank DAQ. Individual runs carry their own
// measured rate derived from the time vector; this is the fallback and the
// basis for converting second-valued trims into sample counts.
pub const SAMPLE_RATE_HZ: f64 = 800.0;

// Fixed channel topology of the rig (see data_input::run_data::ChannelRole).
pub const CHANNEL_COUNT: usize = 11;

// Flat calibration layout: one (zero, factor) pair per channel plus the
// time zero/scale pair at the tail.
pub const CALIBRATION_VALUE_COUNT: usize = 2 * CHANNEL_COUNT + 2;

// --- Shaft-speed extraction ---

// Samples discarded from the head of an RPM trace before peak detection,
// covering carriage acceleration and sensor settling (10 s at 800 Hz).
pub const RPM_TRANSIENT_SKIP_SAMPLES: usize = 8000;

// Absolute hysteresis threshold for the inductive-sensor pulse train, in
// volts. Must sit well inside the sensor's peak-to-peak swing: too small
// picks up noise wiggle, too large misses real pulses.
pub const RPM_PEAK_THRESHOLD_V: f64 = 0.5;

// Guard band around the minima-bounded interval so a genuine edge pulse is
// not truncated.
pub const RPM_EDGE_GUARD_SAMPLES: usize = 2;

// --- Analysis windowing ---

// Duration trimmed from each end of a recording to exclude acceleration
// and deceleration transients.
pub const WINDOW_TRIM_S: f64 = 10.0;

// Reduced trim for short-duration runs.
pub const SHORT_RUN_TRIM_S: f64 = 2.0;

// --- Wave probe ---

// Rig-specific conversion from wave-probe volts to collected mass in kg.
// Deliberately overrides the per-channel calibration factor: the probe was
// bench-calibrated against the collection-tank load cells and this constant
// is the accepted value for the rig.
pub const WAVE_PROBE_KG_PER_VOLT: f64 = 201.68;

// --- Quality review ---

// Fractional deviation (percent) between the interval-averaged and overall
// flow-rate estimates above which a run is flagged for review.
pub const FLOW_DISCREPANCY_REVIEW_PCT: f64 = 5.0;

// src/constants.rs
