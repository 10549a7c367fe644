// src/types.rs
// Type aliases shared across the reduction pipeline

use ndarray::Array1;

use crate::constants::CHANNEL_COUNT;

// Compile-time assertion: the flat calibration layout depends on the fixed
// channel topology. Changing CHANNEL_COUNT is a rig change, not a tweak.
const _: () = assert!(CHANNEL_COUNT == 11, "rig topology is fixed at 11 channels");

/// One sample vector per physical sensor, index-aligned with ChannelRole.
pub type ChannelSet = [Array1<f64>; CHANNEL_COUNT];

/// Result of a run-level calibration pass: physical-unit samples plus the
/// arithmetic mean of the calibrated sequence.
pub type Calibrated = (Array1<f64>, f64);

// src/types.rs
