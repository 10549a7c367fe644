// src/data_analysis/shaft_speed.rs

use log::warn;
use ndarray::{s, Array1};

use crate::constants::RPM_EDGE_GUARD_SAMPLES;
use crate::data_analysis::peak_detection::peakdet;

/// Shaft speed derived from one inductive-sensor trace. `no_signal` marks a
/// signal-loss condition (no usable pulses); the zero RPM it carries is a
/// fallback, not a measurement, and aggregation filters on the flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RpmEstimate {
    pub rpm: u32,
    pub no_signal: bool,
}

impl RpmEstimate {
    pub fn no_signal() -> Self {
        RpmEstimate {
            rpm: 0,
            no_signal: true,
        }
    }

    pub fn measured(rpm: u32) -> Self {
        RpmEstimate {
            rpm,
            no_signal: false,
        }
    }
}

/// Estimates shaft RPM from a raw inductive-proximity trace (one pulse per
/// revolution).
///
/// The first `skip_samples` are discarded to avoid startup noise, then
/// pulses are located with `peakdet` at the absolute `threshold_v`. The
/// confirmed minima act as revolution markers: the analysis interval spans
/// the first to the last marker (widened by a small sample guard so an edge
/// pulse is not truncated), N markers bound N-1 full revolutions, and the
/// rate is revolutions over elapsed interval time. Basing the rate on the
/// bounded interval rather than mean inter-pulse spacing keeps a single
/// missed pulse from skewing the estimate.
pub fn estimate_shaft_rpm(
    time: &Array1<f64>,
    sensor: &Array1<f64>,
    skip_samples: usize,
    threshold_v: f64,
) -> RpmEstimate {
    if sensor.len() <= skip_samples {
        warn!(
            "RPM trace shorter ({}) than transient skip ({}); reporting no signal",
            sensor.len(),
            skip_samples
        );
        return RpmEstimate::no_signal();
    }

    let t = time.slice(s![skip_samples..]).to_vec();
    let v = sensor.slice(s![skip_samples..]).to_vec();
    let peaks = peakdet(&t, &v, threshold_v);

    // Need both polarities confirmed and at least two revolution markers to
    // have a measurable interval.
    if peaks.maxima.is_empty() || peaks.minima.len() < 2 {
        return RpmEstimate::no_signal();
    }

    let first = peaks.minima[0];
    let last = peaks.minima[peaks.minima.len() - 1];
    let start = first.index.saturating_sub(RPM_EDGE_GUARD_SAMPLES);
    let end = (last.index + RPM_EDGE_GUARD_SAMPLES).min(t.len() - 1);
    let duration_s = t[end] - t[start];
    if duration_s <= 0.0 {
        return RpmEstimate::no_signal();
    }

    let revolutions = (peaks.minima.len() - 1) as f64;
    RpmEstimate::measured((revolutions / (duration_s / 60.0)).round() as u32)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::{RPM_PEAK_THRESHOLD_V, RPM_TRANSIENT_SKIP_SAMPLES, SAMPLE_RATE_HZ};

    /// Inductive-sensor stand-in: 5 V pulses of `width` samples every
    /// `period` samples over a 0 V baseline.
    fn pulse_train(total: usize, period: usize, width: usize) -> (Array1<f64>, Array1<f64>) {
        let time = Array1::from_iter((0..total).map(|i| i as f64 / SAMPLE_RATE_HZ));
        let sensor = Array1::from_iter((0..total).map(|i| {
            if i % period < width {
                5.0
            } else {
                0.0
            }
        }));
        (time, sensor)
    }

    #[test]
    fn thousand_rpm_pulse_train_is_recovered() {
        // 1000 RPM = 16.667 Hz = one pulse every 48 samples at 800 Hz.
        let (time, sensor) = pulse_train(24000, 48, 4);
        let estimate =
            estimate_shaft_rpm(&time, &sensor, RPM_TRANSIENT_SKIP_SAMPLES, RPM_PEAK_THRESHOLD_V);
        assert!(!estimate.no_signal);
        assert!(
            (estimate.rpm as i64 - 1000).abs() <= 1,
            "got {} RPM",
            estimate.rpm
        );
    }

    #[test]
    fn flat_trace_reports_no_signal() {
        let time = Array1::from_iter((0..16000).map(|i| i as f64 / SAMPLE_RATE_HZ));
        let sensor = Array1::from_elem(16000, 0.02);
        let estimate =
            estimate_shaft_rpm(&time, &sensor, RPM_TRANSIENT_SKIP_SAMPLES, RPM_PEAK_THRESHOLD_V);
        assert_eq!(estimate, RpmEstimate::no_signal());
    }

    #[test]
    fn trace_shorter_than_skip_reports_no_signal() {
        let (time, sensor) = pulse_train(4000, 48, 4);
        let estimate =
            estimate_shaft_rpm(&time, &sensor, RPM_TRANSIENT_SKIP_SAMPLES, RPM_PEAK_THRESHOLD_V);
        assert!(estimate.no_signal);
    }
}

// src/data_analysis/shaft_speed.rs
