// src/data_analysis/peak_detection.rs

/// One confirmed extremum: sample index into the scanned slice plus the
/// (time, value) pair at that sample.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Peak {
    pub index: usize,
    pub time: f64,
    pub value: f64,
}

/// Local maxima and minima of one scan, each strictly increasing in time.
/// Merged by time the two sequences strictly alternate in type. Regenerated
/// per call, never persisted.
#[derive(Debug, Clone, Default)]
pub struct PeakSet {
    pub maxima: Vec<Peak>,
    pub minima: Vec<Peak>,
}

impl PeakSet {
    pub fn is_empty(&self) -> bool {
        self.maxima.is_empty() && self.minima.is_empty()
    }
}

/// Local-extremum detection with hysteresis ("peakdet").
///
/// Scans left to right keeping the running maximum and minimum since the
/// last confirmed extremum. While looking for a maximum, a drop of more
/// than `threshold` below the running maximum confirms that maximum and
/// flips the scan to looking for a minimum; the symmetric rise confirms a
/// minimum. The alternating mode suppresses sub-threshold wiggle.
///
/// `threshold` is absolute, in the same units as `values`, and must be
/// tuned to the sensor's peak-to-peak swing. A monotonic or near-flat
/// input yields an empty set; callers degrade to a fallback rather than
/// treat that as an error.
pub fn peakdet(time: &[f64], values: &[f64], threshold: f64) -> PeakSet {
    debug_assert_eq!(time.len(), values.len());
    debug_assert!(threshold > 0.0);

    let mut peaks = PeakSet::default();
    let mut running_max = f64::NEG_INFINITY;
    let mut running_min = f64::INFINITY;
    let mut max_pos = 0usize;
    let mut min_pos = 0usize;
    let mut look_for_max = true;

    for (i, &v) in values.iter().enumerate() {
        if v > running_max {
            running_max = v;
            max_pos = i;
        }
        if v < running_min {
            running_min = v;
            min_pos = i;
        }

        if look_for_max {
            if v < running_max - threshold {
                peaks.maxima.push(Peak {
                    index: max_pos,
                    time: time[max_pos],
                    value: running_max,
                });
                // Everything before this sample belonged to the confirmed
                // maximum; restart the minimum search here.
                running_min = v;
                min_pos = i;
                look_for_max = false;
            }
        } else if v > running_min + threshold {
            peaks.minima.push(Peak {
                index: min_pos,
                time: time[min_pos],
                value: running_min,
            });
            running_max = v;
            max_pos = i;
            look_for_max = true;
        }
    }

    peaks
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sampled<F: Fn(f64) -> f64>(f: F, rate_hz: f64, duration_s: f64) -> (Vec<f64>, Vec<f64>) {
        let n = (rate_hz * duration_s) as usize;
        let time: Vec<f64> = (0..n).map(|i| i as f64 / rate_hz).collect();
        let values: Vec<f64> = time.iter().map(|&t| f(t)).collect();
        (time, values)
    }

    #[test]
    fn flat_input_yields_no_peaks() {
        let time: Vec<f64> = (0..100).map(|i| i as f64).collect();
        let values = vec![1.0; 100];
        assert!(peakdet(&time, &values, 0.5).is_empty());
    }

    #[test]
    fn monotonic_input_yields_no_peaks() {
        let (time, values) = sampled(|t| t * 3.0, 100.0, 2.0);
        assert!(peakdet(&time, &values, 0.5).is_empty());
    }

    #[test]
    fn merged_extrema_strictly_alternate() {
        // Deterministic pseudo-noise on top of a slow carrier.
        let (time, values) = sampled(
            |t| (2.0 * std::f64::consts::PI * 3.0 * t).sin() + 0.2 * (37.0 * t).sin(),
            200.0,
            5.0,
        );
        let peaks = peakdet(&time, &values, 0.5);
        let mut merged: Vec<(f64, bool)> = peaks
            .maxima
            .iter()
            .map(|p| (p.time, true))
            .chain(peaks.minima.iter().map(|p| (p.time, false)))
            .collect();
        merged.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap());
        for pair in merged.windows(2) {
            assert_ne!(pair[0].1, pair[1].1, "two consecutive extrema of one type");
        }
    }

    #[test]
    fn extrema_times_are_strictly_increasing() {
        let (time, values) = sampled(|t| (2.0 * std::f64::consts::PI * 4.0 * t).sin(), 400.0, 3.0);
        let peaks = peakdet(&time, &values, 0.5);
        for seq in [&peaks.maxima, &peaks.minima] {
            for pair in seq.windows(2) {
                assert!(pair[0].time < pair[1].time);
            }
        }
    }

    #[test]
    fn sinusoid_minima_count_matches_frequency() {
        // f = 5 Hz over 4 s: floor(f * D) = 20 minima, +/-1 for edges.
        let (time, values) = sampled(|t| (2.0 * std::f64::consts::PI * 5.0 * t).sin(), 800.0, 4.0);
        let peaks = peakdet(&time, &values, 0.5);
        let expected = 20i64;
        assert!((peaks.minima.len() as i64 - expected).abs() <= 1);
    }
}

// src/data_analysis/peak_detection.rs
