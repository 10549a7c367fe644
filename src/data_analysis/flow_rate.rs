// src/data_analysis/flow_rate.rs

use ndarray::ArrayView1;
use ndarray_stats::QuantileExt;

use crate::error::ReductionError;

/// Flow-rate reduction of one windowed wave-probe record.
///
/// Three independent estimates of the same physical quantity ride together:
/// the fitted-line rate, the mean of the per-second rates, and the secant
/// slope of the raw windowed signal. `discrepancy_pct` is the consistency
/// check between the last two; `insufficient_data` marks a window too short
/// for any whole 1 s sub-interval, in which case `interval_mean` and
/// `discrepancy_pct` are absent instead of NaN.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FlowRateEstimate {
    pub instantaneous_kg_s: f64,
    pub interval_mean_kg_s: Option<f64>,
    pub overall_kg_s: f64,
    pub discrepancy_pct: Option<f64>,
    pub insufficient_data: bool,
}

/// First-degree least-squares fit `y = slope * x + intercept`.
pub fn linear_fit(x: ArrayView1<f64>, y: ArrayView1<f64>) -> Option<(f64, f64)> {
    let n = x.len();
    if n < 2 || y.len() != n {
        return None;
    }
    let nf = n as f64;
    let mean_x = x.sum() / nf;
    let mean_y = y.sum() / nf;
    let mut sxx = 0.0;
    let mut sxy = 0.0;
    for (&xi, &yi) in x.iter().zip(y.iter()) {
        let dx = xi - mean_x;
        sxx += dx * dx;
        sxy += dx * (yi - mean_y);
    }
    if sxx == 0.0 {
        return None;
    }
    let slope = sxy / sxx;
    Some((slope, mean_y - slope * mean_x))
}

/// Mass delta of the fitted line over the 1 s interval starting at `t0`,
/// with each endpoint independently absolute-valued. Not equivalent to
/// `|slope|` when the model crosses zero inside the interval; the
/// endpoint-absolute form is the rig's accepted definition and is kept
/// exactly.
fn model_rate_over_second(slope: f64, intercept: f64, t0: f64) -> f64 {
    (slope * (t0 + 1.0) + intercept).abs() - (slope * t0 + intercept).abs()
}

/// Reduces a windowed (time, calibrated mass) record to a `FlowRateEstimate`.
///
/// The caller applies calibration and the run's windowing policy first;
/// this function sees only the analysis window.
pub fn estimate_flow_rate(
    time: ArrayView1<f64>,
    mass_kg: ArrayView1<f64>,
) -> Result<FlowRateEstimate, ReductionError> {
    let (slope, intercept) = linear_fit(time.view(), mass_kg.view())
        .ok_or(ReductionError::WindowTooShort { samples: time.len() })?;

    // Fitted-line rate over the first model second.
    let instantaneous_kg_s = model_rate_over_second(slope, intercept, 0.0);

    // Per-second rates at every whole-second boundary inside the window.
    let t_first = time[0];
    let t_last = time[time.len() - 1];
    let mut interval_rates: Vec<f64> = Vec::new();
    let mut boundary = t_first.ceil();
    while boundary + 1.0 <= t_last {
        interval_rates.push(model_rate_over_second(slope, intercept, boundary));
        boundary += 1.0;
    }
    let insufficient_data = interval_rates.is_empty();
    let interval_mean_kg_s = if insufficient_data {
        None
    } else {
        Some(interval_rates.iter().sum::<f64>() / interval_rates.len() as f64)
    };

    // Secant-slope estimate over the raw windowed signal, ignoring the fit.
    let mass_min = *mass_kg
        .min()
        .map_err(|_| ReductionError::WindowTooShort {
            samples: mass_kg.len(),
        })?;
    let mass_max = *mass_kg
        .max()
        .map_err(|_| ReductionError::WindowTooShort {
            samples: mass_kg.len(),
        })?;
    let overall_kg_s = (mass_max - mass_min) / (t_last - t_first);

    // Fractional deviation of the two independent derivations from unity.
    let discrepancy_pct = match interval_mean_kg_s {
        Some(interval_mean) if overall_kg_s.abs() > f64::EPSILON => {
            let ratio = interval_mean / overall_kg_s;
            let deviation = if ratio > 1.0 { ratio - 1.0 } else { 1.0 - ratio };
            Some(deviation * 100.0)
        }
        _ => None,
    };

    Ok(FlowRateEstimate {
        instantaneous_kg_s,
        interval_mean_kg_s,
        overall_kg_s,
        discrepancy_pct,
        insufficient_data,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array1;

    fn linear_mass(slope: f64, intercept: f64, duration_s: f64) -> (Array1<f64>, Array1<f64>) {
        let n = (duration_s * 800.0) as usize;
        let time = Array1::from_iter((0..n).map(|i| i as f64 / 800.0));
        let mass = time.mapv(|t| slope * t + intercept);
        (time, mass)
    }

    #[test]
    fn perfect_linear_series_recovers_slope_everywhere() {
        let (time, mass) = linear_mass(2.5, 10.0, 20.0);
        let estimate = estimate_flow_rate(time.view(), mass.view()).unwrap();
        assert!((estimate.instantaneous_kg_s - 2.5).abs() < 1e-9);
        assert!((estimate.overall_kg_s - 2.5).abs() < 1e-9);
        assert!((estimate.interval_mean_kg_s.unwrap() - 2.5).abs() < 1e-9);
        assert!(estimate.discrepancy_pct.unwrap() < 1e-6);
        assert!(!estimate.insufficient_data);
    }

    #[test]
    fn endpoint_absolute_formula_is_not_plain_slope() {
        // Model crosses zero inside the first second: |s + i| - |i| differs
        // from |s|.
        let rate = model_rate_over_second(2.0, -1.0, 0.0);
        assert!((rate - 0.0).abs() < 1e-12);
    }

    #[test]
    fn interval_rates_are_alignment_invariant_on_linear_input() {
        let (slope, intercept) = (1.75, 4.0);
        for offset in [0.0, 0.3, 0.77] {
            let a = model_rate_over_second(slope, intercept, 3.0 + offset);
            let b = model_rate_over_second(slope, intercept, 9.0 + offset);
            assert!((a - b).abs() < 1e-12);
        }
    }

    #[test]
    fn sub_second_window_flags_insufficient_data() {
        let (time, mass) = linear_mass(2.5, 0.0, 0.5);
        let estimate = estimate_flow_rate(time.view(), mass.view()).unwrap();
        assert!(estimate.insufficient_data);
        assert_eq!(estimate.interval_mean_kg_s, None);
        assert_eq!(estimate.discrepancy_pct, None);
    }

    #[test]
    fn single_sample_window_is_a_configuration_error() {
        let time = Array1::from(vec![0.0]);
        let mass = Array1::from(vec![1.0]);
        assert!(matches!(
            estimate_flow_rate(time.view(), mass.view()),
            Err(ReductionError::WindowTooShort { samples: 1 })
        ));
    }
}

// src/data_analysis/flow_rate.rs
