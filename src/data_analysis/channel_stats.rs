// src/data_analysis/channel_stats.rs

use ndarray::ArrayView1;

/// Sample statistics of one channel restricted to the analysis window.
/// `std_err` uses n = number of samples in the window; this is the
/// within-run path, distinct from the one-row-per-run statistics in the
/// aggregation layer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChannelStats {
    pub mean: f64,
    pub std_dev: f64,
    pub std_err: f64,
}

/// Mean, sample standard deviation (n - 1 denominator) and standard error
/// of the windowed samples. Returns `None` for an empty window.
pub fn windowed_stats(samples: ArrayView1<f64>) -> Option<ChannelStats> {
    let n = samples.len();
    if n == 0 {
        return None;
    }
    let nf = n as f64;
    let mean = samples.sum() / nf;
    let std_dev = if n > 1 {
        let sum_sq: f64 = samples.iter().map(|&v| (v - mean) * (v - mean)).sum();
        (sum_sq / (nf - 1.0)).sqrt()
    } else {
        0.0
    };
    Some(ChannelStats {
        mean,
        std_dev,
        std_err: std_dev / nf.sqrt(),
    })
}


// src/data_analysis/channel_stats.rs
