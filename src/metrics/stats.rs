use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct DistributionStats {
    pub count: usize,
    pub mean: f64,
    pub median: f64,
    pub min: f64,
    pub max: f64,
    /// Population standard deviation (divides by N).
    pub std_dev: f64,
    /// Nearest rank: the sorted value at index `floor(0.95 * N)`.
    pub percentile_95: f64,
}

/// Summary statistics; all zeros for empty input.
pub fn distribution(values: &[f64]) -> DistributionStats {
    if values.is_empty() {
        return DistributionStats::default();
    }
    let n = values.len();
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));

    let mean = sorted.iter().sum::<f64>() / n as f64;
    let median = if n % 2 == 0 {
        (sorted[n / 2 - 1] + sorted[n / 2]) / 2.0
    } else {
        sorted[n / 2]
    };
    let variance = sorted.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n as f64;
    let p95_idx = ((0.95 * n as f64).floor() as usize).min(n - 1);

    DistributionStats {
        count: n,
        mean,
        median,
        min: sorted[0],
        max: sorted[n - 1],
        std_dev: variance.sqrt(),
        percentile_95: sorted[p95_idx],
    }
}
