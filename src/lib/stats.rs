use itertools::Itertools;
use serde::Serialize;
use statrs::statistics::Statistics;

/// Mean and spread of a residual sequence.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ResidualSummary {
    pub mean: f64,
    /// Population standard deviation (divides by n).
    pub std_dev: f64,
}

impl ResidualSummary {
    /// Summarise `residuals`; `None` when there is nothing to summarise.
    pub fn from_residuals(residuals: &[f64]) -> Option<Self> {
        if residuals.is_empty() {
            return None;
        }
        Some(Self {
            mean: residuals.iter().mean(),
            std_dev: residuals.iter().population_std_dev(),
        })
    }
}

/// Pointwise |simulated − expected|.
pub fn absolute_residuals(simulated: &[usize], expected: &[f64]) -> Vec<f64> {
    simulated
        .iter()
        .zip(expected)
        .map(|(&s, &e)| (s as f64 - e).abs())
        .collect()
}

/// Occurrences of each distinct value in a sorted count sample, i.e. a
/// histogram with unit-width bins.
pub fn count_frequencies(sorted_samples: &[u64]) -> Vec<(u64, usize)> {
    sorted_samples
        .iter()
        .dedup_with_count()
        .map(|(n, &value)| (value, n))
        .collect()
}
