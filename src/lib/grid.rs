use crate::error::{DecayError, Result};
use crate::rate::DecayRate;
use serde::Serialize;

/// Ascending time points at which a population is observed.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ObservationGrid {
    times: Vec<f64>,
}

impl ObservationGrid {
    pub fn new(times: Vec<f64>) -> Result<Self> {
        if times.is_empty() {
            return Err(DecayError::invalid("observation grid must not be empty"));
        }
        if let Some(bad) = times.iter().find(|t| !t.is_finite() || **t < 0.0) {
            return Err(DecayError::invalid(format!(
                "observation times must be finite and non-negative, got {bad}"
            )));
        }
        if times.windows(2).any(|w| w[1] < w[0]) {
            return Err(DecayError::invalid("observation times must be non-decreasing"));
        }
        Ok(Self { times })
    }

    /// `points` evenly spaced times from `start` to `end`, both included.
    pub fn linspace(start: f64, end: f64, points: usize) -> Result<Self> {
        if points == 0 {
            return Err(DecayError::invalid("grid needs at least one point"));
        }
        if !start.is_finite() || !end.is_finite() || start < 0.0 || end < start {
            return Err(DecayError::invalid(format!(
                "grid bounds must satisfy 0 <= start <= end, got [{start}, {end}]"
            )));
        }
        if points == 1 {
            return Ok(Self { times: vec![start] });
        }
        let step = (end - start) / (points - 1) as f64;
        let mut times: Vec<f64> = (0..points).map(|i| start + i as f64 * step).collect();
        times[points - 1] = end;
        Ok(Self { times })
    }

    /// Grid from 0 to `n_half_lives` half-lives of `rate`.
    pub fn over_half_lives(rate: DecayRate, n_half_lives: f64, points: usize) -> Result<Self> {
        if !n_half_lives.is_finite() || n_half_lives <= 0.0 {
            return Err(DecayError::invalid(format!(
                "number of half-lives must be positive, got {n_half_lives}"
            )));
        }
        Self::linspace(0.0, n_half_lives * rate.half_life(), points)
    }

    pub fn times(&self) -> &[f64] {
        &self.times
    }

    pub fn len(&self) -> usize {
        self.times.len()
    }

    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    pub fn end(&self) -> f64 {
        self.times[self.times.len() - 1]
    }
}
