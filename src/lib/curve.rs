use crate::error::{DecayError, Result};
use crate::grid::ObservationGrid;
use crate::rate::DecayRate;
use crate::sampler::Population;
use crate::stats::{ResidualSummary, absolute_residuals};
use serde::Serialize;

/// Closed-form decay law, a sum of independent exponential terms.
///
/// Each term holds an initial particle count and its rate, so a pure isotope
/// is a single term N0·e^(−λt) and a union of isotopes is Σ nᵢ·e^(−λᵢt).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DecayLaw {
    terms: Vec<(f64, DecayRate)>,
}

impl DecayLaw {
    pub fn single(initial: f64, rate: DecayRate) -> Self {
        Self {
            terms: vec![(initial, rate)],
        }
    }

    pub fn superposition(terms: Vec<(f64, DecayRate)>) -> Result<Self> {
        if terms.is_empty() {
            return Err(DecayError::invalid("decay law needs at least one term"));
        }
        if let Some((n, _)) = terms.iter().find(|(n, _)| !n.is_finite() || *n < 0.0) {
            return Err(DecayError::invalid(format!(
                "initial counts must be non-negative, got {n}"
            )));
        }
        Ok(Self { terms })
    }

    pub fn initial(&self) -> f64 {
        self.terms.iter().map(|(n, _)| n).sum()
    }

    /// Expected undecayed count at `t`.
    pub fn undecayed_at(&self, t: f64) -> f64 {
        self.terms
            .iter()
            .map(|(n, rate)| n * rate.surviving_fraction(t))
            .sum()
    }

    /// Expected decayed count at `t`.
    pub fn decayed_at(&self, t: f64) -> f64 {
        self.terms
            .iter()
            .map(|(n, rate)| n * rate.decayed_fraction(t))
            .sum()
    }
}

/// Simulated and theoretical counts over an observation grid.
///
/// All vectors are aligned with `times`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DecayCurve {
    pub label: String,
    pub times: Vec<f64>,
    pub decayed: Vec<usize>,
    pub undecayed: Vec<usize>,
    pub expected_decayed: Vec<f64>,
    pub expected_undecayed: Vec<f64>,
    pub decayed_residuals: Vec<f64>,
    pub undecayed_residuals: Vec<f64>,
}

impl DecayCurve {
    pub fn compare(
        label: impl Into<String>,
        population: &Population,
        grid: &ObservationGrid,
        law: &DecayLaw,
    ) -> Self {
        let (decayed, undecayed) = population.counts_over(grid);
        let times = grid.times().to_vec();
        let expected_decayed: Vec<f64> = times.iter().map(|&t| law.decayed_at(t)).collect();
        let expected_undecayed: Vec<f64> = times.iter().map(|&t| law.undecayed_at(t)).collect();
        let decayed_residuals = absolute_residuals(&decayed, &expected_decayed);
        let undecayed_residuals = absolute_residuals(&undecayed, &expected_undecayed);
        Self {
            label: label.into(),
            times,
            decayed,
            undecayed,
            expected_decayed,
            expected_undecayed,
            decayed_residuals,
            undecayed_residuals,
        }
    }

    pub fn len(&self) -> usize {
        self.times.len()
    }

    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    pub fn decayed_summary(&self) -> Option<ResidualSummary> {
        ResidualSummary::from_residuals(&self.decayed_residuals)
    }

    pub fn undecayed_summary(&self) -> Option<ResidualSummary> {
        ResidualSummary::from_residuals(&self.undecayed_residuals)
    }
}
