//! Run parameters for the decay experiments.
//!
//! Every record deserializes from a partial document; missing fields fall
//! back to the reference experiment (1000 nuclei of C-10 observed over ten
//! half-lives, mixed 80/20 with Ne-19).

use crate::error::{DecayError, Result};
use crate::mixture::{MixtureComponent, mean_half_life, reference_components, validate_weights};
use crate::rate::{DecayRate, Isotope};
use serde::{Deserialize, Serialize};

fn check_population(population_size: usize) -> Result<()> {
    if population_size == 0 {
        return Err(DecayError::invalid("population size must be positive"));
    }
    Ok(())
}

fn check_grid(n_half_lives: f64, grid_points: usize) -> Result<()> {
    if !n_half_lives.is_finite() || n_half_lives <= 0.0 {
        return Err(DecayError::invalid(format!(
            "number of half-lives must be positive, got {n_half_lives}"
        )));
    }
    if grid_points == 0 {
        return Err(DecayError::invalid("grid needs at least one point"));
    }
    Ok(())
}

/// Single-isotope decay simulation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DecayConfig {
    pub population_size: usize,
    pub half_life: f64,
    pub n_half_lives: f64,
    pub grid_points: usize,
}

impl Default for DecayConfig {
    fn default() -> Self {
        Self {
            population_size: 1000,
            half_life: Isotope::Carbon10.half_life(),
            n_half_lives: 10.0,
            grid_points: 100,
        }
    }
}

impl DecayConfig {
    pub fn validate(&self) -> Result<()> {
        check_population(self.population_size)?;
        DecayRate::from_half_life(self.half_life)?;
        check_grid(self.n_half_lives, self.grid_points)
    }
}

/// Mixed-source decay simulation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MixtureConfig {
    pub population_size: usize,
    pub components: Vec<MixtureComponent>,
    pub n_half_lives: f64,
    pub grid_points: usize,
    /// Half-life setting the span of the mixed curves; the mean of the
    /// component half-lives when absent.
    pub mixed_half_life: Option<f64>,
}

impl Default for MixtureConfig {
    fn default() -> Self {
        Self {
            population_size: 1000,
            components: reference_components(),
            n_half_lives: 10.0,
            grid_points: 100,
            mixed_half_life: None,
        }
    }
}

impl MixtureConfig {
    pub fn validate(&self) -> Result<()> {
        check_population(self.population_size)?;
        validate_weights(&self.components)?;
        if let Some(half_life) = self.mixed_half_life {
            DecayRate::from_half_life(half_life)?;
        }
        check_grid(self.n_half_lives, self.grid_points)
    }

    pub fn mixed_half_life(&self) -> f64 {
        self.mixed_half_life
            .unwrap_or_else(|| mean_half_life(&self.components))
    }
}

/// Neyman–Pearson test of a pure isotope against a mixture.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HypothesisConfig {
    pub sample_count: usize,
    pub alpha: f64,
    /// Length of the counting window; Poisson means are exposure_scale·λ.
    pub exposure_scale: f64,
    pub null_label: String,
    pub null_half_life: f64,
    pub alternative_label: String,
    pub alternative: Vec<MixtureComponent>,
}

impl Default for HypothesisConfig {
    fn default() -> Self {
        Self {
            sample_count: 1000,
            alpha: 0.05,
            exposure_scale: 1000.0,
            null_label: Isotope::Carbon10.symbol().to_string(),
            null_half_life: Isotope::Carbon10.half_life(),
            alternative_label: "mix".to_string(),
            alternative: reference_components(),
        }
    }
}

impl HypothesisConfig {
    pub fn validate(&self) -> Result<()> {
        if self.sample_count == 0 {
            return Err(DecayError::invalid("sample count must be positive"));
        }
        if !(self.alpha > 0.0 && self.alpha < 1.0) {
            return Err(DecayError::invalid(format!(
                "alpha must lie in (0, 1), got {}",
                self.alpha
            )));
        }
        if !self.exposure_scale.is_finite() || self.exposure_scale <= 0.0 {
            return Err(DecayError::invalid(format!(
                "exposure scale must be positive, got {}",
                self.exposure_scale
            )));
        }
        DecayRate::from_half_life(self.null_half_life)?;
        validate_weights(&self.alternative)
    }
}
