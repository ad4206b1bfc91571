use crate::curve::DecayLaw;
use crate::error::{DecayError, Result};
use crate::rate::{DecayRate, Isotope};
use crate::sampler::{Population, generate_population};
use log::debug;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;

const WEIGHT_TOLERANCE: f64 = 1e-9;

/// One isotope of a mixed source together with its share of the particles.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MixtureComponent {
    pub label: String,
    pub half_life: f64,
    pub weight: f64,
}

impl MixtureComponent {
    pub fn new(label: impl Into<String>, half_life: f64, weight: f64) -> Self {
        Self {
            label: label.into(),
            half_life,
            weight,
        }
    }

    pub fn from_isotope(isotope: Isotope, weight: f64) -> Self {
        Self::new(isotope.symbol(), isotope.half_life(), weight)
    }

    pub fn rate(&self) -> Result<DecayRate> {
        DecayRate::from_half_life(self.half_life)
    }

    /// Particles assigned to this component out of `population_size`,
    /// truncated towards zero.
    pub fn share_of(&self, population_size: usize) -> usize {
        (self.weight * population_size as f64).floor() as usize
    }
}

/// How a mixed source is turned into a population.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MixtureMode {
    /// Each component decays at its own rate; the population is the union.
    Union,
    /// A single population decaying at λ_mix = Σ wᵢλᵢ.
    EffectiveRate,
}

impl fmt::Display for MixtureMode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            MixtureMode::Union => write!(f, "union"),
            MixtureMode::EffectiveRate => write!(f, "effective rate"),
        }
    }
}

/// Weights must each lie in (0, 1] and add up to one.
pub fn validate_weights(components: &[MixtureComponent]) -> Result<()> {
    if components.is_empty() {
        return Err(DecayError::invalid("mixture needs at least one component"));
    }
    for component in components {
        if !(component.weight > 0.0 && component.weight <= 1.0) {
            return Err(DecayError::invalid(format!(
                "weight of {} must be in (0, 1], got {}",
                component.label, component.weight
            )));
        }
        component.rate()?;
    }
    let total: f64 = components.iter().map(|c| c.weight).sum();
    if (total - 1.0).abs() > WEIGHT_TOLERANCE {
        return Err(DecayError::invalid(format!(
            "mixture weights must sum to 1, got {total}"
        )));
    }
    Ok(())
}

/// λ_mix = Σ wᵢλᵢ over validated components.
pub fn effective_rate(components: &[MixtureComponent]) -> Result<DecayRate> {
    validate_weights(components)?;
    let weighted = components
        .iter()
        .map(|c| Ok((c.weight, c.rate()?)))
        .collect::<Result<Vec<_>>>()?;
    DecayRate::effective(&weighted)
}

/// Unweighted mean of the component half-lives, the time scale of the
/// mixed observation grid.
pub fn mean_half_life(components: &[MixtureComponent]) -> f64 {
    if components.is_empty() {
        return f64::NAN;
    }
    components.iter().map(|c| c.half_life).sum::<f64>() / components.len() as f64
}

/// Sub-populations of a union mixture, one per component, in component order.
pub fn generate_components<R: Rng + ?Sized>(
    components: &[MixtureComponent],
    population_size: usize,
    rng: &mut R,
) -> Result<Vec<Population>> {
    validate_weights(components)?;
    components
        .iter()
        .map(|component| {
            let count = component.share_of(population_size);
            if count == 0 {
                return Err(DecayError::invalid(format!(
                    "component {} gets no particles out of {}",
                    component.label, population_size
                )));
            }
            debug!(
                "Drawing {} particles for component {} (T½={})",
                count, component.label, component.half_life
            );
            generate_population(component.rate()?, count, rng)
        })
        .collect()
}

/// Draw a mixed population in `mode` together with the decay law it should
/// follow.
pub fn generate_mixture<R: Rng + ?Sized>(
    components: &[MixtureComponent],
    population_size: usize,
    mode: MixtureMode,
    rng: &mut R,
) -> Result<(Population, DecayLaw)> {
    match mode {
        MixtureMode::Union => {
            let parts = generate_components(components, population_size, rng)?;
            union_of(components, &parts)
        }
        MixtureMode::EffectiveRate => {
            let rate = effective_rate(components)?;
            let population = generate_population(rate, population_size, rng)?;
            Ok((population, DecayLaw::single(population_size as f64, rate)))
        }
    }
}

/// Merge already drawn sub-populations into the union population and law.
pub fn union_of(
    components: &[MixtureComponent],
    parts: &[Population],
) -> Result<(Population, DecayLaw)> {
    if components.len() != parts.len() {
        return Err(DecayError::invalid(format!(
            "{} components but {} sub-populations",
            components.len(),
            parts.len()
        )));
    }
    let terms = components
        .iter()
        .zip(parts)
        .map(|(c, p)| Ok((p.len() as f64, c.rate()?)))
        .collect::<Result<Vec<_>>>()?;
    Ok((Population::merge(parts)?, DecayLaw::superposition(terms)?))
}

pub fn reference_components() -> Vec<MixtureComponent> {
    vec![
        MixtureComponent::from_isotope(Isotope::Carbon10, 0.8),
        MixtureComponent::from_isotope(Isotope::Neon19, 0.2),
    ]
}
