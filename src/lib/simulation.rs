use crate::config::{DecayConfig, MixtureConfig};
use crate::curve::{DecayCurve, DecayLaw};
use crate::grid::ObservationGrid;
use crate::mixture::{MixtureMode, effective_rate, generate_components, generate_mixture, union_of};
use crate::rate::DecayRate;
use crate::sampler::generate_population;
use crate::stats::ResidualSummary;
use anyhow::{Context, Result};
use log::{debug, info};
use rand::Rng;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DecayReport {
    /// Rate of the single exponential law behind the curve; `None` for a
    /// union of isotopes, which no single rate describes.
    pub rate: Option<DecayRate>,
    pub curve: DecayCurve,
    pub decayed_summary: ResidualSummary,
    pub undecayed_summary: ResidualSummary,
}

impl DecayReport {
    fn from_curve(rate: Option<DecayRate>, curve: DecayCurve) -> Result<Self> {
        let decayed_summary = curve
            .decayed_summary()
            .context("Decay curve has no grid points")?;
        let undecayed_summary = curve
            .undecayed_summary()
            .context("Decay curve has no grid points")?;
        info!(
            "{}: residual mean {:.3}, std dev {:.3}",
            curve.label, decayed_summary.mean, decayed_summary.std_dev
        );
        Ok(Self {
            rate,
            curve,
            decayed_summary,
            undecayed_summary,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MixtureReport {
    pub effective_rate: DecayRate,
    /// One report per component, each on its own half-life grid.
    pub components: Vec<DecayReport>,
    /// The component populations taken together, each decaying at its own rate.
    pub union: DecayReport,
    /// A separate population of N0 decaying at the effective rate.
    pub effective: DecayReport,
}

/// Simulate one isotope and compare it with N0·e^(−λt).
pub fn simulate_decay<R: Rng + ?Sized>(config: &DecayConfig, rng: &mut R) -> Result<DecayReport> {
    config.validate().context("Invalid decay configuration")?;
    let rate = DecayRate::from_half_life(config.half_life)?;
    info!(
        "Simulating decay of {} nuclei with {}",
        config.population_size, rate
    );

    let population = generate_population(rate, config.population_size, rng)?;
    let grid = ObservationGrid::over_half_lives(rate, config.n_half_lives, config.grid_points)?;
    let law = DecayLaw::single(config.population_size as f64, rate);
    let curve = DecayCurve::compare(format!("T½={}", config.half_life), &population, &grid, &law);
    DecayReport::from_curve(Some(rate), curve)
}

/// Simulate every component of a mixture on its own, then the mixture as a
/// whole in both modes: the union of the components and a population at the
/// effective rate.
pub fn simulate_mixture<R: Rng + ?Sized>(config: &MixtureConfig, rng: &mut R) -> Result<MixtureReport> {
    config.validate().context("Invalid mixture configuration")?;
    let mixed_rate = effective_rate(&config.components)?;
    let mixed_half_life = config.mixed_half_life();
    info!(
        "Simulating {} component mixture of {} nuclei, effective {}, mixed grid T½={:.4}",
        config.components.len(),
        config.population_size,
        mixed_rate,
        mixed_half_life
    );

    let parts = generate_components(&config.components, config.population_size, rng)
        .context("Could not draw mixture components")?;

    let mut components = Vec::with_capacity(parts.len());
    for (component, population) in config.components.iter().zip(&parts) {
        let rate = component.rate()?;
        let grid = ObservationGrid::over_half_lives(rate, config.n_half_lives, config.grid_points)?;
        let law = DecayLaw::single(population.len() as f64, rate);
        let curve = DecayCurve::compare(component.label.as_str(), population, &grid, &law);
        components.push(DecayReport::from_curve(Some(rate), curve)?);
    }

    let grid = ObservationGrid::linspace(
        0.0,
        config.n_half_lives * mixed_half_life,
        config.grid_points,
    )?;

    let (population, law) = union_of(&config.components, &parts)?;
    debug!("Union population of {}", population.len());
    let curve = DecayCurve::compare(format!("mix ({})", MixtureMode::Union), &population, &grid, &law);
    let union = DecayReport::from_curve(None, curve)?;

    let (population, law) = generate_mixture(
        &config.components,
        config.population_size,
        MixtureMode::EffectiveRate,
        rng,
    )?;
    let curve = DecayCurve::compare(
        format!("mix ({})", MixtureMode::EffectiveRate),
        &population,
        &grid,
        &law,
    );
    let effective = DecayReport::from_curve(Some(mixed_rate), curve)?;

    Ok(MixtureReport {
        effective_rate: mixed_rate,
        components,
        union,
        effective,
    })
}
