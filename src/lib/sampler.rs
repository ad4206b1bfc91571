use crate::error::{DecayError, Result};
use crate::grid::ObservationGrid;
use crate::rate::DecayRate;
use itertools::Itertools;
use log::debug;
use ordered_float::OrderedFloat;
use rand::Rng;
use rand::distr::{Distribution, Open01};
use serde::Serialize;

/// Draw a single decay time from the exponential law with rate λ.
///
/// Inverse transform sampling: with z uniform in the open interval (0, 1)
/// the CDF F(x) = 1 − e^(−λx) inverts to x = −ln(1 − z)/λ, which is finite
/// and strictly positive. No particle has decayed at t = 0.
pub fn draw_lifetime<R: Rng + ?Sized>(rate: DecayRate, rng: &mut R) -> f64 {
    let z: f64 = Open01.sample(rng);
    lifetime_at(z, rate)
}

/// Inverse exponential CDF at `z`; never returns −0.0.
fn lifetime_at(z: f64, rate: DecayRate) -> f64 {
    -(-z).ln_1p() / rate.value()
}

/// Draw `count` lifetimes and return them as a sorted population.
pub fn generate_population<R: Rng + ?Sized>(
    rate: DecayRate,
    count: usize,
    rng: &mut R,
) -> Result<Population> {
    Population::generate(rate, count, rng)
}

/// Number of particles in `population` that have decayed by time `t`.
pub fn count_decayed_at(population: &Population, t: f64) -> usize {
    population.count_decayed_at(t)
}

/// Decayed and undecayed counts of a population at one point in time.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DecayCount {
    pub time: f64,
    pub decayed: usize,
    pub undecayed: usize,
}

/// Ascending-sorted decay times of a fixed set of particles.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Population {
    lifetimes: Vec<f64>,
}

impl Population {
    pub fn generate<R: Rng + ?Sized>(rate: DecayRate, count: usize, rng: &mut R) -> Result<Self> {
        if count == 0 {
            return Err(DecayError::invalid("population size must be positive"));
        }
        let mut lifetimes: Vec<f64> = (0..count).map(|_| draw_lifetime(rate, rng)).collect();
        lifetimes.sort_unstable_by_key(|&x| OrderedFloat(x));
        debug!(
            "Generated population of {} with {}, last decay at {:.3}",
            count,
            rate,
            lifetimes[count - 1]
        );
        Ok(Self { lifetimes })
    }

    /// Build a population from externally obtained decay times.
    pub fn from_lifetimes(mut lifetimes: Vec<f64>) -> Result<Self> {
        if lifetimes.is_empty() {
            return Err(DecayError::invalid("population size must be positive"));
        }
        if let Some(bad) = lifetimes.iter().find(|x| !x.is_finite() || **x < 0.0) {
            return Err(DecayError::invalid(format!(
                "lifetimes must be finite and non-negative, got {bad}"
            )));
        }
        lifetimes.sort_unstable_by_key(|&x| OrderedFloat(x));
        Ok(Self { lifetimes })
    }

    /// Union of independently generated sub-populations, still sorted.
    pub fn merge(parts: &[Population]) -> Result<Self> {
        if parts.is_empty() {
            return Err(DecayError::invalid("cannot merge zero populations"));
        }
        let lifetimes = parts
            .iter()
            .map(|p| p.lifetimes.iter().copied())
            .kmerge_by(|a, b| a < b)
            .collect();
        Ok(Self { lifetimes })
    }

    pub fn len(&self) -> usize {
        self.lifetimes.len()
    }

    /// Always false; populations are never empty.
    pub fn is_empty(&self) -> bool {
        self.lifetimes.is_empty()
    }

    pub fn lifetimes(&self) -> &[f64] {
        &self.lifetimes
    }

    pub fn first_decay(&self) -> f64 {
        self.lifetimes[0]
    }

    pub fn last_decay(&self) -> f64 {
        self.lifetimes[self.lifetimes.len() - 1]
    }

    /// Count of lifetimes ≤ `t`.
    ///
    /// A time before the first decay yields 0 rather than an error: nothing
    /// has decayed yet.
    pub fn count_decayed_at(&self, t: f64) -> usize {
        self.lifetimes.partition_point(|&x| x <= t)
    }

    pub fn count_undecayed_at(&self, t: f64) -> usize {
        self.len() - self.count_decayed_at(t)
    }

    pub fn decay_count(&self, t: f64) -> DecayCount {
        let decayed = self.count_decayed_at(t);
        DecayCount {
            time: t,
            decayed,
            undecayed: self.len() - decayed,
        }
    }

    /// Decayed and undecayed sequences aligned with `grid`.
    pub fn counts_over(&self, grid: &ObservationGrid) -> (Vec<usize>, Vec<usize>) {
        grid.times()
            .iter()
            .map(|&t| {
                let count = self.decay_count(t);
                (count.decayed, count.undecayed)
            })
            .unzip()
    }

    /// Empirical mean lifetime of the population.
    pub fn mean_lifetime(&self) -> f64 {
        self.lifetimes.iter().sum::<f64>() / self.len() as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::random::create_rng;
    use crate::rate::Isotope;
    use std::f64::consts::LN_2;

    #[test]
    fn test_draw_lifetime_non_negative() {
        let mut rng = create_rng(7);
        let rate = DecayRate::new(2.5).unwrap();
        for _ in 0..10_000 {
            let x = draw_lifetime(rate, &mut rng);
            assert!(x.is_finite() && x >= 0.0, "bad lifetime {x}");
        }
    }

    struct ZeroRng;

    impl rand::RngCore for ZeroRng {
        fn next_u32(&mut self) -> u32 {
            0
        }

        fn next_u64(&mut self) -> u64 {
            0
        }

        fn fill_bytes(&mut self, dest: &mut [u8]) {
            dest.fill(0);
        }
    }

    #[test]
    fn test_lifetime_at_zero() {
        let rate = DecayRate::new(2.5).unwrap();
        let x = lifetime_at(0.0, rate);
        assert_eq!(x, 0.0);
        assert!(x.is_sign_positive());
        assert!(lifetime_at(1e-300, rate) >= 0.0);
        assert!((lifetime_at(0.5, rate) - LN_2 / 2.5).abs() < 1e-12);
    }

    #[test]
    fn test_lowest_draw_is_after_zero() {
        let rate = Isotope::Carbon10.rate();
        let x = draw_lifetime(rate, &mut ZeroRng);
        assert!(x > 0.0, "lifetime {x}");
        let population = generate_population(rate, 10, &mut ZeroRng).unwrap();
        assert_eq!(count_decayed_at(&population, 0.0), 0);
        assert_eq!(count_decayed_at(&population, -0.0), 0);
    }

    #[test]
    fn test_draw_lifetime_mean() {
        let mut rng = create_rng(42);
        for rate in [0.05, 1.0, 20.0] {
            let rate = DecayRate::new(rate).unwrap();
            let population = generate_population(rate, 200_000, &mut rng).unwrap();
            let mean = population.mean_lifetime();
            let expected = rate.mean_lifetime();
            // std error of the mean is (1/λ)/√n ≈ 0.0022/λ
            assert!(
                (mean - expected).abs() < 0.02 * expected,
                "mean {mean}, expected {expected}"
            );
        }
    }

    #[test]
    fn test_population_is_sorted() {
        let mut rng = create_rng(3);
        let population = generate_population(Isotope::Carbon10.rate(), 1000, &mut rng).unwrap();
        assert_eq!(population.len(), 1000);
        assert!(population.lifetimes().windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn test_zero_population_rejected() {
        let mut rng = create_rng(3);
        let err = generate_population(Isotope::Carbon10.rate(), 0, &mut rng).unwrap_err();
        assert!(matches!(err, DecayError::InvalidParameter(_)));
    }

    #[test]
    fn test_count_decayed_at() {
        let population = Population::from_lifetimes(vec![3.0, 1.0, 2.0, 2.0, 5.0]).unwrap();
        assert_eq!(population.count_decayed_at(0.0), 0);
        assert_eq!(population.count_decayed_at(0.999), 0);
        assert_eq!(population.count_decayed_at(1.0), 1);
        assert_eq!(population.count_decayed_at(2.0), 3);
        assert_eq!(population.count_decayed_at(4.9), 4);
        assert_eq!(population.count_decayed_at(5.0), 5);
        assert_eq!(population.count_decayed_at(f64::INFINITY), 5);
        assert_eq!(population.count_undecayed_at(2.5), 2);
    }

    #[test]
    fn test_count_at_last_decay_is_full() {
        let mut rng = create_rng(11);
        let population = generate_population(Isotope::Neon19.rate(), 500, &mut rng).unwrap();
        assert_eq!(count_decayed_at(&population, population.last_decay()), 500);
        assert_eq!(population.count_undecayed_at(population.last_decay()), 0);
    }

    #[test]
    fn test_half_life_count() {
        let rate = DecayRate::from_half_life(19.3009).unwrap();
        // √(N0·0.25) ≈ 15.8, allow five standard deviations
        for seed in 0..20 {
            let mut rng = create_rng(seed);
            let population = generate_population(rate, 1000, &mut rng).unwrap();
            let decayed = population.count_decayed_at(19.3009) as f64;
            assert!((decayed - 500.0).abs() < 80.0, "seed {seed}: {decayed}");
        }
    }

    #[test]
    fn test_from_lifetimes_rejects_bad_values() {
        assert!(Population::from_lifetimes(vec![]).is_err());
        assert!(Population::from_lifetimes(vec![1.0, -0.5]).is_err());
        assert!(Population::from_lifetimes(vec![f64::NAN]).is_err());
    }

    #[test]
    fn test_merge_keeps_order() {
        let a = Population::from_lifetimes(vec![1.0, 4.0, 6.0]).unwrap();
        let b = Population::from_lifetimes(vec![2.0, 3.0, 7.0, 8.0]).unwrap();
        let merged = Population::merge(&[a, b]).unwrap();
        assert_eq!(merged.lifetimes(), &[1.0, 2.0, 3.0, 4.0, 6.0, 7.0, 8.0]);
        assert!(Population::merge(&[]).is_err());
    }

    #[test]
    fn test_counts_over_grid() {
        let population = Population::from_lifetimes(vec![0.5, 1.5, 2.5, 3.5]).unwrap();
        let grid = ObservationGrid::linspace(0.0, 4.0, 5).unwrap();
        let (decayed, undecayed) = population.counts_over(&grid);
        assert_eq!(decayed, vec![0, 1, 2, 3, 4]);
        assert_eq!(undecayed, vec![4, 3, 2, 1, 0]);
    }
}
