use crate::config::HypothesisConfig;
use crate::error::{DecayError, Result};
use crate::mixture::effective_rate;
use crate::rate::DecayRate;
use anyhow::Context;
use log::{debug, info, warn};
use rand::Rng;
use rand_distr::{Distribution, Poisson};
use serde::Serialize;
use statrs::function::gamma::ln_gamma;
use std::f64::consts::LN_10;

/// A candidate source of decay counts: Poisson with the given mean.
///
/// The mean is positive and finite; the only way in is through the
/// checked constructors.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HypothesisModel {
    label: String,
    rate_parameter: f64,
}

impl HypothesisModel {
    pub fn new(label: impl Into<String>, rate_parameter: f64) -> Result<Self> {
        check_rate(rate_parameter)?;
        Ok(Self {
            label: label.into(),
            rate_parameter,
        })
    }

    /// Expected number of decays in an exposure window of `exposure_scale`
    /// time units, exposure_scale·λ.
    pub fn from_decay_rate(
        label: impl Into<String>,
        rate: DecayRate,
        exposure_scale: f64,
    ) -> Result<Self> {
        if !exposure_scale.is_finite() || exposure_scale <= 0.0 {
            return Err(DecayError::invalid(format!(
                "exposure scale must be positive, got {exposure_scale}"
            )));
        }
        Self::new(label, exposure_scale * rate.value())
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn rate_parameter(&self) -> f64 {
        self.rate_parameter
    }

    pub fn ln_pmf(&self, k: u64) -> f64 {
        ln_pmf_unchecked(k, self.rate_parameter)
    }

    pub fn pmf(&self, k: u64) -> f64 {
        self.ln_pmf(k).exp()
    }
}

/// Which hypothesis an observation supports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Hypothesis {
    Null,
    Alternative,
}

/// log10 likelihood ratios of one observed count under two hypotheses.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LikelihoodRatio {
    /// log10 P(k; rate1)/P(k; rate2)
    pub first_over_second: f64,
    /// log10 P(k; rate2)/P(k; rate1)
    pub second_over_first: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LikelihoodRecord {
    pub count: u64,
    pub likelihood_null: f64,
    pub likelihood_alternative: f64,
    pub llr_null: f64,
    pub llr_alternative: f64,
}

fn check_rate(rate: f64) -> Result<()> {
    if !rate.is_finite() || rate <= 0.0 {
        return Err(DecayError::invalid(format!(
            "poisson rate must be positive and finite, got {rate}"
        )));
    }
    Ok(())
}

fn ln_pmf_unchecked(k: u64, rate: f64) -> f64 {
    let k = k as f64;
    -rate + k * rate.ln() - ln_gamma(k + 1.0)
}

/// ln P(k; rate) = −rate + k·ln(rate) − ln Γ(k + 1)
pub fn poisson_ln_pmf(k: u64, rate: f64) -> Result<f64> {
    check_rate(rate)?;
    Ok(ln_pmf_unchecked(k, rate))
}

pub fn poisson_pmf(k: u64, rate: f64) -> Result<f64> {
    Ok(poisson_ln_pmf(k, rate)?.exp())
}

/// Draw `n` Poisson counts with mean `rate_parameter`, sorted ascending.
pub fn sample_counts<R: Rng + ?Sized>(rate_parameter: f64, n: usize, rng: &mut R) -> Result<Vec<u64>> {
    check_rate(rate_parameter)?;
    if n == 0 {
        return Err(DecayError::invalid("sample count must be positive"));
    }
    let poisson = Poisson::new(rate_parameter)
        .map_err(|e| DecayError::invalid(format!("poisson mean {rate_parameter}: {e}")))?;
    let mut samples: Vec<u64> = (0..n).map(|_| poisson.sample(rng) as u64).collect();
    samples.sort_unstable();
    Ok(samples)
}

fn check_sorted(samples: &[u64]) -> Result<()> {
    if samples.is_empty() {
        return Err(DecayError::invalid("samples must not be empty"));
    }
    if !samples.is_sorted() {
        return Err(DecayError::invalid("samples must be sorted ascending"));
    }
    Ok(())
}

/// Empirical (1 − alpha)-quantile of the sorted null samples.
///
/// The index is floor((1 − alpha)·n), clamped to the last sample.
pub fn critical_value(null_samples: &[u64], alpha: f64) -> Result<u64> {
    if !(alpha > 0.0 && alpha < 1.0) {
        return Err(DecayError::invalid(format!(
            "alpha must lie in (0, 1), got {alpha}"
        )));
    }
    check_sorted(null_samples)?;
    let n = null_samples.len();
    let index = (((1.0 - alpha) * n as f64).floor() as usize).min(n - 1);
    debug!("Critical value index {} of {}", index, n);
    Ok(null_samples[index])
}

/// Index of the first sorted sample strictly above `critical_value`.
pub fn first_exceeding_index(samples: &[u64], critical_value: u64) -> Result<usize> {
    check_sorted(samples)?;
    let index = samples.partition_point(|&x| x <= critical_value);
    if index == samples.len() {
        return Err(DecayError::EmptyRejectionRegion { critical_value });
    }
    Ok(index)
}

/// Type-II error rate: share of the sorted alternative samples that fall at
/// or below the critical value.
///
/// When no sample exceeds the critical value every observation is accepted
/// under the null hypothesis and beta is 1.
pub fn false_negative_rate(alternative_samples: &[u64], critical_value: u64) -> Result<f64> {
    let n = alternative_samples.len() as f64;
    match first_exceeding_index(alternative_samples, critical_value) {
        Ok(index) => Ok(index as f64 / n),
        Err(DecayError::EmptyRejectionRegion { .. }) => {
            warn!(
                "No alternative sample exceeds critical value {}, beta defaults to 1",
                critical_value
            );
            Ok(1.0)
        }
        Err(e) => Err(e),
    }
}

/// log10 likelihood ratios of count `k` under Poisson rates `rate1` and `rate2`.
///
/// Computed in the log domain; the ln Γ(k + 1) terms cancel so
/// ln P1 − ln P2 = (rate2 − rate1) + k·(ln rate1 − ln rate2).
pub fn log_likelihood_ratio(k: u64, rate1: f64, rate2: f64) -> Result<LikelihoodRatio> {
    check_rate(rate1)?;
    check_rate(rate2)?;
    let ln_ratio = (rate2 - rate1) + k as f64 * (rate1.ln() - rate2.ln());
    Ok(LikelihoodRatio {
        first_over_second: ln_ratio / LN_10,
        second_over_first: -ln_ratio / LN_10,
    })
}

/// The hypothesis favoured by the likelihood ratio; ties go to the null.
pub fn classify(k: u64, null: &HypothesisModel, alternative: &HypothesisModel) -> Hypothesis {
    let ln_ratio = (alternative.rate_parameter - null.rate_parameter)
        + k as f64 * (null.rate_parameter.ln() - alternative.rate_parameter.ln());
    if ln_ratio >= 0.0 {
        Hypothesis::Null
    } else {
        Hypothesis::Alternative
    }
}

/// Likelihoods and log10 ratios of every sample under both hypotheses.
pub fn likelihood_table(
    samples: &[u64],
    null: &HypothesisModel,
    alternative: &HypothesisModel,
) -> Vec<LikelihoodRecord> {
    samples
        .iter()
        .map(|&k| {
            let ln_null = null.ln_pmf(k);
            let ln_alternative = alternative.ln_pmf(k);
            let llr = (ln_null - ln_alternative) / LN_10;
            LikelihoodRecord {
                count: k,
                likelihood_null: ln_null.exp(),
                likelihood_alternative: ln_alternative.exp(),
                llr_null: llr,
                llr_alternative: -llr,
            }
        })
        .collect()
}

/// Outcome of a Neyman–Pearson run over two sampled hypotheses.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HypothesisTestReport {
    pub null: HypothesisModel,
    pub alternative: HypothesisModel,
    pub alpha: f64,
    pub critical_value: u64,
    pub beta: f64,
    pub null_samples: Vec<u64>,
    pub alternative_samples: Vec<u64>,
    pub likelihoods: Vec<LikelihoodRecord>,
}

/// Pure isotope against the weighted mixture, both observed over the
/// configured exposure window.
pub fn run_hypothesis_test<R: Rng + ?Sized>(
    config: &HypothesisConfig,
    rng: &mut R,
) -> anyhow::Result<HypothesisTestReport> {
    config.validate().context("Invalid hypothesis test configuration")?;

    let null_rate = DecayRate::from_half_life(config.null_half_life)?;
    let null = HypothesisModel::from_decay_rate(&config.null_label, null_rate, config.exposure_scale)?;
    let mixed_rate = effective_rate(&config.alternative)?;
    let alternative =
        HypothesisModel::from_decay_rate(&config.alternative_label, mixed_rate, config.exposure_scale)?;
    debug!(
        "H1 {} mean {:.4}, H2 {} mean {:.4}",
        null.label, null.rate_parameter, alternative.label, alternative.rate_parameter
    );

    let null_samples = sample_counts(null.rate_parameter, config.sample_count, rng)
        .context("Could not sample null hypothesis counts")?;
    let alternative_samples = sample_counts(alternative.rate_parameter, config.sample_count, rng)
        .context("Could not sample alternative hypothesis counts")?;

    let critical_value = critical_value(&null_samples, config.alpha)?;
    let beta = false_negative_rate(&alternative_samples, critical_value)?;
    info!(
        "alpha = {:.3}, critical value = {}, beta = {:.3}",
        config.alpha, critical_value, beta
    );

    let likelihoods = likelihood_table(&null_samples, &null, &alternative);
    Ok(HypothesisTestReport {
        null,
        alternative,
        alpha: config.alpha,
        critical_value,
        beta,
        null_samples,
        alternative_samples,
        likelihoods,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::random::create_rng;

    #[test]
    fn test_poisson_pmf_small() {
        let expected = (-3.0_f64).exp() * 27.0 / 6.0;
        assert!((poisson_pmf(3, 3.0).unwrap() - expected).abs() < 1e-12);
        assert!((poisson_pmf(0, 2.0).unwrap() - (-2.0_f64).exp()).abs() < 1e-12);
        assert!(poisson_pmf(1, 0.0).is_err());
    }

    #[test]
    fn test_poisson_ln_pmf_large_counts() {
        // k! overflows f64 beyond 170, the log form must not
        let ln_p = poisson_ln_pmf(1000, 1000.0).unwrap();
        assert!(ln_p.is_finite());
        // Stirling: P(k=λ; λ) ≈ 1/√(2πλ)
        let approx = -(2.0 * std::f64::consts::PI * 1000.0).sqrt().ln();
        assert!((ln_p - approx).abs() < 1e-3, "{ln_p} vs {approx}");
    }

    #[test]
    fn test_sample_counts_sorted() {
        let mut rng = create_rng(1);
        let samples = sample_counts(35.9, 1000, &mut rng).unwrap();
        assert_eq!(samples.len(), 1000);
        assert!(samples.is_sorted());
        let mean = samples.iter().sum::<u64>() as f64 / 1000.0;
        assert!((mean - 35.9).abs() < 1.5, "mean {mean}");
        assert!(sample_counts(0.0, 10, &mut rng).is_err());
        assert!(sample_counts(1.0, 0, &mut rng).is_err());
    }

    #[test]
    fn test_critical_value_index() {
        let mut rng = create_rng(8);
        let samples = sample_counts(51.77, 1000, &mut rng).unwrap();
        assert_eq!(critical_value(&samples, 0.05).unwrap(), samples[950]);

        let small: Vec<u64> = (0..10).collect();
        assert_eq!(critical_value(&small, 0.05).unwrap(), 9);
        assert_eq!(critical_value(&small, 0.5).unwrap(), 5);
        assert_eq!(critical_value(&small, 1e-9).unwrap(), 9);
    }

    #[test]
    fn test_critical_value_rejects_bad_input() {
        let samples = vec![1, 2, 3];
        for alpha in [0.0, 1.0, -0.1, 1.5, f64::NAN] {
            assert!(critical_value(&samples, alpha).is_err(), "alpha {alpha}");
        }
        assert!(critical_value(&[], 0.05).is_err());
        assert!(critical_value(&[3, 1, 2], 0.05).is_err());
    }

    #[test]
    fn test_false_negative_rate() {
        let alternative = vec![30, 32, 35, 35, 40, 41, 44, 50];
        assert_eq!(first_exceeding_index(&alternative, 35).unwrap(), 4);
        assert!((false_negative_rate(&alternative, 35).unwrap() - 0.5).abs() < 1e-12);
        assert_eq!(false_negative_rate(&alternative, 10).unwrap(), 0.0);
    }

    #[test]
    fn test_empty_rejection_region() {
        let alternative = vec![30, 32, 35];
        assert_eq!(
            first_exceeding_index(&alternative, 35),
            Err(DecayError::EmptyRejectionRegion { critical_value: 35 })
        );
        assert_eq!(false_negative_rate(&alternative, 35).unwrap(), 1.0);
        assert_eq!(false_negative_rate(&alternative, 99).unwrap(), 1.0);
    }

    #[test]
    fn test_log_likelihood_ratio_antisymmetric() {
        for k in [0, 1, 36, 37, 250, 5000] {
            let forward = log_likelihood_ratio(k, 35.9127, 36.7555).unwrap();
            let backward = log_likelihood_ratio(k, 36.7555, 35.9127).unwrap();
            assert_eq!(forward.first_over_second, -backward.first_over_second);
            assert_eq!(forward.second_over_first, backward.first_over_second);
        }
        assert!(log_likelihood_ratio(3, -1.0, 2.0).is_err());
    }

    #[test]
    fn test_log_likelihood_ratio_matches_pmf() {
        let k = 40;
        let ratio = log_likelihood_ratio(k, 35.0, 45.0).unwrap();
        let direct = (poisson_pmf(k, 35.0).unwrap() / poisson_pmf(k, 45.0).unwrap()).log10();
        assert!((ratio.first_over_second - direct).abs() < 1e-10);
    }

    #[test]
    fn test_classify() {
        let null = HypothesisModel::new("low", 30.0).unwrap();
        let alternative = HypothesisModel::new("high", 50.0).unwrap();
        assert_eq!(classify(20, &null, &alternative), Hypothesis::Null);
        assert_eq!(classify(60, &null, &alternative), Hypothesis::Alternative);
        // crossover at k = 20/ln(5/3) ≈ 39.15
        assert_eq!(classify(39, &null, &alternative), Hypothesis::Null);
        assert_eq!(classify(40, &null, &alternative), Hypothesis::Alternative);
    }

    #[test]
    fn test_likelihood_table() {
        let null = HypothesisModel::new("C-10", 35.9).unwrap();
        let alternative = HypothesisModel::new("mix", 36.8).unwrap();
        let table = likelihood_table(&[30, 36, 45], &null, &alternative);
        assert_eq!(table.len(), 3);
        for record in &table {
            assert_eq!(record.llr_null, -record.llr_alternative);
            let ratio = log_likelihood_ratio(record.count, 35.9, 36.8).unwrap();
            assert!((record.llr_null - ratio.first_over_second).abs() < 1e-9);
            assert!(record.likelihood_null > 0.0 && record.likelihood_null < 1.0);
        }
    }

    #[test]
    fn test_from_decay_rate_scaling() {
        let rate = DecayRate::from_half_life(19.3009).unwrap();
        let model = HypothesisModel::from_decay_rate("C-10", rate, 1000.0).unwrap();
        assert!((model.rate_parameter() - 35.912687).abs() < 1e-5);
        assert!(HypothesisModel::from_decay_rate("C-10", rate, 0.0).is_err());
    }

    #[test]
    fn test_model_rejects_bad_rate() {
        for bad in [0.0, -4.0, f64::NAN, f64::INFINITY] {
            assert!(HypothesisModel::new("bad", bad).is_err(), "accepted {bad}");
        }
        let model = HypothesisModel::new("C-10", 35.9).unwrap();
        assert_eq!(model.label(), "C-10");
        assert_eq!(model.rate_parameter(), 35.9);
        assert!(model.ln_pmf(0).is_finite());
    }

    #[test]
    fn test_run_hypothesis_test() {
        let mut rng = create_rng(2021);
        let report = run_hypothesis_test(&HypothesisConfig::default(), &mut rng).unwrap();
        assert_eq!(report.null_samples.len(), 1000);
        assert_eq!(report.alternative_samples.len(), 1000);
        assert_eq!(report.critical_value, report.null_samples[950]);
        assert!(report.beta > 0.5 && report.beta <= 1.0, "beta {}", report.beta);
        assert_eq!(report.likelihoods.len(), 1000);
    }

    #[test]
    fn test_run_rejects_bad_alpha() {
        let mut rng = create_rng(1);
        let config = HypothesisConfig {
            alpha: 1.5,
            ..HypothesisConfig::default()
        };
        assert!(run_hypothesis_test(&config, &mut rng).is_err());
    }
}
