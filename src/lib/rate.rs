use crate::error::{DecayError, Result};
use anyhow::anyhow;
use serde::{Deserialize, Serialize};
use std::{f64::consts::LN_2, fmt, str::FromStr};
use strum::IntoEnumIterator;
use strum_macros::EnumIter;

/// Decay constant λ of an exponential decay law. Always positive and finite.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize)]
#[serde(transparent)]
pub struct DecayRate(f64);

impl DecayRate {
    pub fn new(rate: f64) -> Result<Self> {
        if !rate.is_finite() || rate <= 0.0 {
            return Err(DecayError::invalid(format!(
                "decay rate must be positive and finite, got {rate}"
            )));
        }
        Ok(Self(rate))
    }

    /// λ = ln2 / T½
    pub fn from_half_life(half_life: f64) -> Result<Self> {
        if !half_life.is_finite() || half_life <= 0.0 {
            return Err(DecayError::invalid(format!(
                "half-life must be positive and finite, got {half_life}"
            )));
        }
        Self::new(LN_2 / half_life)
    }

    /// Weighted sum of rates, λ_mix = Σ wᵢλᵢ.
    ///
    /// This is the "mixed rate" model: a single exponential law standing in
    /// for a blend of isotopes.
    pub fn effective(weighted: &[(f64, DecayRate)]) -> Result<Self> {
        if weighted.is_empty() {
            return Err(DecayError::invalid("effective rate needs at least one component"));
        }
        let rate = weighted.iter().map(|(w, r)| w * r.value()).sum();
        Self::new(rate)
    }

    pub fn value(&self) -> f64 {
        self.0
    }

    pub fn half_life(&self) -> f64 {
        LN_2 / self.0
    }

    /// Expected lifetime of a single particle, 1/λ.
    pub fn mean_lifetime(&self) -> f64 {
        1.0 / self.0
    }

    /// Fraction of the population still present at `t`, e^(−λt).
    pub fn surviving_fraction(&self, t: f64) -> f64 {
        (-self.0 * t).exp()
    }

    /// Fraction of the population decayed by `t`, 1 − e^(−λt).
    pub fn decayed_fraction(&self, t: f64) -> f64 {
        -(-self.0 * t).exp_m1()
    }
}

impl fmt::Display for DecayRate {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "λ={:.6} (T½={:.4})", self.0, self.half_life())
    }
}

/// Isotopes used by the reference decay experiments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, Serialize, Deserialize)]
pub enum Isotope {
    Carbon10,
    Neon19,
}

impl Isotope {
    /// Half-life in seconds.
    pub fn half_life(&self) -> f64 {
        match self {
            Isotope::Carbon10 => 19.3009,
            Isotope::Neon19 => 17.274,
        }
    }

    pub fn rate(&self) -> DecayRate {
        DecayRate(LN_2 / self.half_life())
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            Isotope::Carbon10 => "C-10",
            Isotope::Neon19 => "Ne-19",
        }
    }
}

impl fmt::Display for Isotope {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

impl FromStr for Isotope {
    type Err = anyhow::Error;

    /// Accepts the symbol with or without the hyphen, in any case.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Isotope::iter()
            .find(|isotope| {
                let symbol = isotope.symbol();
                symbol.eq_ignore_ascii_case(s) || symbol.replace('-', "").eq_ignore_ascii_case(s)
            })
            .ok_or_else(|| anyhow!("Invalid isotope: {}", s))
    }
}
