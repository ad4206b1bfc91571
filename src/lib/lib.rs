//! Monte-Carlo radioactive decay and Poisson hypothesis testing.
//!
//! The sampler draws per-particle decay times by inverse transform sampling
//! and reduces them to decayed/undecayed counts on an observation grid, next
//! to the closed-form exponential curves. The hypothesis module compares a
//! pure isotope against a mixture through Poisson count samples, an
//! empirical critical value and log-likelihood ratios.
//!
//! All randomness is injected: pass a seeded generator from
//! [`random::create_rng`] for reproducible runs.

pub mod config;
pub mod curve;
pub mod error;
pub mod grid;
pub mod hypothesis;
pub mod mixture;
pub mod random;
pub mod rate;
pub mod sampler;
pub mod simulation;
pub mod stats;

pub use error::DecayError;
pub use rate::{DecayRate, Isotope};
pub use sampler::{Population, count_decayed_at, draw_lifetime, generate_population};
