//! Random source construction.
//!
//! Every sampling function in this crate takes `&mut R where R: Rng + ?Sized`,
//! so callers decide between a seeded generator (reproducible runs, tests)
//! and the thread-local one.

use rand::{SeedableRng, rngs::SmallRng};

/// Creates a fast, seeded random number generator.
///
/// The sequence is deterministic for a given seed on the same platform.
pub fn create_rng(seed: u64) -> SmallRng {
    SmallRng::seed_from_u64(seed)
}
