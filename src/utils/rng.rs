//! Deterministic seeding for the simulation.
//!
//! A root seed is expanded into independent sub-streams so that car placement
//! and look-ahead noise do not perturb each other.

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

/// Type alias for the default RNG stream used across the crate.
pub type RngStream = ChaCha8Rng;

/// SplitMix64 mixer used to expand a 64-bit seed into a sequence of sub-seeds.
#[derive(Clone, Debug)]
pub struct SeedSequence {
    state: u128,
}

impl SeedSequence {
    pub fn new(seed: u64) -> Self {
        let init = (seed as u128) ^ 0x9E3779B97F4A7C15u128;
        Self { state: init }
    }

    /// Generate the next sub-seed deterministically.
    pub fn next_subseed(&mut self) -> u64 {
        let mut z = (self.state as u64).wrapping_add(0x9E3779B97F4A7C15);
        self.state = (self.state ^ (z as u128)).wrapping_mul(0xBF58476D1CE4E5B9);
        z = (z ^ (z >> 30)).wrapping_mul(0xBF58476D1CE4E5B9);
        z = (z ^ (z >> 27)).wrapping_mul(0x94D049BB133111EB);
        z ^ (z >> 31)
    }

    /// Create an RNG stream seeded from the next subseed.
    pub fn next_rng(&mut self) -> RngStream {
        let s = self.next_subseed();
        RngStream::seed_from_u64(s)
    }
}

/// Seed to use when the configuration does not pin one.
pub fn entropy_seed() -> u64 {
    rand::random()
}
