//! Pseudo-random sources used by grammar expansion and turtle jitter.

use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Normal};
use rand_pcg::Pcg64;

/// The randomness a tree run consumes.
///
/// Expansion picks among stochastic rule candidates with [`choose`](Self::choose);
/// the interpreter jitters angles and rolls leaf emission with
/// [`normal`](Self::normal). Tests substitute a deterministic implementation.
pub trait RandomSource {
    /// Uniform real in `[0, 1)`.
    fn uniform(&mut self) -> f32;

    /// Uniform index in `0..len`. `len` must be non-zero.
    fn choose(&mut self, len: usize) -> usize;

    /// Sample from a normal distribution.
    fn normal(&mut self, mean: f32, std_dev: f32) -> f32;
}

/// [`RandomSource`] backed by a PCG generator.
#[derive(Clone, Debug)]
pub struct PcgRandom {
    rng: Pcg64,
}

impl PcgRandom {
    /// Fresh, non-reproducible seed drawn from the thread RNG.
    pub fn from_entropy() -> Self {
        Self {
            rng: Pcg64::from_rng(&mut rand::rng()),
        }
    }

    /// Reproducible stream for a given seed.
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: Pcg64::seed_from_u64(seed),
        }
    }
}

impl RandomSource for PcgRandom {
    fn uniform(&mut self) -> f32 {
        self.rng.random::<f32>()
    }

    fn choose(&mut self, len: usize) -> usize {
        if len <= 1 {
            return 0;
        }
        self.rng.random_range(0..len)
    }

    fn normal(&mut self, mean: f32, std_dev: f32) -> f32 {
        // Non-positive or NaN deviation collapses to the mean.
        if !(std_dev > 0.0) {
            return mean;
        }
        match Normal::new(mean, std_dev) {
            Ok(dist) => dist.sample(&mut self.rng),
            Err(_) => mean,
        }
    }
}
