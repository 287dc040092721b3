//! Uniform block-height sampling from a cryptographically secure source.
//!
//! Heights are drawn with replacement; duplicates are collapsed later when the
//! fetched blocks are merged into a [`crate::fetch::SampleSet`].

use rand::rngs::OsRng;
use rand::{CryptoRng, RngCore};

use crate::errors::{EntropyError, Result};

/// Draws block heights below an exclusive upper bound.
pub trait HeightSampler {
    fn sample(&mut self, bound: u64, count: usize) -> Result<Vec<u64>>;
}

/// Sampler over any `CryptoRng`, surfacing generator failures instead of panicking.
#[derive(Debug, Clone)]
pub struct SecureSampler<R> {
    rng: R,
}

impl SecureSampler<OsRng> {
    /// Sampler over the operating system's entropy source
    pub fn os() -> Self {
        Self::new(OsRng)
    }
}

impl<R: RngCore + CryptoRng> SecureSampler<R> {
    pub fn new(rng: R) -> Self {
        Self { rng }
    }

    /// Uniform value in `[0, bound)` by rejection sampling.
    fn below(&mut self, bound: u64) -> Result<u64> {
        // Largest multiple of `bound` that fits; draws at or above it would bias the low residues.
        let limit = bound * (u64::MAX / bound);
        loop {
            let mut buf = [0u8; 8];
            self.rng
                .try_fill_bytes(&mut buf)
                .map_err(|e| EntropyError::RandomSource(e.to_string()))?;

            let draw = u64::from_le_bytes(buf);
            if draw < limit {
                return Ok(draw % bound);
            }
        }
    }
}

impl<R: RngCore + CryptoRng> HeightSampler for SecureSampler<R> {
    fn sample(&mut self, bound: u64, count: usize) -> Result<Vec<u64>> {
        if bound == 0 {
            return Err(EntropyError::RandomSource(
                "cannot sample heights below 0".to_string(),
            ));
        }
        if count == 0 {
            return Err(EntropyError::RandomSource(
                "sample count must be positive".to_string(),
            ));
        }

        (0..count).map(|_| self.below(bound)).collect()
    }
}
