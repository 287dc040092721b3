//! Shannon entropy of categorical outcomes.

use std::collections::BTreeMap;

use crate::errors::{EntropyError, Result};

/// Occurrence count per observed outcome.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FrequencyTable {
    counts: BTreeMap<u64, usize>,
    total: usize,
}

impl FrequencyTable {
    pub fn from_outcomes(outcomes: &[u64]) -> Self {
        let mut table = Self::default();
        for &outcome in outcomes {
            *table.counts.entry(outcome).or_insert(0) += 1;
            table.total += 1;
        }
        table
    }

    pub fn total(&self) -> usize {
        self.total
    }

    pub fn count(&self, outcome: u64) -> usize {
        self.counts.get(&outcome).copied().unwrap_or(0)
    }

    /// Number of distinct outcomes observed
    pub fn categories(&self) -> usize {
        self.counts.len()
    }

    /// `-Σ p·log2(p)` over observed outcomes, in bits.
    pub fn entropy(&self) -> Result<f64> {
        if self.total == 0 {
            return Err(EntropyError::EmptySample);
        }

        let total = self.total as f64;
        let mut entropy = 0.0;
        for &count in self.counts.values() {
            let p = count as f64 / total;
            entropy -= p * p.log2();
        }
        Ok(entropy)
    }
}

/// Empirical entropy of `outcomes` in bits.
pub fn estimate(outcomes: &[u64]) -> Result<f64> {
    FrequencyTable::from_outcomes(outcomes).entropy()
}

/// Entropy of a uniform distribution over `modulus` outcomes.
pub fn max_entropy(modulus: u64) -> f64 {
    (modulus as f64).log2()
}
