//! End-to-end audit: head → sample → fetch → extract → estimate.

use std::sync::Arc;

use serde::Serialize;
use tracing::{info, warn};

use crate::block::{latest_height, BlockSource};
use crate::entropy::{estimate, max_entropy};
use crate::errors::Result;
use crate::extract::ExtractionStrategy;
use crate::fetch::fetch_many;
use crate::sampler::HeightSampler;

/// Entropy of one extracted field.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldEntropy {
    pub name: &'static str,
    pub modulus: u64,
    /// Empirical entropy in bits
    pub entropy: f64,
    /// `log2(modulus)`, the value a uniform field would reach
    pub max_entropy: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AuditReport {
    /// Height of the chain head when the run started
    pub head: u64,
    /// Heights drawn by the sampler, duplicates included
    pub requested: usize,
    /// Distinct blocks the estimate is computed over
    pub distinct: usize,
    pub fields: Vec<FieldEntropy>,
}

/// Run one audit batch of `samples` randomly chosen blocks.
pub async fn audit<S, H>(
    source: Arc<S>,
    sampler: &mut H,
    samples: usize,
    strategy: &ExtractionStrategy,
) -> Result<AuditReport>
where
    S: BlockSource + Send + Sync + ?Sized + 'static,
    H: HeightSampler + ?Sized,
{
    strategy.validate()?;
    let specs = strategy.specs();

    let head = latest_height(&*source).await?;
    let heights = sampler.sample(head, samples)?;
    let sample_set = fetch_many(source, &heights).await?;

    if sample_set.len() < heights.len() {
        warn!(
            requested = heights.len(),
            distinct = sample_set.len(),
            "duplicate heights drawn, estimating over distinct blocks only"
        );
    }

    let mut columns = vec![Vec::with_capacity(sample_set.len()); specs.len()];
    for record in sample_set.records() {
        for (column, outcome) in columns.iter_mut().zip(strategy.extract(record)?) {
            column.push(outcome);
        }
    }

    let fields = specs
        .iter()
        .zip(&columns)
        .map(|(spec, outcomes)| -> Result<FieldEntropy> {
            Ok(FieldEntropy {
                name: spec.name,
                modulus: spec.modulus,
                entropy: estimate(outcomes)?,
                max_entropy: max_entropy(spec.modulus),
            })
        })
        .collect::<Result<Vec<_>>>()?;

    info!(head, distinct = sample_set.len(), "audit complete");

    Ok(AuditReport {
        head,
        requested: heights.len(),
        distinct: sample_set.len(),
        fields,
    })
}
