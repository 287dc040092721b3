//! Entropy audit of block-hash derived randomness.
//!
//! Samples blocks at random heights from a JSON-RPC node, derives the
//! categorical fields the Jackpot Junction contract derives from each block
//! hash, and measures how close each field's empirical distribution is to
//! uniform with Shannon entropy.

pub mod audit;
pub mod block;
pub mod config;
pub mod entropy;
pub mod errors;
pub mod extract;
pub mod fetch;
pub mod sampler;

pub use audit::{audit, AuditReport, FieldEntropy};
pub use block::{latest_height, BlockRecord, BlockSource, RpcBlockSource};
pub use config::Config;
pub use entropy::{estimate, max_entropy, FrequencyTable};
pub use errors::{EntropyError, Result};
pub use extract::{
    check_disjoint, combined_digest, extract_fields, parse_player, ExtractionSpec,
    ExtractionStrategy, GAME_SPECS, ITEM, OUTCOME, TERRAIN,
};
pub use fetch::{fetch_many, SampleSet};
pub use sampler::{HeightSampler, SecureSampler};
