//! Derivation of the game's categorical outcomes from block hashes.
//!
//! Two strategies exist. The raw-hash strategy reads the block hash itself as
//! a 256-bit integer and reduces it modulo an arbitrary base. The
//! player-mixed strategy hashes `keccak256(block_hash ‖ player)` first, then
//! carves the item, terrain and outcome fields out of disjoint bit ranges of
//! the digest.

use std::str::FromStr;

use alloy_primitives::{keccak256, Address, B256, U256};

use crate::block::BlockRecord;
use crate::errors::{EntropyError, Result};

const DIGEST_BITS: usize = 256;

/// A bit range of the digest and the modulus its value is reduced by.
///
/// `offset` counts bits from the least-significant end.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExtractionSpec {
    pub name: &'static str,
    pub offset: usize,
    pub width: usize,
    pub modulus: u64,
}

pub const OUTCOME: ExtractionSpec = ExtractionSpec {
    name: "outcome",
    offset: 0,
    width: 20,
    modulus: 4,
};

pub const TERRAIN: ExtractionSpec = ExtractionSpec {
    name: "terrain",
    offset: 20,
    width: 118,
    modulus: 7,
};

pub const ITEM: ExtractionSpec = ExtractionSpec {
    name: "item",
    offset: 138,
    width: 118,
    modulus: 4,
};

/// The game's fields, in reporting order.
pub const GAME_SPECS: [ExtractionSpec; 3] = [ITEM, TERRAIN, OUTCOME];

impl ExtractionSpec {
    /// Whole-digest field used by the raw-hash strategy
    pub fn whole_hash(modulus: u64) -> Self {
        Self {
            name: "hash",
            offset: 0,
            width: DIGEST_BITS,
            modulus,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.width == 0 {
            return Err(EntropyError::InvalidSpec(format!("{}: zero width", self.name)));
        }
        if self.modulus == 0 {
            return Err(EntropyError::InvalidSpec(format!("{}: zero modulus", self.name)));
        }
        if self.offset + self.width > DIGEST_BITS {
            return Err(EntropyError::InvalidSpec(format!(
                "{}: bits [{}, {}) exceed the {DIGEST_BITS}-bit digest",
                self.name,
                self.offset,
                self.offset + self.width
            )));
        }
        Ok(())
    }

    fn mask(&self) -> U256 {
        if self.width >= DIGEST_BITS {
            U256::MAX
        } else {
            (U256::from(1u64) << self.width) - U256::from(1u64)
        }
    }

    /// Mask of the bits this spec reads, in digest position.
    pub fn range_mask(&self) -> U256 {
        self.mask() << self.offset
    }

    /// The `width` bits starting at `offset`, shifted down to bit 0.
    pub fn field(&self, value: U256) -> U256 {
        (value >> self.offset) & self.mask()
    }

    /// Field value modulo `modulus`; callers go through [`Self::validate`] first.
    pub fn reduce(&self, value: U256) -> u64 {
        (self.field(value) % U256::from(self.modulus)).as_limbs()[0]
    }
}

/// Validate every spec and reject any two whose bit ranges overlap.
pub fn check_disjoint(specs: &[ExtractionSpec]) -> Result<()> {
    for spec in specs {
        spec.validate()?;
    }
    for (i, a) in specs.iter().enumerate() {
        for b in &specs[i + 1..] {
            if a.range_mask() & b.range_mask() != U256::ZERO {
                return Err(EntropyError::InvalidSpec(format!(
                    "{} and {} overlap",
                    a.name, b.name
                )));
            }
        }
    }
    Ok(())
}

pub fn parse_block_hash(record: &BlockRecord) -> Result<B256> {
    B256::from_str(record.hash.trim()).map_err(|e| {
        EntropyError::MalformedHash(format!(
            "block {} hash {:?}: {e}",
            record.number, record.hash
        ))
    })
}

pub fn parse_player(player: &str) -> Result<Address> {
    Address::from_str(player.trim())
        .map_err(|e| EntropyError::MalformedHash(format!("player address {player:?}: {e}")))
}

/// `keccak256(block_hash ‖ player)` as a big-endian integer.
pub fn combined_digest(block_hash: B256, player: Address) -> U256 {
    let data = [block_hash.as_slice(), player.as_slice()].concat();
    U256::from_be_bytes(keccak256(&data).0)
}

/// Extract one outcome per spec from the player-mixed digest of `record`.
pub fn extract_fields(
    record: &BlockRecord,
    player: Address,
    specs: &[ExtractionSpec],
) -> Result<Vec<u64>> {
    check_disjoint(specs)?;
    let value = combined_digest(parse_block_hash(record)?, player);
    Ok(specs.iter().map(|spec| spec.reduce(value)).collect())
}

/// How outcomes are derived from a block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExtractionStrategy {
    /// The raw block hash modulo `modulus`, no player mix-in.
    RawHash { modulus: u64 },
    /// `keccak256(hash ‖ player)` split into the game's item, terrain and outcome fields.
    PlayerMixed { player: Address },
}

impl ExtractionStrategy {
    pub fn specs(&self) -> Vec<ExtractionSpec> {
        match self {
            Self::RawHash { modulus } => vec![ExtractionSpec::whole_hash(*modulus)],
            Self::PlayerMixed { .. } => GAME_SPECS.to_vec(),
        }
    }

    pub fn validate(&self) -> Result<()> {
        check_disjoint(&self.specs())
    }

    /// The 256-bit value the specs are applied to.
    pub fn digest(&self, record: &BlockRecord) -> Result<U256> {
        let hash = parse_block_hash(record)?;
        Ok(match self {
            Self::RawHash { .. } => U256::from_be_bytes(hash.0),
            Self::PlayerMixed { player } => combined_digest(hash, *player),
        })
    }

    /// One outcome per entry of [`Self::specs`], in the same order.
    pub fn extract(&self, record: &BlockRecord) -> Result<Vec<u64>> {
        self.validate()?;
        let value = self.digest(record)?;
        Ok(self.specs().iter().map(|spec| spec.reduce(value)).collect())
    }
}
