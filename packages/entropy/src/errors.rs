use thiserror::Error;

/// Error type for entropy audit operations
#[derive(Error, Debug)]
pub enum EntropyError {
    /// The secure random generator could not produce a height
    #[error("Random source error: {0}")]
    RandomSource(String),

    /// Network, transport or malformed-response failure for one block request
    #[error("Fetch error: {0}")]
    Fetch(String),

    /// A block hash or player address could not be parsed to canonical bytes
    #[error("Malformed hash error: {0}")]
    MalformedHash(String),

    /// Entropy requested over zero observations
    #[error("Empty sample error: entropy requires at least one observation")]
    EmptySample,

    /// Extraction spec outside the 256-bit digest, or overlapping another spec
    #[error("Invalid extraction spec: {0}")]
    InvalidSpec(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, EntropyError>;
