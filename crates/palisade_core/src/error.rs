//! Error types for the game simulation.

use thiserror::Error;

/// Result type alias using [`GameError`].
pub type Result<T> = std::result::Result<T, GameError>;

/// Top-level error type for all game simulation errors.
#[derive(Debug, Error)]
pub enum GameError {
    /// Invalid entity reference.
    #[error("Entity not found: {0}")]
    EntityNotFound(u64),

    /// Spawn code contains a character outside `{'0','1','2','3'}`.
    #[error("Invalid spawn code '{code}': bad character '{found}' at position {position}")]
    InvalidSpawnCode {
        /// The offending code string.
        code: String,
        /// The character that is not a valid spawn step.
        found: char,
        /// Byte offset of the bad character.
        position: usize,
    },

    /// Rarity weights must sum to exactly 100.
    #[error("Rarity weights sum to {total}, expected 100")]
    RarityWeights {
        /// Actual sum of the declared weights.
        total: u32,
    },

    /// Data file parsing error.
    #[error("Failed to parse data file '{path}': {message}")]
    DataParseError {
        /// Path to the file that failed to parse.
        path: String,
        /// Error message.
        message: String,
    },

    /// Insufficient tokens for an operation that requires them.
    #[error("Insufficient tokens: need {required}, have {available}")]
    InsufficientTokens {
        /// Amount required.
        required: u32,
        /// Amount available.
        available: u32,
    },

    /// Session configuration failed validation.
    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    /// Invalid game state.
    #[error("Invalid game state: {0}")]
    InvalidState(String),

    /// Snapshot divergence between two runs that should be identical.
    #[error("Desync detected at tick {tick}: local hash {local_hash}, remote hash {remote_hash}")]
    DesyncDetected {
        /// Tick where desync occurred.
        tick: u64,
        /// Local session hash.
        local_hash: u64,
        /// Remote session hash.
        remote_hash: u64,
    },
}
