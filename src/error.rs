//! Error taxonomy for the cognate detection core.
//!
//! Structural precondition violations (unknown tokens, mismatched symbol
//! tables, bad indices) surface as `CoreError`. Statistical degeneracies such
//! as zero counts never do; those are absorbed by smoothing.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    /// Token absent from a frozen symbol table
    #[error("unknown symbol '{0}'")]
    UnknownSymbol(String),

    #[error("symbol id {id} out of range for a table of size {size}")]
    SymbolOutOfRange { id: u32, size: usize },

    /// Only raised when importing a persisted symbol list
    #[error("duplicate symbol '{0}'")]
    DuplicateSymbol(String),

    /// Two models or strings were encoded against different symbol tables
    #[error("dimension mismatch: {0}")]
    DimensionMismatch(String),

    #[error("position {position} out of bounds for string of length {len}")]
    PositionOutOfBounds { position: usize, len: usize },

    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("malformed model record: {0}")]
    MalformedRecord(String),

    #[error("unsupported model record version {0}")]
    UnsupportedVersion(u32),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, CoreError>;
