//! Error types for prefix-tree spatial indexing.

use thiserror::Error;

/// Prefix-tree spatial errors.
#[derive(Error, Debug)]
pub enum SpatialError {
    /// Malformed shape coordinates (NaN, out of world bounds, inverted ranges).
    #[error("Invalid shape: {0}")]
    InvalidShape(String),

    /// Shape kind that the shape model cannot represent.
    #[error("Unsupported shape: {0}")]
    UnsupportedShape(String),

    /// WKT parsing error.
    #[error("WKT parse error: {0}")]
    WktParse(String),

    /// Ill-formed cell token or term (wrong alphabet, too long, misplaced marker).
    #[error("Decode error: {0}")]
    Decode(String),

    /// Spatial-args syntax error.
    #[error("Parse error: {0}")]
    Parse(String),

    /// Configuration error (max levels, dist-err-pct, grid/context mismatch).
    #[error("Configuration error: {0}")]
    Config(String),

    /// Index format error (corrupt or incompatible root manifest).
    #[error("Index format error: {0}")]
    FormatError(String),

    /// Internal error (should not happen).
    #[error("Internal error: {0}")]
    Internal(String),
}

impl SpatialError {
    /// Create an invalid shape error.
    pub fn invalid_shape(msg: impl Into<String>) -> Self {
        SpatialError::InvalidShape(msg.into())
    }

    /// Create a decode error.
    pub fn decode(msg: impl Into<String>) -> Self {
        SpatialError::Decode(msg.into())
    }

    /// Create a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        SpatialError::Config(msg.into())
    }
}

/// Result type for prefix-tree operations.
pub type Result<T> = std::result::Result<T, SpatialError>;
