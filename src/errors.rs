//! Error types for chunkwise
//!
//! One crate-wide error enum. Decode failures inside the byte scanner and
//! non-progress inside the algorithms are reported structurally, never here.

use thiserror::Error;

/// Main error type for chunking and token operations
#[derive(Error, Debug)]
pub enum ChunkError {
    /// Size budget misconfiguration
    #[error("Invalid size budget: max_bytes must be greater than 0 (got {max_bytes})")]
    InvalidBudget { max_bytes: usize },

    /// Configuration errors
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Unknown or expired continuation token
    #[error("Continuation token not found or expired: {0}")]
    TokenNotFound(String),

    /// Token presented to an operation of another kind
    #[error("Continuation token kind mismatch: expected {expected}, found {found}")]
    TokenKindMismatch { expected: String, found: String },

    /// Token presented for another target
    #[error("Continuation token target mismatch: expected {expected}, found {found}")]
    TargetMismatch { expected: String, found: String },

    /// Cursor update carrying fields foreign to the token's kind
    #[error("Invalid cursor update for {kind} token: field '{field}' is not applicable")]
    InvalidPatch { kind: String, field: String },

    /// Resume position no longer exists in the source
    #[error("Stale cursor: {0}")]
    StaleCursor(String),

    /// A single unit exceeds the whole remaining budget
    #[error("Unit at cursor {cursor} does not fit in a {budget} byte budget")]
    UnitTooLarge { cursor: usize, budget: usize },

    /// Source bytes that cannot be decoded in the requested encoding
    #[error("Malformed {encoding} input at byte offset {offset}")]
    MalformedInput { offset: usize, encoding: String },

    /// Payload that cannot be merged into an envelope
    #[error("Invalid payload: {0}")]
    InvalidPayload(String),

    /// Serialization errors
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    /// I/O errors
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// Generic errors with context
    #[error("Chunking error: {0}")]
    Generic(String),
}

/// Result type alias for chunking operations
pub type Result<T> = std::result::Result<T, ChunkError>;

/// Convert anyhow errors to ChunkError
impl From<anyhow::Error> for ChunkError {
    fn from(err: anyhow::Error) -> Self {
        ChunkError::Generic(err.to_string())
    }
}
