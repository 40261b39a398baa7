//! chunkwise - Size-bounded response chunking
//!
//! Splits oversized results into chunks that each fit a hard byte budget and
//! lets callers resume retrieval through opaque continuation tokens.
//!
//! # Architecture
//!
//! - **size**: running size monitor with a safety-margin estimator
//! - **tokens**: continuation token store with TTL expiry
//! - **chunking**: sequence, line and encoding-safe byte boundary algorithms
//! - **response**: delivery envelope assembly
//! - **session**: token lifecycle driver for reads, listings and searches

pub mod errors;
pub mod size;
pub mod tokens;
pub mod chunking;
pub mod response;
pub mod session;

// Re-export commonly used types
pub use errors::{ChunkError, Result};
pub use size::{SizeConfig, SizeMonitor};
pub use tokens::{ContinuationToken, Cursor, CursorPatch, FilePosition, TokenKind, TokenStore};
pub use chunking::{ChunkingEngine, TextEncoding};
pub use response::{ResponseAssembler, ResponseEnvelope};
pub use session::ChunkSession;

// Binary support: collaborators, configuration and logging
pub mod sources;
pub mod cli;
pub mod telemetry;
