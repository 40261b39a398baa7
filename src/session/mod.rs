//! Chunk sessions
//!
//! Ties the engine, a fresh size monitor per call, the token store and the
//! response assembler together for file reads, directory listings and searches.

pub mod driver;
pub mod types;

pub use driver::{estimate_total_chunks, ChunkSession};
pub use types::{SearchMatch, SearchMode};
