//! Chunk boundary engine
//!
//! Three independent algorithms, each driven by a [`crate::size::SizeMonitor`]:
//! - sequence: atomic items, greedy in order
//! - lines: whole `\n`-delimited lines
//! - bytes: encoding-safe byte ranges found by bounded probing

pub mod bytes;
pub mod encoding;
pub mod engine;
pub mod lines;
pub mod sequence;
pub mod types;

// Re-export commonly used types
pub use encoding::{Decoded, TextEncoding};
pub use engine::ChunkingEngine;
pub use lines::split_lines;
pub use types::{ByteChunk, ChunkingConfig, LineChunk, SequenceChunk, DEFAULT_PROBE_STEP};
