//! Delivery envelopes
//! Wraps a chunk payload with continuation and size metadata for the wire layer

pub mod assembler;
pub mod types;

pub use assembler::ResponseAssembler;
pub use types::{ChunkInfo, ChunkingInfo, ResponseEnvelope, SizeInfo, CHUNKING_KEY};
