//! Chunking engine
//!
//! Stateless per call: every algorithm walks its input against a caller-owned
//! [`SizeMonitor`] and reports where it stopped.

use crate::chunking::bytes::chunk_bytes;
use crate::chunking::encoding::TextEncoding;
use crate::chunking::lines::chunk_lines;
use crate::chunking::sequence::chunk_sequence;
use crate::chunking::types::{ByteChunk, ChunkingConfig, LineChunk, SequenceChunk};
use crate::size::SizeMonitor;
use serde::Serialize;

/// Boundary-finding algorithms sharing one configuration
#[derive(Debug, Clone, Default)]
pub struct ChunkingEngine {
    config: ChunkingConfig,
}

impl ChunkingEngine {
    /// Create engine with default configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Create engine with custom configuration
    pub fn with_config(config: ChunkingConfig) -> Self {
        Self { config }
    }

    /// Get configuration
    pub fn config(&self) -> &ChunkingConfig {
        &self.config
    }

    /// Greedy chunking with a caller-supplied size estimate per item
    pub fn chunk_sequence<T, F>(&self, items: Vec<T>, monitor: &mut SizeMonitor, size_fn: F) -> SequenceChunk<T>
    where
        F: FnMut(&T) -> usize,
    {
        chunk_sequence(items, monitor, size_fn)
    }

    /// Greedy chunking sizing each item by its JSON serialization
    pub fn chunk_items<T: Serialize>(&self, items: Vec<T>, monitor: &mut SizeMonitor) -> SequenceChunk<T> {
        let sizer = monitor.clone();
        chunk_sequence(items, monitor, |item| sizer.estimate_size(item))
    }

    /// Line-oriented chunking from `start_line`
    pub fn chunk_lines(&self, text: &str, monitor: &mut SizeMonitor, start_line: usize) -> LineChunk {
        chunk_lines(text, monitor, start_line)
    }

    /// Encoding-safe byte chunking from `start_offset`
    pub fn chunk_bytes(
        &self,
        buffer: &[u8],
        monitor: &mut SizeMonitor,
        start_offset: usize,
        encoding: TextEncoding,
    ) -> ByteChunk {
        chunk_bytes(buffer, monitor, start_offset, encoding, self.config.probe_step)
    }
}
