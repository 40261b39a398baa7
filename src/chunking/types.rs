//! Chunking result and configuration types

use serde::{Deserialize, Serialize};

/// Default byte increment between boundary probes
pub const DEFAULT_PROBE_STEP: usize = 4096;

/// Chunking engine configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChunkingConfig {
    /// Byte increment used while searching for a byte-chunk boundary (default: 4096)
    #[serde(default = "default_probe_step")]
    pub probe_step: usize,
}

fn default_probe_step() -> usize {
    DEFAULT_PROBE_STEP
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            probe_step: DEFAULT_PROBE_STEP,
        }
    }
}

/// Outcome of sequence chunking
#[derive(Debug, Clone, PartialEq)]
pub struct SequenceChunk<T> {
    /// Items accepted into this chunk, in input order
    pub chunk: Vec<T>,

    /// Whether items were left behind
    pub has_more: bool,

    /// Unconsumed items, starting with the first one that did not fit
    pub remainder: Vec<T>,
}

/// Outcome of line-oriented chunking
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineChunk {
    /// Accepted lines joined with `\n`
    pub text: String,

    /// Whether lines remain after `next_line`
    pub has_more: bool,

    /// Index of the first line not emitted
    pub next_line: usize,

    /// Number of lines in the whole text
    pub total_lines: usize,
}

impl LineChunk {
    /// Lines remaining after this chunk
    pub fn remaining_lines(&self) -> usize {
        self.total_lines - self.next_line
    }
}

/// Outcome of byte-level chunking
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ByteChunk {
    /// Decoded content of `[start_offset, next_offset)`
    pub text: String,

    /// Whether bytes remain after `next_offset`
    pub has_more: bool,

    /// Safe offset to resume from
    pub next_offset: usize,

    /// `next_offset - start_offset`
    pub bytes_consumed: usize,

    /// Offset of invalid bytes that ended the scan, once `next_offset` has
    /// reached them; resuming from there can never make progress
    pub malformed_at: Option<usize>,
}
