//! Response envelope types
//!
//! Wire shape:
//!
//! ```text
//! {
//!   ...payload fields...,
//!   "chunking": {
//!     "has_more": bool,
//!     "continuation_token"?: string,
//!     "chunk_info": { "current_chunk", "estimated_total_chunks"?, "progress_percentage"? },
//!     "size_info": { "current_size", "max_size", "usage_percentage" }
//!   }
//! }
//! ```

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Key reserved for chunking metadata in the envelope
pub const CHUNKING_KEY: &str = "chunking";

/// Position of this chunk in its chain
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChunkInfo {
    pub current_chunk: usize,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub estimated_total_chunks: Option<usize>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub progress_percentage: Option<f64>,
}

/// Size monitor figures at assembly time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SizeInfo {
    pub current_size: usize,
    pub max_size: usize,
    pub usage_percentage: f64,
}

/// Chunking metadata block
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChunkingInfo {
    pub has_more: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub continuation_token: Option<String>,

    pub chunk_info: ChunkInfo,

    pub size_info: SizeInfo,
}

/// Payload fields plus chunking metadata, ready for the wire layer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseEnvelope {
    #[serde(flatten)]
    pub payload: Map<String, Value>,

    pub chunking: ChunkingInfo,
}

impl ResponseEnvelope {
    /// Continuation token id, if more data remains
    pub fn continuation_token(&self) -> Option<&str> {
        self.chunking.continuation_token.as_deref()
    }

    /// Whether more chunks follow
    pub fn has_more(&self) -> bool {
        self.chunking.has_more
    }

    /// Payload field by name
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.payload.get(name)
    }

    /// Serialize to a JSON value
    pub fn to_value(&self) -> serde_json::Result<Value> {
        serde_json::to_value(self)
    }
}
