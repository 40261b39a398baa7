//! Response assembly
//! Pure composition of payload, continuation metadata and a size snapshot

use crate::errors::{ChunkError, Result};
use crate::response::types::{ChunkInfo, ChunkingInfo, ResponseEnvelope, SizeInfo, CHUNKING_KEY};
use crate::size::SizeMonitor;
use serde::Serialize;
use serde_json::Value;

/// Builds delivery envelopes; never mutates the monitor
#[derive(Debug, Clone, Copy, Default)]
pub struct ResponseAssembler;

impl ResponseAssembler {
    /// Create new assembler
    pub fn new() -> Self {
        Self
    }

    /// Merge `payload` with chunking metadata
    ///
    /// `payload` must serialize to a JSON object without a `chunking` field.
    /// The token is attached only when `has_more` is set. Progress is
    /// `current_chunk / estimated_total × 100`, capped at 100, and only
    /// reported when the total is known.
    pub fn assemble<P: Serialize>(
        &self,
        payload: &P,
        has_more: bool,
        monitor: &SizeMonitor,
        continuation_id: Option<&str>,
        chunk_index: usize,
        estimated_total: Option<usize>,
    ) -> Result<ResponseEnvelope> {
        let payload = match serde_json::to_value(payload)? {
            Value::Object(map) => map,
            other => {
                return Err(ChunkError::InvalidPayload(format!(
                    "payload must be a JSON object, got {}",
                    json_type(&other)
                )))
            }
        };

        if payload.contains_key(CHUNKING_KEY) {
            return Err(ChunkError::InvalidPayload(format!(
                "payload field '{}' is reserved",
                CHUNKING_KEY
            )));
        }

        let continuation_token = if has_more {
            continuation_id.map(str::to_string)
        } else {
            None
        };

        let progress_percentage = estimated_total
            .filter(|total| *total > 0)
            .map(|total| ((chunk_index as f64 / total as f64) * 100.0).min(100.0));

        let snapshot = monitor.snapshot();

        Ok(ResponseEnvelope {
            payload,
            chunking: ChunkingInfo {
                has_more,
                continuation_token,
                chunk_info: ChunkInfo {
                    current_chunk: chunk_index,
                    estimated_total_chunks: estimated_total,
                    progress_percentage,
                },
                size_info: SizeInfo {
                    current_size: snapshot.current,
                    max_size: snapshot.max,
                    usage_percentage: snapshot.usage_percentage,
                },
            },
        })
    }
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
