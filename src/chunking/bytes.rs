//! Byte-level text chunking with encoding safety
//!
//! # Algorithm
//!
//! ```text
//! max_span = min(remaining_budget / 2, len - start)
//! probe:   candidate += probe_step, capped at start + max_span
//!          decode [start, candidate)
//!            complete    → size check, accept or stop
//!            incomplete  → step back to the last whole character, size check
//!            malformed   → take the clean prefix before the bad bytes if it fits, stop
//! commit:  decoded [start, safe) once into the monitor
//! ```
//!
//! Guarantee: the emitted text is a clean decoding of a range ending on a
//! verified character boundary.
//!
//! Every accepted probe advances by at least `probe_step - 3` bytes (the
//! longest step-back for a 4-byte sequence), so the loop is capped at
//! `max_span / (probe_step - 3) + 2` iterations. Steps below 4 bytes are
//! raised to 4 so a single character always fits in one probe.

use crate::chunking::encoding::{Decoded, TextEncoding};
use crate::chunking::types::ByteChunk;
use crate::size::SizeMonitor;

/// Longest distance a probe can retreat to reach a character boundary
const MAX_STEP_BACK: usize = 3;

/// Smallest usable probe step: one whole 4-byte character
pub const MIN_PROBE_STEP: usize = 4;

/// Emit the longest safely decodable prefix of `buffer[start_offset..]` that fits
pub fn chunk_bytes(
    buffer: &[u8],
    monitor: &mut SizeMonitor,
    start_offset: usize,
    encoding: TextEncoding,
    probe_step: usize,
) -> ByteChunk {
    let len = buffer.len();
    let start = start_offset.min(len);
    let step = probe_step.max(MIN_PROBE_STEP);

    let max_span = (monitor.remaining() / 2).min(len - start);
    let limit = start + max_span;
    let min_advance = step - MAX_STEP_BACK;
    let max_probes = max_span / min_advance + 2;

    let mut safe = start;
    let mut accepted = String::new();
    let mut malformed_at = None;

    for _ in 0..max_probes {
        if safe >= limit {
            break;
        }
        let candidate = (safe + step).min(limit);

        let (end, text) = match encoding.decode(&buffer[start..candidate]) {
            Decoded::Complete(text) => (candidate, text),
            Decoded::Incomplete { valid_up_to } => {
                let end = start + valid_up_to;
                if end <= safe {
                    tracing::debug!(offset = candidate, "probe ends inside a character with no whole character to add");
                    break;
                }
                match encoding.decode(&buffer[start..end]) {
                    Decoded::Complete(text) => (end, text),
                    _ => break,
                }
            }
            Decoded::Malformed { valid_up_to } => {
                let bad = start + valid_up_to;
                if bad > safe {
                    if let Decoded::Complete(text) = encoding.decode(&buffer[start..bad]) {
                        if monitor.can_add(text.as_str()) {
                            safe = bad;
                            accepted = text;
                        }
                    }
                }
                if safe == bad {
                    malformed_at = Some(bad);
                }
                tracing::debug!(offset = bad, encoding = %encoding, "malformed bytes, stopping scan");
                break;
            }
        };

        if !monitor.can_add(text.as_str()) {
            break;
        }

        safe = end;
        accepted = text;
    }

    if safe > start {
        monitor.add(accepted.as_str());
    }

    let has_more = safe < len;
    tracing::debug!(start_offset = start, next_offset = safe, len, used = monitor.current(), "byte chunk cut");

    ByteChunk {
        text: accepted,
        has_more,
        next_offset: safe,
        bytes_consumed: safe - start,
        malformed_at,
    }
}
