//! Greedy chunking of item sequences
//!
//! Items are atomic: one that does not fit is never partially included.

use crate::chunking::types::SequenceChunk;
use crate::size::SizeMonitor;

/// Take items in order while their estimated sizes fit the monitor
///
/// `size_fn` returns each item's estimated wire size. Scanning stops at the
/// first item that does not fit; it and everything after it are returned as
/// the remainder.
pub fn chunk_sequence<T, F>(items: Vec<T>, monitor: &mut SizeMonitor, mut size_fn: F) -> SequenceChunk<T>
where
    F: FnMut(&T) -> usize,
{
    let mut accepted = 0usize;

    for item in &items {
        let estimated = size_fn(item);
        if !monitor.can_fit(estimated) {
            break;
        }
        monitor.commit(estimated);
        accepted += 1;
    }

    let mut chunk = items;
    let remainder = chunk.split_off(accepted);
    let has_more = !remainder.is_empty();

    tracing::debug!(accepted, remaining = remainder.len(), used = monitor.current(), "sequence chunk cut");

    SequenceChunk {
        chunk,
        has_more,
        remainder,
    }
}
