//! Line-oriented text chunking
//!
//! Lines are split at `\n` only; a `\r` before the newline stays part of the
//! line so resumed chunks reproduce the source exactly.

use crate::chunking::types::LineChunk;
use crate::size::SizeMonitor;

/// Split text into lines, ignoring the empty piece after a final newline
pub fn split_lines(text: &str) -> Vec<&str> {
    if text.is_empty() {
        return Vec::new();
    }
    let body = text.strip_suffix('\n').unwrap_or(text);
    body.split('\n').collect()
}

/// Emit as many whole lines from `start_line` as the monitor allows
///
/// Each line is sized with its trailing newline re-appended. A first line
/// larger than the whole remaining budget yields an empty chunk with
/// `has_more = true` and `next_line == start_line`; callers detect that
/// non-progress themselves.
pub fn chunk_lines(text: &str, monitor: &mut SizeMonitor, start_line: usize) -> LineChunk {
    let lines = split_lines(text);
    let total_lines = lines.len();
    let start = start_line.min(total_lines);

    let mut next_line = start;
    let mut scratch = String::new();

    for line in &lines[start..] {
        scratch.clear();
        scratch.push_str(line);
        scratch.push('\n');

        let estimated = monitor.estimate_size(scratch.as_str());
        if !monitor.can_fit(estimated) {
            break;
        }
        monitor.commit(estimated);
        next_line += 1;
    }

    let text = lines[start..next_line].join("\n");
    let has_more = next_line < total_lines;

    tracing::debug!(start_line = start, next_line, total_lines, used = monitor.current(), "line chunk cut");

    LineChunk {
        text,
        has_more,
        next_line,
        total_lines,
    }
}
