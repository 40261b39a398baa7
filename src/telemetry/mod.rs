//! Telemetry for chunkwise
//!
//! Structured logging setup plus in-process counters for chunk sessions.

use crate::cli::Verbosity;
use crate::tokens::TokenKind;
use std::sync::{Arc, Mutex};
use std::time::Instant;

/// Environment variable selecting the log format (`json` or text)
pub const LOG_FORMAT_ENV: &str = "CHUNKWISE_LOG_FORMAT";

/// Initialize tracing according to RUST_LOG and CHUNKWISE_LOG_FORMAT
///
/// Falls back to a level derived from `verbosity` when RUST_LOG is unset.
/// Logs go to stderr so stdout stays reserved for envelopes.
pub fn init_tracing(verbosity: Verbosity) {
    use tracing_subscriber::prelude::*;
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(verbosity.log_level()));

    let fmt_layer = fmt::layer().with_target(false).with_writer(std::io::stderr);
    let builder = tracing_subscriber::registry().with(filter);

    let installed = match std::env::var(LOG_FORMAT_ENV).as_deref() {
        Ok("json") => builder.with(fmt_layer.json().flatten_event(true)).try_init(),
        _ => builder.with(fmt_layer.compact()).try_init(),
    };

    if installed.is_ok() {
        tracing::debug!(verbosity = verbosity.as_str(), "tracing initialized");
    }
}

/// Telemetry event types
#[derive(Debug, Clone)]
pub enum TelemetryEvent {
    ChunkEmitted {
        kind: TokenKind,
        chunk_index: usize,
        size: usize,
        has_more: bool,
        timestamp: Instant,
    },
    TokenIssued {
        kind: TokenKind,
        timestamp: Instant,
    },
    TokenAdvanced {
        kind: TokenKind,
        chunk_index: usize,
        timestamp: Instant,
    },
    TokenCompleted {
        kind: TokenKind,
        chunks: usize,
        timestamp: Instant,
    },
    NonProgress {
        kind: TokenKind,
        cursor: usize,
        timestamp: Instant,
    },
    DecodeFailed {
        offset: usize,
        timestamp: Instant,
    },
}

impl TelemetryEvent {
    /// When the event was recorded
    pub fn timestamp(&self) -> Instant {
        match self {
            TelemetryEvent::ChunkEmitted { timestamp, .. }
            | TelemetryEvent::TokenIssued { timestamp, .. }
            | TelemetryEvent::TokenAdvanced { timestamp, .. }
            | TelemetryEvent::TokenCompleted { timestamp, .. }
            | TelemetryEvent::NonProgress { timestamp, .. }
            | TelemetryEvent::DecodeFailed { timestamp, .. } => *timestamp,
        }
    }

    /// One-line description for the summary timeline
    pub fn describe(&self) -> String {
        match self {
            TelemetryEvent::ChunkEmitted { kind, chunk_index, size, has_more, .. } => {
                format!("{} chunk {} emitted ({} bytes, more: {})", kind, chunk_index, size, has_more)
            }
            TelemetryEvent::TokenIssued { kind, .. } => format!("{} token issued", kind),
            TelemetryEvent::TokenAdvanced { kind, chunk_index, .. } => {
                format!("{} token advanced after chunk {}", kind, chunk_index)
            }
            TelemetryEvent::TokenCompleted { kind, chunks, .. } => {
                format!("{} chain completed in {} chunks", kind, chunks)
            }
            TelemetryEvent::NonProgress { kind, cursor, .. } => {
                format!("{} stalled at cursor {}", kind, cursor)
            }
            TelemetryEvent::DecodeFailed { offset, .. } => format!("undecodable bytes at offset {}", offset),
        }
    }
}

/// Telemetry statistics
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TelemetryStats {
    pub chunks_emitted: usize,
    pub bytes_emitted: usize,
    pub tokens_issued: usize,
    pub tokens_advanced: usize,
    pub tokens_completed: usize,
    pub non_progress: usize,
    pub decode_failures: usize,
}

/// Telemetry collector
#[derive(Clone)]
pub struct TelemetryCollector {
    events: Arc<Mutex<Vec<TelemetryEvent>>>,
    stats: Arc<Mutex<TelemetryStats>>,
    start_time: Instant,
}

impl TelemetryCollector {
    /// Create a new telemetry collector
    pub fn new() -> Self {
        Self {
            events: Arc::new(Mutex::new(Vec::new())),
            stats: Arc::new(Mutex::new(TelemetryStats::default())),
            start_time: Instant::now(),
        }
    }

    /// Record an event
    pub fn record(&self, event: TelemetryEvent) {
        {
            let mut stats = self.stats.lock().unwrap_or_else(|e| e.into_inner());
            match &event {
                TelemetryEvent::ChunkEmitted { size, .. } => {
                    stats.chunks_emitted += 1;
                    stats.bytes_emitted += size;
                }
                TelemetryEvent::TokenIssued { .. } => {
                    stats.tokens_issued += 1;
                }
                TelemetryEvent::TokenAdvanced { .. } => {
                    stats.tokens_advanced += 1;
                }
                TelemetryEvent::TokenCompleted { .. } => {
                    stats.tokens_completed += 1;
                }
                TelemetryEvent::NonProgress { .. } => {
                    stats.non_progress += 1;
                }
                TelemetryEvent::DecodeFailed { .. } => {
                    stats.decode_failures += 1;
                }
            }
        }

        self.events.lock().unwrap_or_else(|e| e.into_inner()).push(event);
    }

    /// Get current statistics
    pub fn stats(&self) -> TelemetryStats {
        self.stats.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// Get elapsed time since start
    pub fn elapsed(&self) -> std::time::Duration {
        self.start_time.elapsed()
    }

    /// Get event count
    pub fn event_count(&self) -> usize {
        self.events.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    /// Get recent events (last n)
    pub fn recent_events(&self, n: usize) -> Vec<TelemetryEvent> {
        let events = self.events.lock().unwrap_or_else(|e| e.into_inner());
        let start = events.len().saturating_sub(n);
        events[start..].to_vec()
    }

    /// Last `n` events with their offset from collector start
    pub fn timeline(&self, n: usize) -> Vec<(std::time::Duration, TelemetryEvent)> {
        self.recent_events(n)
            .into_iter()
            .map(|event| (event.timestamp().saturating_duration_since(self.start_time), event))
            .collect()
    }
}

impl Default for TelemetryCollector {
    fn default() -> Self {
        Self::new()
    }
}

/// Events listed in a very verbose summary
const TIMELINE_EVENTS: usize = 20;

/// Simple telemetry display
pub struct TelemetryDisplay {
    collector: TelemetryCollector,
    verbosity: Verbosity,
}

impl TelemetryDisplay {
    /// Create a new display
    pub fn new(collector: TelemetryCollector, verbosity: Verbosity) -> Self {
        Self {
            collector,
            verbosity,
        }
    }

    /// Display summary statistics on stderr
    pub fn display_summary(&self) {
        use colored::Colorize;

        if self.verbosity == Verbosity::Quiet {
            return;
        }

        let stats = self.collector.stats();
        let elapsed = self.collector.elapsed();

        eprintln!("\n{}", "Chunk Session Summary".bold());
        eprintln!("─────────────────────────────────────");
        eprintln!("Duration:          {:?}", elapsed);
        eprintln!("Chunks emitted:    {}", stats.chunks_emitted.to_string().green());
        eprintln!("Estimated bytes:   {}", stats.bytes_emitted);
        eprintln!("Tokens issued:     {}", stats.tokens_issued);
        eprintln!("Tokens advanced:   {}", stats.tokens_advanced);
        eprintln!("Tokens completed:  {}", stats.tokens_completed);
        if stats.non_progress > 0 {
            eprintln!("Stalled chunks:    {}", stats.non_progress.to_string().red());
        }
        if stats.decode_failures > 0 {
            eprintln!("Decode failures:   {}", stats.decode_failures.to_string().red());
        }

        if self.verbosity == Verbosity::VeryVerbose {
            eprintln!("\n{}", "Recent events".bold());
            for (offset, event) in self.collector.timeline(TIMELINE_EVENTS) {
                eprintln!("  {:>8.3}s  {}", offset.as_secs_f64(), event.describe());
            }
        }
        eprintln!();
    }
}
