//! Chunk session driver
//!
//! Caller side of the session state machine:
//!
//! ```text
//! START → CHUNK_EMITTED(has_more, token issued) → … → FINAL_CHUNK(token deleted)
//! ```
//!
//! Every cut that leaves data behind issues a fresh token for the next chunk
//! and deletes the one it was resumed from, so a token is single-use and its
//! lifetime starts when the caller receives it. The final chunk deletes the
//! last token. An unchanged cursor with `has_more` set is surfaced as
//! [`ChunkError::UnitTooLarge`] (or [`ChunkError::MalformedInput`] when bad
//! bytes block a byte read) so callers cannot loop forever.

use crate::chunking::{ChunkingEngine, TextEncoding};
use crate::errors::{ChunkError, Result};
use crate::response::{ResponseAssembler, ResponseEnvelope};
use crate::session::types::{
    BytesPayload, LinesPayload, ListingPayload, SearchMatch, SearchMode, SearchPayload,
};
use crate::size::{SizeConfig, SizeMonitor};
use crate::telemetry::{TelemetryCollector, TelemetryEvent};
use crate::tokens::{ContinuationToken, Cursor, FilePosition, RequestParams, TokenKind, TokenStore};
use serde::Serialize;
use std::time::Instant;

/// Where a chunk started and stopped, in source units
struct Progress {
    start: usize,
    next: usize,
    total: usize,
    has_more: bool,
}

/// Drives chunked operations against a shared token store
pub struct ChunkSession<'a> {
    store: &'a TokenStore,
    engine: ChunkingEngine,
    size: SizeConfig,
    assembler: ResponseAssembler,
    telemetry: Option<TelemetryCollector>,
}

impl<'a> ChunkSession<'a> {
    /// Create session with default engine and budget
    pub fn new(store: &'a TokenStore) -> Self {
        Self::with_config(store, ChunkingEngine::new(), SizeConfig::default())
    }

    /// Create session with custom engine and budget
    pub fn with_config(store: &'a TokenStore, engine: ChunkingEngine, size: SizeConfig) -> Self {
        Self {
            store,
            engine,
            size,
            assembler: ResponseAssembler::new(),
            telemetry: None,
        }
    }

    /// Record session events into `collector`
    pub fn with_telemetry(mut self, collector: TelemetryCollector) -> Self {
        self.telemetry = Some(collector);
        self
    }

    /// Read `text` line by line, resuming from `resume` if given
    pub fn read_lines(
        &self,
        target_path: &str,
        text: &str,
        resume: Option<&str>,
        params: RequestParams,
    ) -> Result<ResponseEnvelope> {
        let prior = self.resume(resume, TokenKind::FileRead, target_path)?;
        let start_line = match prior.as_ref().map(|t| &t.cursor) {
            None => 0,
            Some(Cursor::FileRead { position: FilePosition::Line(n) }) => *n,
            Some(_) => {
                return Err(ChunkError::StaleCursor(
                    "token resumes a byte-level read, not a line read".to_string(),
                ))
            }
        };

        let mut monitor = self.monitor()?;
        let chunk = self.engine.chunk_lines(text, &mut monitor, start_line);

        let payload = LinesPayload {
            path: target_path,
            content: chunk.text,
            start_line,
            end_line: chunk.next_line,
            total_lines: chunk.total_lines,
        };
        let progress = Progress {
            start: start_line.min(chunk.total_lines),
            next: chunk.next_line,
            total: chunk.total_lines,
            has_more: chunk.has_more,
        };
        let cursor = Cursor::FileRead {
            position: FilePosition::Line(chunk.next_line),
        };

        self.finish(prior, target_path, cursor, params, progress, &monitor, &payload)
    }

    /// Read `buffer` as encoded text in byte ranges, resuming from `resume` if given
    pub fn read_bytes(
        &self,
        target_path: &str,
        buffer: &[u8],
        encoding: TextEncoding,
        resume: Option<&str>,
        params: RequestParams,
    ) -> Result<ResponseEnvelope> {
        let prior = self.resume(resume, TokenKind::FileRead, target_path)?;
        let start_offset = match prior.as_ref().map(|t| &t.cursor) {
            None => 0,
            Some(Cursor::FileRead { position: FilePosition::Byte(n) }) => *n,
            Some(_) => {
                return Err(ChunkError::StaleCursor(
                    "token resumes a line read, not a byte-level read".to_string(),
                ))
            }
        };

        let mut monitor = self.monitor()?;
        let chunk = self.engine.chunk_bytes(buffer, &mut monitor, start_offset, encoding);

        if let Some(offset) = chunk.malformed_at.filter(|_| chunk.bytes_consumed == 0) {
            if let Some(token) = &prior {
                self.store.delete(&token.id);
            }
            tracing::warn!(target = target_path, offset, encoding = %encoding, "undecodable bytes block the read");
            self.record(TelemetryEvent::DecodeFailed {
                offset,
                timestamp: Instant::now(),
            });
            return Err(ChunkError::MalformedInput {
                offset,
                encoding: encoding.to_string(),
            });
        }

        let payload = BytesPayload {
            path: target_path,
            content: chunk.text,
            encoding,
            start_offset,
            next_offset: chunk.next_offset,
            total_bytes: buffer.len(),
        };
        let progress = Progress {
            start: start_offset.min(buffer.len()),
            next: chunk.next_offset,
            total: buffer.len(),
            has_more: chunk.has_more,
        };
        let cursor = Cursor::FileRead {
            position: FilePosition::Byte(chunk.next_offset),
        };

        self.finish(prior, target_path, cursor, params, progress, &monitor, &payload)
    }

    /// Page through a sorted directory listing
    ///
    /// Resumes after the last delivered entry; fails with `StaleCursor` if
    /// that entry has disappeared from the listing.
    pub fn list_directory(
        &self,
        target_path: &str,
        entries: Vec<String>,
        resume: Option<&str>,
        params: RequestParams,
    ) -> Result<ResponseEnvelope> {
        let prior = self.resume(resume, TokenKind::DirectoryList, target_path)?;
        let last_item = match prior.as_ref().map(|t| &t.cursor) {
            Some(Cursor::DirectoryList { last_item, .. }) => last_item.clone(),
            _ => None,
        };

        let start = match &last_item {
            None => 0,
            Some(item) => entries
                .iter()
                .position(|e| e == item)
                .map(|i| i + 1)
                .ok_or_else(|| {
                    ChunkError::StaleCursor(format!("entry '{}' is no longer in the listing", item))
                })?,
        };

        let total_entries = entries.len();
        let mut monitor = self.monitor()?;
        let chunk = self
            .engine
            .chunk_items(entries.into_iter().skip(start).collect(), &mut monitor);

        let next = start + chunk.chunk.len();
        let page = prior.as_ref().map_or(1, |t| t.chunk_index + 1);
        let cursor = Cursor::DirectoryList {
            page,
            last_item: chunk.chunk.last().cloned().or(last_item),
        };
        let progress = Progress {
            start,
            next,
            total: total_entries,
            has_more: chunk.has_more,
        };
        let payload = ListingPayload {
            path: target_path,
            entries: chunk.chunk,
            page,
            total_entries,
        };

        self.finish(prior, target_path, cursor, params, progress, &monitor, &payload)
    }

    /// Page through an ordered search match stream
    pub fn search(
        &self,
        mode: SearchMode,
        target_path: &str,
        matches: Vec<SearchMatch>,
        resume: Option<&str>,
        params: RequestParams,
    ) -> Result<ResponseEnvelope> {
        let kind = mode.token_kind();
        let prior = self.resume(resume, kind, target_path)?;

        let start = match prior.as_ref().map(|t| &t.cursor) {
            Some(Cursor::ContentSearch { last_file: Some(_), last_position, file_index })
            | Some(Cursor::FilenameSearch { last_file: Some(_), last_position, file_index }) => {
                let after = (*file_index, *last_position);
                matches.iter().position(|m| m.key() > after).unwrap_or(matches.len())
            }
            _ => 0,
        };

        let total_matches = matches.len();
        let mut monitor = self.monitor()?;
        let chunk = self
            .engine
            .chunk_items(matches.into_iter().skip(start).collect(), &mut monitor);

        let next = start + chunk.chunk.len();
        let cursor = match chunk.chunk.last() {
            Some(last) => Cursor::search(kind, Some(last.file.clone()), last.position, last.file_index),
            None => prior
                .as_ref()
                .map(|t| t.cursor.clone())
                .unwrap_or_else(|| Cursor::search(kind, None, 0, 0)),
        };
        let progress = Progress {
            start,
            next,
            total: total_matches,
            has_more: chunk.has_more,
        };
        let payload = SearchPayload {
            path: target_path,
            mode,
            matches: chunk.chunk,
            total_matches,
        };

        self.finish(prior, target_path, cursor, params, progress, &monitor, &payload)
    }

    fn monitor(&self) -> Result<SizeMonitor> {
        SizeMonitor::with_config(self.size.clone())
    }

    /// Resolve a resume token and check it belongs to this operation
    fn resume(&self, resume: Option<&str>, kind: TokenKind, target_path: &str) -> Result<Option<ContinuationToken>> {
        let Some(id) = resume else {
            return Ok(None);
        };

        let token = self.store.get(id)?;
        if token.kind() != kind {
            return Err(ChunkError::TokenKindMismatch {
                expected: kind.to_string(),
                found: token.kind().to_string(),
            });
        }
        if token.target_path != target_path {
            return Err(ChunkError::TargetMismatch {
                expected: target_path.to_string(),
                found: token.target_path,
            });
        }

        tracing::debug!(token = %id, kind = %kind, chunk_index = token.chunk_index, "resuming chunk session");
        Ok(Some(token))
    }

    #[allow(clippy::too_many_arguments)]
    fn finish<P: Serialize>(
        &self,
        prior: Option<ContinuationToken>,
        target_path: &str,
        cursor: Cursor,
        params: RequestParams,
        progress: Progress,
        monitor: &SizeMonitor,
        payload: &P,
    ) -> Result<ResponseEnvelope> {
        let kind = cursor.kind();
        let chunk_index = prior.as_ref().map_or(1, |t| t.chunk_index + 1);

        if progress.has_more && progress.next == progress.start {
            if let Some(token) = &prior {
                self.store.delete(&token.id);
            }
            tracing::warn!(kind = %kind, cursor = progress.start, budget = monitor.max_bytes(), "unit exceeds the whole budget");
            self.record(TelemetryEvent::NonProgress {
                kind,
                cursor: progress.start,
                timestamp: Instant::now(),
            });
            return Err(ChunkError::UnitTooLarge {
                cursor: progress.start,
                budget: monitor.max_bytes(),
            });
        }

        let token_id = if progress.has_more {
            let id = self.store.issue_at_chunk(target_path, cursor, params, chunk_index);
            match &prior {
                Some(token) => {
                    self.store.delete(&token.id);
                    self.record(TelemetryEvent::TokenAdvanced {
                        kind,
                        chunk_index,
                        timestamp: Instant::now(),
                    });
                }
                None => self.record(TelemetryEvent::TokenIssued {
                    kind,
                    timestamp: Instant::now(),
                }),
            }
            Some(id)
        } else {
            if let Some(token) = &prior {
                self.store.delete(&token.id);
                self.record(TelemetryEvent::TokenCompleted {
                    kind,
                    chunks: chunk_index,
                    timestamp: Instant::now(),
                });
            }
            tracing::info!(kind = %kind, target = target_path, chunks = chunk_index, "chunk session complete");
            None
        };

        let estimated_total = estimate_total_chunks(chunk_index, progress.next, progress.total, progress.has_more);
        let envelope = self.assembler.assemble(
            payload,
            progress.has_more,
            monitor,
            token_id.as_deref(),
            chunk_index,
            estimated_total,
        )?;

        self.record(TelemetryEvent::ChunkEmitted {
            kind,
            chunk_index,
            size: monitor.current(),
            has_more: progress.has_more,
            timestamp: Instant::now(),
        });

        Ok(envelope)
    }

    fn record(&self, event: TelemetryEvent) {
        if let Some(collector) = &self.telemetry {
            collector.record(event);
        }
    }
}

/// Extrapolate the chain length from units consumed over chunks delivered
///
/// ```text
/// total_chunks ≈ ⌈total_units × chunks_so_far / units_consumed⌉
/// ```
pub fn estimate_total_chunks(chunk_index: usize, consumed: usize, total: usize, has_more: bool) -> Option<usize> {
    if !has_more {
        return Some(chunk_index);
    }
    if consumed == 0 {
        return None;
    }
    let estimate = (total * chunk_index + consumed - 1) / consumed;
    Some(estimate.max(chunk_index + 1))
}
