//! Continuation token store
//!
//! Maps opaque ids to resumable cursor state with time-based expiry.
//!
//! # Expiry
//!
//! ```text
//! reachable(t) ⟺ now - t.created_at < ttl
//! ```
//!
//! Expired tokens are evicted lazily on `get`/`update` and by a full sweep on
//! every `issue` and `active_count`. The sweep is O(live tokens): fine for one
//! outstanding token per in-flight paginated request, not for very large
//! numbers of concurrently open tokens.

use crate::errors::{ChunkError, Result};
use crate::tokens::clock::{Clock, SystemClock};
use crate::tokens::types::{ContinuationToken, Cursor, CursorPatch, RequestParams};
use chrono::{DateTime, Duration, Utc};
use rand::distributions::Alphanumeric;
use rand::Rng;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};

/// Default token lifetime in seconds (30 minutes)
pub const DEFAULT_TOKEN_TTL_SECS: u64 = 30 * 60;

/// Length of the random id suffix
const ID_SUFFIX_LEN: usize = 9;

/// Shared store of live continuation tokens
///
/// Constructed once and passed by reference (or `Arc`) to every call site.
/// Each operation holds the map lock for its whole duration, so no caller can
/// observe a half-updated token.
pub struct TokenStore {
    tokens: Mutex<HashMap<String, ContinuationToken>>,
    ttl: Duration,
    clock: Arc<dyn Clock>,
}

impl TokenStore {
    /// Create store with the default 30 minute TTL
    pub fn new() -> Self {
        Self::with_ttl(Duration::seconds(DEFAULT_TOKEN_TTL_SECS as i64))
    }

    /// Create store with a custom TTL
    pub fn with_ttl(ttl: Duration) -> Self {
        Self::with_clock(ttl, Arc::new(SystemClock))
    }

    /// Create store with a custom TTL and time source
    pub fn with_clock(ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            tokens: Mutex::new(HashMap::new()),
            ttl,
            clock,
        }
    }

    /// Mint a token for `cursor` and return its id
    ///
    /// The id is `{kind}_{unix_millis}_{random}`: unique within one process,
    /// not cryptographically unique. Live ids are never reused.
    pub fn issue(&self, target_path: impl Into<String>, cursor: Cursor, params: RequestParams) -> String {
        self.issue_at_chunk(target_path, cursor, params, 1)
    }

    /// Mint a token recording how many chunks were already delivered
    pub fn issue_at_chunk(
        &self,
        target_path: impl Into<String>,
        cursor: Cursor,
        params: RequestParams,
        chunk_index: usize,
    ) -> String {
        let now = self.clock.now();
        let mut tokens = self.lock();

        let kind = cursor.kind();
        let mut id = generate_id(kind.as_str(), now);
        while tokens.contains_key(&id) {
            id = generate_id(kind.as_str(), now);
        }

        let token = ContinuationToken {
            id: id.clone(),
            target_path: target_path.into(),
            cursor,
            params,
            chunk_index,
            created_at: now,
        };
        tokens.insert(id.clone(), token);

        let evicted = self.sweep(&mut tokens, now);
        tracing::debug!(token = %id, kind = %kind, evicted, live = tokens.len(), "continuation token issued");

        id
    }

    /// Look up a live token
    ///
    /// Expired tokens are deleted and reported as not found.
    pub fn get(&self, id: &str) -> Result<ContinuationToken> {
        let now = self.clock.now();
        let mut tokens = self.lock();
        self.live_entry(&mut tokens, id, now).map(|t| t.clone())
    }

    /// Shallow-merge `patch` into a live token's cursor and params
    ///
    /// Does not extend the token's lifetime. The patch is validated against
    /// the token's kind before anything is written.
    pub fn update(&self, id: &str, patch: CursorPatch) -> Result<()> {
        let now = self.clock.now();
        let mut tokens = self.lock();
        let token = self.live_entry(&mut tokens, id, now)?;

        patch.validate_for(token.kind())?;
        token.apply(patch);

        tracing::debug!(token = %id, "continuation token advanced");
        Ok(())
    }

    /// Invalidate a token; returns whether it existed
    pub fn delete(&self, id: &str) -> bool {
        let removed = self.lock().remove(id).is_some();
        if removed {
            tracing::debug!(token = %id, "continuation token deleted");
        }
        removed
    }

    /// Sweep expired tokens, then report how many remain
    pub fn active_count(&self) -> usize {
        let now = self.clock.now();
        let mut tokens = self.lock();
        self.sweep(&mut tokens, now);
        tokens.len()
    }

    /// Drop every token
    pub fn clear(&self) {
        self.lock().clear();
    }

    /// Token lifetime
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, ContinuationToken>> {
        // Mutations are validated before they are applied, so a poisoned map
        // still holds whole tokens.
        self.tokens.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn is_expired(&self, token: &ContinuationToken, now: DateTime<Utc>) -> bool {
        now - token.created_at >= self.ttl
    }

    fn live_entry<'a>(
        &self,
        tokens: &'a mut HashMap<String, ContinuationToken>,
        id: &str,
        now: DateTime<Utc>,
    ) -> Result<&'a mut ContinuationToken> {
        let expired = match tokens.get(id) {
            None => return Err(ChunkError::TokenNotFound(id.to_string())),
            Some(token) => self.is_expired(token, now),
        };

        if expired {
            tokens.remove(id);
            tracing::debug!(token = %id, "continuation token expired");
            return Err(ChunkError::TokenNotFound(id.to_string()));
        }

        tokens
            .get_mut(id)
            .ok_or_else(|| ChunkError::TokenNotFound(id.to_string()))
    }

    fn sweep(&self, tokens: &mut HashMap<String, ContinuationToken>, now: DateTime<Utc>) -> usize {
        let before = tokens.len();
        tokens.retain(|_, t| !self.is_expired(t, now));
        before - tokens.len()
    }
}

impl Default for TokenStore {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for TokenStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenStore")
            .field("tokens", &self.lock().len())
            .field("ttl", &self.ttl)
            .finish()
    }
}

fn generate_id(kind: &str, now: DateTime<Utc>) -> String {
    let suffix: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(ID_SUFFIX_LEN)
        .map(|b| char::from(b).to_ascii_lowercase())
        .collect();
    format!("{}_{}_{}", kind, now.timestamp_millis(), suffix)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tokens::clock::ManualClock;
    use crate::tokens::types::{FilePosition, TokenKind};
    use serde_json::json;

    fn store_with_clock() -> (TokenStore, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::default());
        let store = TokenStore::with_clock(Duration::minutes(30), clock.clone());
        (store, clock)
    }

    fn line_cursor(n: usize) -> Cursor {
        Cursor::FileRead {
            position: FilePosition::Line(n),
        }
    }

    #[test]
    fn test_issue_then_get() {
        let (store, _clock) = store_with_clock();
        let mut params = RequestParams::new();
        params.insert("path".to_string(), json!("/var/log/syslog"));

        let id = store.issue("/var/log/syslog", line_cursor(120), params.clone());
        let token = store.get(&id).unwrap();

        assert_eq!(token.id, id);
        assert_eq!(token.cursor, line_cursor(120));
        assert_eq!(token.params, params);
        assert_eq!(token.kind(), TokenKind::FileRead);
    }

    #[test]
    fn test_id_format() {
        let store = TokenStore::new();
        let id = store.issue("/d", Cursor::DirectoryList { page: 1, last_item: None }, RequestParams::new());
        assert!(id.starts_with("directory_list_"));
        let suffix = id.rsplit('_').next().unwrap();
        assert_eq!(suffix.len(), ID_SUFFIX_LEN);
    }

    #[test]
    fn test_ids_unique() {
        let store = TokenStore::new();
        let mut ids = std::collections::HashSet::new();
        for n in 0..200 {
            ids.insert(store.issue("/f", line_cursor(n), RequestParams::new()));
        }
        assert_eq!(ids.len(), 200);
        assert_eq!(store.active_count(), 200);
    }

    #[test]
    fn test_get_unknown() {
        let store = TokenStore::new();
        assert!(matches!(store.get("nope"), Err(ChunkError::TokenNotFound(_))));
    }

    #[test]
    fn test_expiry_boundary() {
        let (store, clock) = store_with_clock();
        let id = store.issue("/f", line_cursor(0), RequestParams::new());

        clock.advance(Duration::minutes(30) - Duration::milliseconds(1));
        assert!(store.get(&id).is_ok());

        clock.advance(Duration::milliseconds(1));
        assert!(store.get(&id).is_err());
        assert_eq!(store.active_count(), 0);
    }

    #[test]
    fn test_issue_sweeps_expired() {
        let (store, clock) = store_with_clock();
        store.issue("/a", line_cursor(0), RequestParams::new());
        store.issue("/b", line_cursor(0), RequestParams::new());

        clock.advance(Duration::minutes(31));
        store.issue("/c", line_cursor(0), RequestParams::new());

        assert_eq!(store.active_count(), 1);
    }

    #[test]
    fn test_update_merges_fields() {
        let (store, _clock) = store_with_clock();
        let id = store.issue(
            "/src",
            Cursor::ContentSearch {
                last_file: Some("a.rs".to_string()),
                last_position: 3,
                file_index: 0,
            },
            RequestParams::new(),
        );

        store
            .update(
                &id,
                CursorPatch {
                    file_index: Some(4),
                    ..CursorPatch::default()
                },
            )
            .unwrap();

        let token = store.get(&id).unwrap();
        assert_eq!(
            token.cursor,
            Cursor::ContentSearch {
                last_file: Some("a.rs".to_string()),
                last_position: 3,
                file_index: 4,
            }
        );
    }

    #[test]
    fn test_update_rejects_foreign_fields_without_writing() {
        let (store, _clock) = store_with_clock();
        let id = store.issue("/f", line_cursor(7), RequestParams::new());

        let result = store.update(
            &id,
            CursorPatch {
                page: Some(2),
                chunk_index: Some(9),
                ..CursorPatch::default()
            },
        );

        assert!(matches!(result, Err(ChunkError::InvalidPatch { .. })));
        let token = store.get(&id).unwrap();
        assert_eq!(token.cursor, line_cursor(7));
        assert_eq!(token.chunk_index, 1);
    }

    #[test]
    fn test_update_expired_token() {
        let (store, clock) = store_with_clock();
        let id = store.issue("/f", line_cursor(0), RequestParams::new());
        clock.advance(Duration::hours(1));

        let result = store.update(&id, CursorPatch::default());
        assert!(matches!(result, Err(ChunkError::TokenNotFound(_))));
    }

    #[test]
    fn test_update_keeps_created_at() {
        let (store, clock) = store_with_clock();
        let id = store.issue("/f", line_cursor(0), RequestParams::new());
        let created = store.get(&id).unwrap().created_at;

        clock.advance(Duration::minutes(10));
        store
            .update(&id, CursorPatch { line_start: Some(50), ..CursorPatch::default() })
            .unwrap();

        assert_eq!(store.get(&id).unwrap().created_at, created);
    }

    #[test]
    fn test_delete() {
        let store = TokenStore::new();
        let id = store.issue("/f", line_cursor(0), RequestParams::new());
        assert!(store.delete(&id));
        assert!(!store.delete(&id));
        assert!(store.get(&id).is_err());
    }

    #[test]
    fn test_clear() {
        let store = TokenStore::new();
        store.issue("/a", line_cursor(0), RequestParams::new());
        store.issue("/b", line_cursor(0), RequestParams::new());
        store.clear();
        assert_eq!(store.active_count(), 0);
    }
}
