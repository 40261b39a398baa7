//! Integration tests for chunk sessions
//!
//! Full token chains over each source kind, expiry with a manual clock,
//! and the structural failure cases callers rely on.

use chrono::Duration;
use chunkwise::{
    chunking::{split_lines, ChunkingConfig, ChunkingEngine, TextEncoding},
    session::{ChunkSession, SearchMatch, SearchMode},
    size::SizeConfig,
    telemetry::TelemetryCollector,
    tokens::{ManualClock, RequestParams, TokenStore},
    ChunkError, ResponseEnvelope,
};
use serde_json::json;
use std::sync::Arc;

fn session(store: &TokenStore, max_bytes: usize) -> ChunkSession<'_> {
    ChunkSession::with_config(
        store,
        ChunkingEngine::with_config(ChunkingConfig { probe_step: 16 }),
        SizeConfig::with_max_bytes(max_bytes),
    )
}

fn params(path: &str) -> RequestParams {
    let mut params = RequestParams::new();
    params.insert("path".to_string(), json!(path));
    params
}

fn content(envelope: &ResponseEnvelope) -> String {
    envelope
        .field("content")
        .and_then(|v| v.as_str())
        .unwrap()
        .to_string()
}

#[test]
fn test_line_chain_reconstructs_text() {
    let store = TokenStore::new();
    let session = session(&store, 300);
    let text: String = (0..200).map(|i| format!("line number {:03}\n", i)).collect();

    let mut pieces = Vec::new();
    let mut resume: Option<String> = None;
    let mut chunks = 0;

    loop {
        let envelope = session
            .read_lines("/logs/app.log", &text, resume.as_deref(), params("/logs/app.log"))
            .unwrap();
        chunks += 1;
        assert_eq!(envelope.chunking.chunk_info.current_chunk, chunks);
        assert!(envelope.chunking.size_info.current_size < 300);
        pieces.push(content(&envelope));

        if !envelope.has_more() {
            assert!(envelope.continuation_token().is_none());
            break;
        }

        let id = envelope.continuation_token().unwrap().to_string();
        if let Some(used) = &resume {
            assert_ne!(used, &id);
            assert!(store.get(used).is_err());
        }
        assert_eq!(store.active_count(), 1);
        resume = Some(id);
    }

    assert!(chunks > 1);
    assert_eq!(pieces.join("\n"), split_lines(&text).join("\n"));
    assert_eq!(store.active_count(), 0);
}

#[test]
fn test_line_chain_reports_progress() {
    let store = TokenStore::new();
    let session = session(&store, 300);
    let text: String = (0..100).map(|i| format!("entry {:04}\n", i)).collect();

    let first = session.read_lines("/f", &text, None, params("/f")).unwrap();
    let info = &first.chunking.chunk_info;
    assert!(info.estimated_total_chunks.unwrap() > 1);
    assert!(info.progress_percentage.unwrap() < 100.0);
    assert_eq!(first.field("start_line"), Some(&json!(0)));
    assert_eq!(first.field("total_lines"), Some(&json!(100)));
}

#[test]
fn test_byte_chain_reconstructs_multibyte_text() {
    let store = TokenStore::new();
    let session = session(&store, 200);
    let text = "héllo wörld 😀 €uro ".repeat(40);
    let buffer = text.as_bytes();

    let mut rebuilt = String::new();
    let mut resume: Option<String> = None;
    let mut last_offset = 0;

    loop {
        let envelope = session
            .read_bytes("/data/utf8.txt", buffer, TextEncoding::Utf8, resume.as_deref(), RequestParams::new())
            .unwrap();
        let next = envelope.field("next_offset").and_then(|v| v.as_u64()).unwrap() as usize;
        assert!(next > last_offset);
        assert!(text.is_char_boundary(next));
        assert_eq!(&text[last_offset..next], content(&envelope));

        rebuilt.push_str(&content(&envelope));
        last_offset = next;

        if !envelope.has_more() {
            break;
        }
        resume = envelope.continuation_token().map(str::to_string);
    }

    assert_eq!(rebuilt, text);
    assert_eq!(store.active_count(), 0);
}

#[test]
fn test_directory_chain_pages_in_order() {
    let store = TokenStore::new();
    let session = session(&store, 200);
    let entries: Vec<String> = (0..60).map(|i| format!("FILE       report_{:02}.csv", i)).collect();

    let mut seen = Vec::new();
    let mut resume: Option<String> = None;
    let mut page = 0;

    loop {
        let envelope = session
            .list_directory("/reports", entries.clone(), resume.as_deref(), params("/reports"))
            .unwrap();
        page += 1;
        assert_eq!(envelope.field("page"), Some(&json!(page)));
        assert_eq!(envelope.field("total_entries"), Some(&json!(60)));

        let batch: Vec<String> = serde_json::from_value(envelope.field("entries").unwrap().clone()).unwrap();
        assert!(!batch.is_empty());
        seen.extend(batch);

        if !envelope.has_more() {
            break;
        }
        resume = envelope.continuation_token().map(str::to_string);
    }

    assert!(page > 1);
    assert_eq!(seen, entries);
}

#[test]
fn test_directory_stale_cursor() {
    let store = TokenStore::new();
    let session = session(&store, 200);
    let entries: Vec<String> = (0..40).map(|i| format!("FILE       f{:02}", i)).collect();

    let first = session.list_directory("/d", entries.clone(), None, RequestParams::new()).unwrap();
    let batch: Vec<String> = serde_json::from_value(first.field("entries").unwrap().clone()).unwrap();
    let last = batch.last().unwrap().clone();

    let shrunk: Vec<String> = entries.into_iter().filter(|e| *e != last).collect();
    let result = session.list_directory("/d", shrunk, first.continuation_token(), RequestParams::new());
    assert!(matches!(result, Err(ChunkError::StaleCursor(_))));
}

#[test]
fn test_search_chain_preserves_match_order() {
    let store = TokenStore::new();
    let session = session(&store, 400);
    let matches: Vec<SearchMatch> = (0..10)
        .flat_map(|f| {
            (1..=5).map(move |line| SearchMatch {
                file: format!("src/mod_{}.rs", f),
                file_index: f,
                position: line * 10,
                line: format!("// needle {} {}", f, line),
            })
        })
        .collect();

    let mut seen: Vec<SearchMatch> = Vec::new();
    let mut resume: Option<String> = None;

    loop {
        let envelope = session
            .search(SearchMode::Content, "/src", matches.clone(), resume.as_deref(), params("/src"))
            .unwrap();
        let batch: Vec<SearchMatch> = serde_json::from_value(envelope.field("matches").unwrap().clone()).unwrap();
        seen.extend(batch);

        if !envelope.has_more() {
            break;
        }
        let id = envelope.continuation_token().unwrap().to_string();
        let token = store.get(&id).unwrap();
        assert_eq!(token.kind(), chunkwise::TokenKind::ContentSearch);
        resume = Some(id);
    }

    assert_eq!(seen, matches);
}

#[test]
fn test_token_expiry_window() {
    let clock = Arc::new(ManualClock::default());
    let store = TokenStore::with_clock(Duration::minutes(30), clock.clone());
    let session = ChunkSession::with_config(
        &store,
        ChunkingEngine::new(),
        SizeConfig::with_max_bytes(12).margin(1.0),
    );
    let text = "a\nb\nc\n";

    // Resumed inside the window
    let first = session.read_lines("/f", text, None, RequestParams::new()).unwrap();
    assert_eq!(content(&first), "a\nb");
    clock.advance(Duration::minutes(29));
    let second = session
        .read_lines("/f", text, first.continuation_token(), RequestParams::new())
        .unwrap();
    assert_eq!(content(&second), "c");
    assert!(!second.has_more());

    // Expired past the window
    let third = session.read_lines("/f", text, None, RequestParams::new()).unwrap();
    let id = third.continuation_token().unwrap().to_string();
    assert_eq!(store.active_count(), 1);

    clock.advance(Duration::minutes(31));
    let result = session.read_lines("/f", text, Some(&id), RequestParams::new());
    assert!(matches!(result, Err(ChunkError::TokenNotFound(_))));
    assert_eq!(store.active_count(), 0);
}

#[test]
fn test_reused_token_never_skips_lines() {
    let store = TokenStore::new();
    let session = ChunkSession::with_config(
        &store,
        ChunkingEngine::new(),
        SizeConfig::with_max_bytes(12).margin(1.0),
    );
    let text = "a\nb\nc\nd\ne\nf\ng\n";

    let first = session.read_lines("/f", text, None, RequestParams::new()).unwrap();
    assert_eq!(content(&first), "a\nb");
    let used = first.continuation_token().unwrap().to_string();

    let second = session.read_lines("/f", text, Some(&used), RequestParams::new()).unwrap();
    assert_eq!(content(&second), "c\nd");

    // A replayed token is gone rather than resuming past "c\nd"
    let replay = session.read_lines("/f", text, Some(&used), RequestParams::new());
    assert!(matches!(replay, Err(ChunkError::TokenNotFound(_))));

    let third = session
        .read_lines("/f", text, second.continuation_token(), RequestParams::new())
        .unwrap();
    assert_eq!(content(&third), "e\nf");
}

#[test]
fn test_token_lifetime_starts_at_each_chunk() {
    let clock = Arc::new(ManualClock::default());
    let store = TokenStore::with_clock(Duration::minutes(30), clock.clone());
    let session = ChunkSession::with_config(
        &store,
        ChunkingEngine::new(),
        SizeConfig::with_max_bytes(12).margin(1.0),
    );
    let text = "a\nb\nc\nd\ne\nf\n";

    let first = session.read_lines("/f", text, None, RequestParams::new()).unwrap();
    clock.advance(Duration::minutes(20));
    let second = session
        .read_lines("/f", text, first.continuation_token(), RequestParams::new())
        .unwrap();

    // 35 minutes into the chain, 15 since the second chunk
    clock.advance(Duration::minutes(15));
    let third = session
        .read_lines("/f", text, second.continuation_token(), RequestParams::new())
        .unwrap();
    assert_eq!(content(&third), "e\nf");
    assert!(!third.has_more());
    assert_eq!(third.chunking.chunk_info.current_chunk, 3);
}

#[test]
fn test_malformed_bytes_are_reported() {
    let store = TokenStore::new();
    let session = ChunkSession::new(&store);
    let mut buffer = vec![b'a'; 120];
    buffer.push(0xFF);
    buffer.extend_from_slice(b"tail");

    let first = session
        .read_bytes("/bin", &buffer, TextEncoding::Utf8, None, RequestParams::new())
        .unwrap();
    assert_eq!(content(&first), "a".repeat(120));
    assert_eq!(first.field("next_offset"), Some(&json!(120)));
    assert!(first.has_more());

    let result = session.read_bytes("/bin", &buffer, TextEncoding::Utf8, first.continuation_token(), RequestParams::new());
    match result {
        Err(ChunkError::MalformedInput { offset, encoding }) => {
            assert_eq!(offset, 120);
            assert_eq!(encoding, "utf8");
        }
        other => panic!("expected malformed input error, got {:?}", other),
    }
    assert_eq!(store.active_count(), 0);
}

#[test]
fn test_malformed_first_byte_issues_no_token() {
    let store = TokenStore::new();
    let collector = TelemetryCollector::new();
    let session = ChunkSession::new(&store).with_telemetry(collector.clone());

    let result = session.read_bytes("/bin", &[0x80, b'a'], TextEncoding::Ascii, None, RequestParams::new());
    assert!(matches!(result, Err(ChunkError::MalformedInput { offset: 0, .. })));
    assert_eq!(store.active_count(), 0);
    assert_eq!(collector.stats().decode_failures, 1);
    assert_eq!(collector.stats().non_progress, 0);
}

#[test]
fn test_oversized_line_is_reported() {
    let store = TokenStore::new();
    let session = session(&store, 100);
    let text = format!("short\n{}\nafter\n", "x".repeat(400));

    let first = session.read_lines("/f", &text, None, RequestParams::new()).unwrap();
    assert_eq!(content(&first), "short");
    assert!(first.has_more());

    let result = session.read_lines("/f", &text, first.continuation_token(), RequestParams::new());
    assert!(matches!(result, Err(ChunkError::UnitTooLarge { cursor: 1, budget: 100 })));
    assert_eq!(store.active_count(), 0);
}

#[test]
fn test_oversized_first_item_issues_no_token() {
    let store = TokenStore::new();
    let session = session(&store, 50);
    let entries = vec!["x".repeat(200), "small".to_string()];

    let result = session.list_directory("/d", entries, None, RequestParams::new());
    assert!(matches!(result, Err(ChunkError::UnitTooLarge { cursor: 0, .. })));
    assert_eq!(store.active_count(), 0);
}

#[test]
fn test_token_kind_and_target_checks() {
    let store = TokenStore::new();
    let session = session(&store, 40);
    let text = "one\ntwo\nthree\nfour\nfive\nsix\n";

    let first = session.read_lines("/f", text, None, RequestParams::new()).unwrap();
    let id = first.continuation_token().unwrap();

    let wrong_kind = session.list_directory("/f", vec![], Some(id), RequestParams::new());
    assert!(matches!(wrong_kind, Err(ChunkError::TokenKindMismatch { .. })));

    let wrong_target = session.read_lines("/other", text, Some(id), RequestParams::new());
    assert!(matches!(wrong_target, Err(ChunkError::TargetMismatch { .. })));

    let wrong_mode = session.read_bytes("/f", text.as_bytes(), TextEncoding::Utf8, Some(id), RequestParams::new());
    assert!(matches!(wrong_mode, Err(ChunkError::StaleCursor(_))));

    // Failed resumptions leave the token usable
    assert!(session.read_lines("/f", text, Some(id), RequestParams::new()).is_ok());
}

#[test]
fn test_unknown_token() {
    let store = TokenStore::new();
    let session = session(&store, 1000);
    let result = session.read_lines("/f", "a\n", Some("file_read_0_missing"), RequestParams::new());
    assert!(matches!(result, Err(ChunkError::TokenNotFound(_))));
}

#[test]
fn test_single_chunk_issues_no_token() {
    let store = TokenStore::new();
    let session = ChunkSession::new(&store);
    let envelope = session.read_lines("/f", "tiny\nfile\n", None, RequestParams::new()).unwrap();
    assert!(!envelope.has_more());
    assert!(envelope.continuation_token().is_none());
    assert_eq!(envelope.chunking.chunk_info.estimated_total_chunks, Some(1));
    assert_eq!(store.active_count(), 0);
}

#[test]
fn test_telemetry_counts_chain() {
    let store = TokenStore::new();
    let collector = TelemetryCollector::new();
    let session = ChunkSession::with_config(
        &store,
        ChunkingEngine::new(),
        SizeConfig::with_max_bytes(12).margin(1.0),
    )
    .with_telemetry(collector.clone());
    let text = "a\nb\nc\nd\ne\n";

    let mut resume: Option<String> = None;
    loop {
        let envelope = session.read_lines("/f", text, resume.as_deref(), RequestParams::new()).unwrap();
        if !envelope.has_more() {
            break;
        }
        resume = envelope.continuation_token().map(str::to_string);
    }

    let stats = collector.stats();
    assert_eq!(stats.chunks_emitted, 3);
    assert_eq!(stats.tokens_issued, 1);
    assert_eq!(stats.tokens_advanced, 1);
    assert_eq!(stats.tokens_completed, 1);
    assert_eq!(stats.non_progress, 0);
}
