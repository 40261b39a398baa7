//! Session payload and collaborator types

use crate::chunking::TextEncoding;
use crate::tokens::TokenKind;
use serde::{Deserialize, Serialize};

/// One hit from a search collaborator
///
/// Streams are ordered by `(file_index, position)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchMatch {
    /// File containing the hit
    pub file: String,

    /// Index of `file` in the search's file order
    pub file_index: usize,

    /// 1-based line number for content hits, 0 for filename hits
    pub position: usize,

    /// Matching line, or the file name itself
    pub line: String,
}

impl SearchMatch {
    /// Ordering key used for resumption
    pub fn key(&self) -> (usize, usize) {
        (self.file_index, self.position)
    }
}

/// Which search a match stream came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchMode {
    Content,
    Filename,
}

impl SearchMode {
    /// Token kind for this search
    pub fn token_kind(&self) -> TokenKind {
        match self {
            SearchMode::Content => TokenKind::ContentSearch,
            SearchMode::Filename => TokenKind::FilenameSearch,
        }
    }
}

/// Payload of a line-oriented file chunk
#[derive(Debug, Clone, Serialize)]
pub struct LinesPayload<'a> {
    pub path: &'a str,
    pub content: String,
    pub start_line: usize,
    pub end_line: usize,
    pub total_lines: usize,
}

/// Payload of a byte-level file chunk
#[derive(Debug, Clone, Serialize)]
pub struct BytesPayload<'a> {
    pub path: &'a str,
    pub content: String,
    pub encoding: TextEncoding,
    pub start_offset: usize,
    pub next_offset: usize,
    pub total_bytes: usize,
}

/// Payload of a directory listing page
#[derive(Debug, Clone, Serialize)]
pub struct ListingPayload<'a> {
    pub path: &'a str,
    pub entries: Vec<String>,
    pub page: usize,
    pub total_entries: usize,
}

/// Payload of a search results chunk
#[derive(Debug, Clone, Serialize)]
pub struct SearchPayload<'a> {
    pub path: &'a str,
    pub mode: SearchMode,
    pub matches: Vec<SearchMatch>,
    pub total_matches: usize,
}
