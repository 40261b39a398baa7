//! Continuation token type definitions

use crate::errors::{ChunkError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Original request parameters replayed on resumption
pub type RequestParams = Map<String, Value>;

/// Closed set of resumable operations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenKind {
    FileRead,
    DirectoryList,
    ContentSearch,
    FilenameSearch,
}

impl TokenKind {
    /// Stable identifier used in token ids and logs
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenKind::FileRead => "file_read",
            TokenKind::DirectoryList => "directory_list",
            TokenKind::ContentSearch => "content_search",
            TokenKind::FilenameSearch => "filename_search",
        }
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Resume position inside a file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilePosition {
    /// Next line index for line-oriented reads
    Line(usize),
    /// Next byte offset for byte-level reads
    Byte(usize),
}

/// Kind-specific resumable cursor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Cursor {
    FileRead {
        position: FilePosition,
    },
    DirectoryList {
        page: usize,
        last_item: Option<String>,
    },
    ContentSearch {
        last_file: Option<String>,
        last_position: usize,
        file_index: usize,
    },
    FilenameSearch {
        last_file: Option<String>,
        last_position: usize,
        file_index: usize,
    },
}

impl Cursor {
    /// Kind of operation this cursor resumes
    pub fn kind(&self) -> TokenKind {
        match self {
            Cursor::FileRead { .. } => TokenKind::FileRead,
            Cursor::DirectoryList { .. } => TokenKind::DirectoryList,
            Cursor::ContentSearch { .. } => TokenKind::ContentSearch,
            Cursor::FilenameSearch { .. } => TokenKind::FilenameSearch,
        }
    }

    /// Search cursor of the given kind
    ///
    /// Non-search kinds fall back to a content search cursor.
    pub fn search(kind: TokenKind, last_file: Option<String>, last_position: usize, file_index: usize) -> Self {
        match kind {
            TokenKind::FilenameSearch => Cursor::FilenameSearch {
                last_file,
                last_position,
                file_index,
            },
            _ => Cursor::ContentSearch {
                last_file,
                last_position,
                file_index,
            },
        }
    }
}

/// Partial cursor update merged by `TokenStore::update`
///
/// `None` fields leave the stored value untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CursorPatch {
    pub line_start: Option<usize>,
    pub byte_offset: Option<usize>,
    pub page: Option<usize>,
    pub last_item: Option<String>,
    pub last_file: Option<String>,
    pub last_position: Option<usize>,
    pub file_index: Option<usize>,
    pub chunk_index: Option<usize>,
    pub params: Option<RequestParams>,
}

impl CursorPatch {
    /// Names of the supplied cursor fields
    fn supplied_fields(&self) -> Vec<&'static str> {
        let mut fields = Vec::new();
        if self.line_start.is_some() { fields.push("line_start"); }
        if self.byte_offset.is_some() { fields.push("byte_offset"); }
        if self.page.is_some() { fields.push("page"); }
        if self.last_item.is_some() { fields.push("last_item"); }
        if self.last_file.is_some() { fields.push("last_file"); }
        if self.last_position.is_some() { fields.push("last_position"); }
        if self.file_index.is_some() { fields.push("file_index"); }
        fields
    }

    /// Check every supplied field belongs to `kind`
    pub fn validate_for(&self, kind: TokenKind) -> Result<()> {
        let allowed: &[&str] = match kind {
            TokenKind::FileRead => &["line_start", "byte_offset"],
            TokenKind::DirectoryList => &["page", "last_item"],
            TokenKind::ContentSearch | TokenKind::FilenameSearch => {
                &["last_file", "last_position", "file_index"]
            }
        };

        if let Some(field) = self.supplied_fields().into_iter().find(|f| !allowed.contains(f)) {
            return Err(ChunkError::InvalidPatch {
                kind: kind.to_string(),
                field: field.to_string(),
            });
        }

        // A file cursor is either line- or byte-positioned, never both
        if self.line_start.is_some() && self.byte_offset.is_some() {
            return Err(ChunkError::InvalidPatch {
                kind: kind.to_string(),
                field: "byte_offset".to_string(),
            });
        }

        Ok(())
    }
}

/// Resumable state for one cut-off operation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContinuationToken {
    /// Opaque identifier handed to callers
    pub id: String,

    /// Path the operation targets
    pub target_path: String,

    /// Where to resume
    pub cursor: Cursor,

    /// Original request parameters
    pub params: RequestParams,

    /// Chunks delivered so far in this chain
    pub chunk_index: usize,

    /// Issue time; expiry is measured from here
    pub created_at: DateTime<Utc>,
}

impl ContinuationToken {
    /// Kind of the operation this token resumes
    pub fn kind(&self) -> TokenKind {
        self.cursor.kind()
    }

    /// Apply a validated patch
    pub(crate) fn apply(&mut self, patch: CursorPatch) {
        match &mut self.cursor {
            Cursor::FileRead { position } => {
                if let Some(n) = patch.line_start {
                    *position = FilePosition::Line(n);
                }
                if let Some(n) = patch.byte_offset {
                    *position = FilePosition::Byte(n);
                }
            }
            Cursor::DirectoryList { page, last_item } => {
                if let Some(p) = patch.page {
                    *page = p;
                }
                if let Some(item) = patch.last_item {
                    *last_item = Some(item);
                }
            }
            Cursor::ContentSearch { last_file, last_position, file_index }
            | Cursor::FilenameSearch { last_file, last_position, file_index } => {
                if let Some(file) = patch.last_file {
                    *last_file = Some(file);
                }
                if let Some(pos) = patch.last_position {
                    *last_position = pos;
                }
                if let Some(idx) = patch.file_index {
                    *file_index = idx;
                }
            }
        }

        if let Some(idx) = patch.chunk_index {
            self.chunk_index = idx;
        }

        if let Some(params) = patch.params {
            self.params.extend(params);
        }
    }
}
