//! Data source collaborators for the chunkwise binary

pub mod filesystem;

pub use filesystem::{collect_files, list_entries, read_raw, read_text, search_content, search_filenames};
