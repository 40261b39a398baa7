//! Filesystem collaborators
//!
//! Produce the raw data the chunking engine consumes:
//! - list_entries: sorted directory listing
//! - search_content / search_filenames: ordered match streams
//! - read_text / read_raw: whole-file buffers
//!
//! Listings are sorted so a resumed page sees the same order.

use crate::errors::{ChunkError, Result};
use crate::session::SearchMatch;
use std::fs;
use std::path::{Path, PathBuf};

/// List directory contents, one `TYPE name` line per entry
pub fn list_entries(path: &Path, recursive: bool) -> Result<Vec<String>> {
    if !path.is_dir() {
        return Err(ChunkError::Generic(format!(
            "Path is not a directory: {}",
            path.display()
        )));
    }

    let mut entries = Vec::new();
    if recursive {
        list_recursive_helper(path, path, &mut entries)?;
    } else {
        list_single_level(path, &mut entries)?;
    }

    entries.sort();
    Ok(entries)
}

fn list_single_level(path: &Path, entries: &mut Vec<String>) -> Result<()> {
    for entry in fs::read_dir(path)? {
        let entry = entry?;
        let name = entry.file_name().to_string_lossy().to_string();

        let entry_type = match entry.metadata() {
            Ok(meta) if meta.is_dir() => "DIR",
            Ok(meta) if meta.is_file() => "FILE",
            Ok(_) => "OTHER",
            Err(_) => "UNKNOWN",
        };

        entries.push(format!("{:<10} {}", entry_type, name));
    }
    Ok(())
}

fn list_recursive_helper(base: &Path, current: &Path, entries: &mut Vec<String>) -> Result<()> {
    for entry in fs::read_dir(current)? {
        let path = entry?.path();
        let relative = path.strip_prefix(base).unwrap_or(&path);
        let name = relative.to_string_lossy().to_string();

        if path.is_dir() {
            entries.push(format!("DIR  {}/", name));
            list_recursive_helper(base, &path, entries)?;
        } else {
            entries.push(format!("FILE {}", name));
        }
    }
    Ok(())
}

/// All regular files under `root`, sorted
pub fn collect_files(root: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    collect_files_helper(root, &mut files)?;
    files.sort();
    Ok(files)
}

fn collect_files_helper(current: &Path, files: &mut Vec<PathBuf>) -> Result<()> {
    if current.is_file() {
        files.push(current.to_path_buf());
        return Ok(());
    }

    for entry in fs::read_dir(current)? {
        let path = entry?.path();
        if path.is_dir() {
            collect_files_helper(&path, files)?;
        } else if path.is_file() {
            files.push(path);
        }
    }
    Ok(())
}

fn display_name(root: &Path, path: &Path) -> String {
    path.strip_prefix(root)
        .ok()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or(path)
        .to_string_lossy()
        .to_string()
}

/// Lines containing `pattern`, in file order then line order
///
/// Files that are not valid UTF-8 are skipped.
pub fn search_content(root: &Path, pattern: &str) -> Result<Vec<SearchMatch>> {
    let mut matches = Vec::new();

    for (file_index, path) in collect_files(root)?.iter().enumerate() {
        let Ok(text) = String::from_utf8(fs::read(path)?) else {
            tracing::debug!(file = %path.display(), "skipping non-UTF-8 file");
            continue;
        };

        let file = display_name(root, path);
        for (i, line) in text.lines().enumerate() {
            if line.contains(pattern) {
                matches.push(SearchMatch {
                    file: file.clone(),
                    file_index,
                    position: i + 1,
                    line: line.to_string(),
                });
            }
        }
    }

    Ok(matches)
}

/// Files whose name contains `pattern`, in file order
pub fn search_filenames(root: &Path, pattern: &str) -> Result<Vec<SearchMatch>> {
    let matches = collect_files(root)?
        .iter()
        .enumerate()
        .filter_map(|(file_index, path)| {
            let name = path.file_name()?.to_string_lossy().to_string();
            name.contains(pattern).then(|| SearchMatch {
                file: display_name(root, path),
                file_index,
                position: 0,
                line: name,
            })
        })
        .collect();
    Ok(matches)
}

/// Read a file as UTF-8 text
pub fn read_text(path: &Path) -> Result<String> {
    fs::read_to_string(path).map_err(|e| {
        ChunkError::Generic(format!("Failed to read file {}: {}", path.display(), e))
    })
}

/// Read a file as raw bytes
pub fn read_raw(path: &Path) -> Result<Vec<u8>> {
    fs::read(path).map_err(|e| {
        ChunkError::Generic(format!("Failed to read file {}: {}", path.display(), e))
    })
}
