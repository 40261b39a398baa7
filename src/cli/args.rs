//! Command-line argument parsing for chunkwise
//!
//! Provides clap-based CLI with subcommands and verbosity control.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// chunkwise - Page large outputs through size-bounded chunks
#[derive(Parser, Debug)]
#[command(name = "chunkwise")]
#[command(author = "Jerome (Kubashen) Naidoo")]
#[command(version)]
#[command(about = "Split oversized outputs into size-bounded chunks with continuation tokens", long_about = None)]
pub struct Args {
    /// Configuration file path
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Override the per-chunk byte budget
    #[arg(long, global = true)]
    pub max_bytes: Option<usize>,

    /// Override the byte-chunking probe step
    #[arg(long, global = true)]
    pub probe_step: Option<usize>,

    /// Verbosity level: -q (quiet), default (normal), -v (verbose), -vv (very verbose)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Quiet mode (envelopes only, no summary)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Subcommand
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Page through a file
    Read {
        /// File to read
        file: PathBuf,

        /// Chunk by encoded byte ranges instead of lines
        #[arg(long)]
        bytes: bool,

        /// Source encoding for --bytes (utf8, utf16le, latin1, ascii)
        #[arg(long, default_value = "utf8")]
        encoding: String,
    },

    /// Page through a directory listing
    List {
        /// Directory to list
        dir: PathBuf,

        /// Include subdirectories
        #[arg(short, long)]
        recursive: bool,
    },

    /// Page through search results
    Search {
        /// Root directory (or file) to search
        root: PathBuf,

        /// Substring to look for
        pattern: String,

        /// Match file names instead of file contents
        #[arg(long)]
        names: bool,
    },

    /// Display effective configuration
    Config,
}

/// Verbosity level enum
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verbosity {
    Quiet,
    Normal,
    Verbose,
    VeryVerbose,
}

impl Args {
    /// Get verbosity level based on flags
    pub fn verbosity(&self) -> Verbosity {
        if self.quiet {
            Verbosity::Quiet
        } else {
            match self.verbose {
                0 => Verbosity::Normal,
                1 => Verbosity::Verbose,
                _ => Verbosity::VeryVerbose,
            }
        }
    }
}

impl Verbosity {
    /// Convert to string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Verbosity::Quiet => "quiet",
            Verbosity::Normal => "normal",
            Verbosity::Verbose => "verbose",
            Verbosity::VeryVerbose => "very_verbose",
        }
    }

    /// Default tracing filter for this level
    pub fn log_level(&self) -> &'static str {
        match self {
            Verbosity::Quiet => "warn",
            Verbosity::Normal => "info",
            Verbosity::Verbose => "debug",
            Verbosity::VeryVerbose => "trace",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_read() {
        let args = Args::parse_from(["chunkwise", "read", "notes.txt", "--bytes", "--encoding", "latin1"]);
        match args.command {
            Commands::Read { file, bytes, encoding } => {
                assert_eq!(file, PathBuf::from("notes.txt"));
                assert!(bytes);
                assert_eq!(encoding, "latin1");
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_global_overrides() {
        let args = Args::parse_from(["chunkwise", "list", ".", "--max-bytes", "2048", "-vv"]);
        assert_eq!(args.max_bytes, Some(2048));
        assert_eq!(args.verbosity(), Verbosity::VeryVerbose);
    }

    #[test]
    fn test_quiet_wins() {
        let args = Args::parse_from(["chunkwise", "-q", "-v", "config"]);
        assert_eq!(args.verbosity(), Verbosity::Quiet);
        assert_eq!(args.verbosity().log_level(), "warn");
    }

    #[test]
    fn test_search_names_flag() {
        let args = Args::parse_from(["chunkwise", "search", "src", "TODO", "--names"]);
        assert!(matches!(args.command, Commands::Search { names: true, .. }));
    }
}
