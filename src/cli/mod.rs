//! CLI module for chunkwise
//!
//! Handles command-line argument parsing and configuration management.

pub mod config;
pub mod args;

pub use config::{Config, TokensConfig, MAX_TOKEN_TTL_SECS};
pub use args::{Args, Commands, Verbosity};
