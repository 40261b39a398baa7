//! Configuration management for chunkwise
//!
//! Provides TOML-based configuration with defaults and validation.
//! Location: ~/.chunkwise/config.toml

use crate::chunking::ChunkingConfig;
use crate::errors::{ChunkError, Result};
use crate::size::SizeConfig;
use crate::tokens::{TokenStore, DEFAULT_TOKEN_TTL_SECS};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Complete configuration for chunkwise
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub size: SizeConfig,

    #[serde(default)]
    pub tokens: TokensConfig,

    #[serde(default)]
    pub chunking: ChunkingConfig,
}

/// Longest accepted token lifetime (7 days)
pub const MAX_TOKEN_TTL_SECS: u64 = 7 * 24 * 60 * 60;

/// Continuation token configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokensConfig {
    /// Token lifetime in seconds (default: 1800)
    #[serde(default = "default_ttl_secs")]
    pub ttl_secs: u64,
}

fn default_ttl_secs() -> u64 {
    DEFAULT_TOKEN_TTL_SECS
}

impl Default for TokensConfig {
    fn default() -> Self {
        Self {
            ttl_secs: DEFAULT_TOKEN_TTL_SECS,
        }
    }
}

impl Config {
    /// Load configuration from file or use defaults
    pub fn load(path: Option<PathBuf>) -> Result<Self> {
        if let Some(config_path) = path {
            Self::load_from_file(&config_path)
        } else {
            Self::load_default()
        }
    }

    /// Load configuration from specific file
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ChunkError::ConfigError(format!("Failed to read config: {}", e)))?;

        let config: Config = toml::from_str(&contents)
            .map_err(|e| ChunkError::ConfigError(format!("Failed to parse config: {}", e)))?;

        config.validate()?;
        Ok(config)
    }

    /// Load default configuration from standard location or use built-in defaults
    pub fn load_default() -> Result<Self> {
        if let Some(config_path) = Self::default_path() {
            if config_path.exists() {
                return Self::load_from_file(&config_path);
            }
        }

        Ok(Config::default())
    }

    /// Standard configuration location
    pub fn default_path() -> Option<PathBuf> {
        dirs::home_dir().map(|home| home.join(".chunkwise").join("config.toml"))
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if self.size.max_bytes == 0 {
            return Err(ChunkError::ConfigError(
                "max_bytes must be greater than 0".to_string()
            ));
        }

        if !(self.size.warning_ratio > 0.0 && self.size.warning_ratio <= 1.0) {
            return Err(ChunkError::ConfigError(
                "warning_ratio must be within (0.0, 1.0]".to_string()
            ));
        }

        if !self.size.safety_margin.is_finite() || self.size.safety_margin < 1.0 {
            return Err(ChunkError::ConfigError(
                "safety_margin must be a finite number >= 1.0".to_string()
            ));
        }

        if self.tokens.ttl_secs == 0 || self.tokens.ttl_secs > MAX_TOKEN_TTL_SECS {
            return Err(ChunkError::ConfigError(format!(
                "ttl_secs must be within 1..={} (got {})",
                MAX_TOKEN_TTL_SECS, self.tokens.ttl_secs
            )));
        }

        if self.chunking.probe_step == 0 {
            return Err(ChunkError::ConfigError(
                "probe_step must be greater than 0".to_string()
            ));
        }

        Ok(())
    }

    /// Save configuration to file
    pub fn save(&self, path: &Path) -> Result<()> {
        let contents = toml::to_string_pretty(self)
            .map_err(|e| ChunkError::ConfigError(format!("Failed to serialize config: {}", e)))?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| ChunkError::ConfigError(format!("Failed to create config dir: {}", e)))?;
        }

        std::fs::write(path, contents)
            .map_err(|e| ChunkError::ConfigError(format!("Failed to write config: {}", e)))?;

        Ok(())
    }

    /// Apply command-line overrides, then re-validate
    pub fn with_overrides(mut self, max_bytes: Option<usize>, probe_step: Option<usize>) -> Result<Self> {
        if let Some(max_bytes) = max_bytes {
            self.size.max_bytes = max_bytes;
        }
        if let Some(probe_step) = probe_step {
            self.chunking.probe_step = probe_step;
        }
        self.validate()?;
        Ok(self)
    }

    /// Build the token store described by this configuration
    pub fn token_store(&self) -> Result<TokenStore> {
        let ttl = i64::try_from(self.tokens.ttl_secs)
            .ok()
            .and_then(chrono::Duration::try_seconds)
            .ok_or_else(|| {
                ChunkError::ConfigError(format!("ttl_secs {} is out of range", self.tokens.ttl_secs))
            })?;
        Ok(TokenStore::with_ttl(ttl))
    }
}
