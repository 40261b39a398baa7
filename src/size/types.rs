//! Size budget type definitions

use serde::{Deserialize, Serialize};

/// 0.9 MiB, kept below the common 1 MiB transport ceiling
pub const DEFAULT_MAX_BYTES: usize = 943_718;

/// Default near-limit warning ratio
pub const DEFAULT_WARNING_RATIO: f64 = 0.85;

/// Default multiplier applied to serialized lengths
pub const DEFAULT_SAFETY_MARGIN: f64 = 1.2;

/// Configuration for a size monitor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SizeConfig {
    /// Maximum estimated bytes per chunk (default: 943_718)
    #[serde(default = "default_max_bytes")]
    pub max_bytes: usize,

    /// Fraction of the budget after which the monitor reports near-limit (default: 0.85)
    #[serde(default = "default_warning_ratio")]
    pub warning_ratio: f64,

    /// Multiplier between serialized length and estimated wire size (default: 1.2)
    #[serde(default = "default_safety_margin")]
    pub safety_margin: f64,
}

fn default_max_bytes() -> usize {
    DEFAULT_MAX_BYTES
}

fn default_warning_ratio() -> f64 {
    DEFAULT_WARNING_RATIO
}

fn default_safety_margin() -> f64 {
    DEFAULT_SAFETY_MARGIN
}

impl Default for SizeConfig {
    fn default() -> Self {
        Self {
            max_bytes: DEFAULT_MAX_BYTES,
            warning_ratio: DEFAULT_WARNING_RATIO,
            safety_margin: DEFAULT_SAFETY_MARGIN,
        }
    }
}

impl SizeConfig {
    /// Default configuration with a different byte ceiling
    pub fn with_max_bytes(max_bytes: usize) -> Self {
        Self {
            max_bytes,
            ..Self::default()
        }
    }

    /// Replace the safety margin
    pub fn margin(mut self, safety_margin: f64) -> Self {
        self.safety_margin = safety_margin;
        self
    }
}

/// Read-only view of a monitor's state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SizeSnapshot {
    /// Estimated bytes committed so far
    pub current: usize,

    /// Budget ceiling
    pub max: usize,

    /// Bytes left before the ceiling
    pub remaining: usize,

    /// current / max × 100
    pub usage_percentage: f64,

    /// Whether the warning ratio has been passed
    pub near_limit: bool,
}
