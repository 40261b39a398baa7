//! Running size monitor
//! Estimates serialized payload size and enforces a fixed byte budget

use crate::errors::{ChunkError, Result};
use crate::size::types::{SizeConfig, SizeSnapshot};
use serde::Serialize;

/// Tracks an estimated byte total against a fixed budget.
///
/// One monitor belongs to one logical operation. `current_bytes` only grows
/// through [`SizeMonitor::add`] / [`SizeMonitor::commit`]; [`SizeMonitor::reset`]
/// is the only way back to zero.
#[derive(Debug, Clone)]
pub struct SizeMonitor {
    /// Budget configuration
    config: SizeConfig,

    /// Estimated bytes committed so far
    current_bytes: usize,
}

impl SizeMonitor {
    /// Create monitor with default margin and warning ratio
    pub fn new(max_bytes: usize) -> Result<Self> {
        Self::with_config(SizeConfig::with_max_bytes(max_bytes))
    }

    /// Create monitor with custom configuration
    ///
    /// Fails fast on a zero budget so misconfiguration never reaches the
    /// chunking algorithms.
    pub fn with_config(config: SizeConfig) -> Result<Self> {
        if config.max_bytes == 0 {
            return Err(ChunkError::InvalidBudget {
                max_bytes: config.max_bytes,
            });
        }

        if !config.safety_margin.is_finite() || config.safety_margin <= 0.0 {
            return Err(ChunkError::ConfigError(format!(
                "safety_margin must be a positive number (got {})",
                config.safety_margin
            )));
        }

        if !(config.warning_ratio > 0.0 && config.warning_ratio <= 1.0) {
            return Err(ChunkError::ConfigError(format!(
                "warning_ratio must be within (0, 1] (got {})",
                config.warning_ratio
            )));
        }

        Ok(Self {
            config,
            current_bytes: 0,
        })
    }

    /// Estimate the wire size of a value
    ///
    /// ```text
    /// estimate_size(v) = ⌈len(json(v)) × safety_margin⌉
    /// ```
    ///
    /// Values that cannot be serialized are sized at `usize::MAX`, so they never fit.
    pub fn estimate_size<T: Serialize + ?Sized>(&self, value: &T) -> usize {
        match serde_json::to_vec(value) {
            Ok(bytes) => self.apply_margin(bytes.len()),
            Err(e) => {
                tracing::warn!(error = %e, "value is not serializable, treating as oversized");
                usize::MAX
            }
        }
    }

    /// Scale a raw serialized length by the safety margin
    pub fn apply_margin(&self, raw_len: usize) -> usize {
        (raw_len as f64 * self.config.safety_margin).ceil() as usize
    }

    /// Check whether a value would fit without committing it
    pub fn can_add<T: Serialize + ?Sized>(&self, value: &T) -> bool {
        self.can_fit(self.estimate_size(value))
    }

    /// Check whether an already-estimated size would fit
    pub fn can_fit(&self, estimated: usize) -> bool {
        self.current_bytes
            .checked_add(estimated)
            .map_or(false, |total| total < self.config.max_bytes)
    }

    /// Commit a value's estimated size
    ///
    /// Returns whether the post-commit total is still under budget.
    pub fn add<T: Serialize + ?Sized>(&mut self, value: &T) -> bool {
        let estimated = self.estimate_size(value);
        self.commit(estimated)
    }

    /// Commit an already-estimated size
    pub fn commit(&mut self, estimated: usize) -> bool {
        self.current_bytes = self.current_bytes.saturating_add(estimated);
        self.current_bytes < self.config.max_bytes
    }

    /// Check whether usage has passed the warning ratio
    pub fn is_near_limit(&self) -> bool {
        self.current_bytes as f64 > self.config.max_bytes as f64 * self.config.warning_ratio
    }

    /// Zero the running total; the budget itself is unchanged
    pub fn reset(&mut self) {
        self.current_bytes = 0;
    }

    /// Estimated bytes committed so far
    pub fn current(&self) -> usize {
        self.current_bytes
    }

    /// Budget ceiling
    pub fn max_bytes(&self) -> usize {
        self.config.max_bytes
    }

    /// Bytes left before the ceiling
    pub fn remaining(&self) -> usize {
        self.config.max_bytes.saturating_sub(self.current_bytes)
    }

    /// Get configuration
    pub fn config(&self) -> &SizeConfig {
        &self.config
    }

    /// Diagnostic view of the monitor
    pub fn snapshot(&self) -> SizeSnapshot {
        SizeSnapshot {
            current: self.current_bytes,
            max: self.config.max_bytes,
            remaining: self.remaining(),
            usage_percentage: (self.current_bytes as f64 / self.config.max_bytes as f64) * 100.0,
            near_limit: self.is_near_limit(),
        }
    }
}
