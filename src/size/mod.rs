//! Response size budgeting
//! Estimates wire size with a safety margin and enforces a per-chunk byte budget

pub mod monitor;
pub mod types;

pub use monitor::SizeMonitor;
pub use types::{SizeConfig, SizeSnapshot};
pub use types::{DEFAULT_MAX_BYTES, DEFAULT_SAFETY_MARGIN, DEFAULT_WARNING_RATIO};
