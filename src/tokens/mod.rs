//! Continuation tokens
//!
//! Opaque ids referencing typed cursor state so a cut-off operation can be
//! resumed exactly where it stopped.

pub mod clock;
pub mod store;
pub mod types;

pub use clock::{Clock, ManualClock, SystemClock};
pub use store::{TokenStore, DEFAULT_TOKEN_TTL_SECS};
pub use types::{ContinuationToken, Cursor, CursorPatch, FilePosition, RequestParams, TokenKind};
