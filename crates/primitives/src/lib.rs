//! Core types for incremental parsing: character positions, change sets and clocks.

/// Monotonic time sources.
pub mod clock;
/// Character index types and range helpers.
pub mod range;
/// Document change descriptions and position mapping.
pub mod transaction;

pub use clock::{Clock, ManualClock, SystemClock};
pub use range::{CharIdx, CharLen};
pub use ropey::{Rope, RopeSlice};
pub use transaction::{Bias, Change, ChangeSet, ChangedRange, ChangedRanges};
