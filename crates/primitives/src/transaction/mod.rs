//! Document change descriptions.
//!
//! A [`ChangeSet`] is a retain/delete/insert sequence covering the whole source
//! document. Besides applying it to a rope, the parse layer needs two views of a
//! change set: the list of [`ChangedRange`]s it touches, and position mapping with
//! an explicit [`Bias`].

mod changeset;
mod types;


pub use changeset::{ChangeSet, ChangedRanges};
pub use types::{Bias, Change, ChangedRange, Insertion, Operation, Tendril};
