//! Syntax trees and the incremental parser boundary.
//!
//! # Architecture
//!
//! * [`tree`]: Immutable, shareable syntax trees
//! * [`fragment`]: Pieces of old trees that survive an edit
//! * [`input`]: Character-indexed text access for parsers
//! * [`parser`]: The [`Parser`] / [`PartialParse`] interface and the [`ParseScope`]
//!   a parse talks back through
//! * [`language`]: Named parsers
//!
//! With the `testing` feature, [`testing`] provides a small bracket grammar that
//! exercises every part of the interface: fragment reuse, stop points, deferred
//! regions and continuations.

pub mod continuation;
pub mod fragment;
pub mod input;
pub mod language;
pub mod parser;
#[cfg(any(test, feature = "testing"))]
pub mod testing;
pub mod tree;

pub use continuation::{Continuation, ContinuationError, continuation};
pub use fragment::{DEFAULT_MIN_GAP, FragmentList, TreeFragment, cut_fragments};
pub use input::{DocInput, Input, MAX_CHUNK};
pub use language::Language;
pub use parser::{DetachedScope, ParseScope, Parser, PartialParse, parse_all};
pub use tree::{Child, NodeType, Tree};
