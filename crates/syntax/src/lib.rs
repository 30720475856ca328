//! Incremental, viewport-aware parse scheduling.
//!
//! # Architecture
//!
//! * [`context`]: [`ParseContext`], the per-document incremental parse state
//! * [`state`]: [`LanguageState`], immutable snapshots published into editor state
//! * [`host`]: The editor-facing document state, transactions and the
//!   [`SyntaxHost`] a worker runs against
//! * [`scheduling`]: [`ParseWorker`], the budgeted background driver
//! * [`continuation`]: Tasks a parser asked to wait on
//! * [`queries`]: Synchronous access to trees for editor features
//!
//! Edits flow from a [`Transaction`] through [`DocState::apply`] into
//! [`LanguageState::apply`], which derives a successor context that reuses the
//! old tree's fragments. The worker then parses in slices and publishes new
//! snapshots back through [`StateEffect::SetLanguageState`].

pub mod config;
pub mod context;
pub mod continuation;
pub mod error;
pub mod host;
pub mod queries;
pub mod scheduling;
pub mod state;

#[cfg(test)]
mod tests;

pub use config::SyntaxConfig;
pub use context::{Budget, ParseContext, SharedContext};
pub use continuation::ContinuationSet;
pub use error::{ConfigError, Result};
pub use host::{DocState, StateEffect, SyntaxHost, Transaction, ViewUpdate};
pub use queries::{ensure_syntax_tree, force_parsing, syntax_parser_running, syntax_tree, syntax_tree_available};
pub use scheduling::{ParseWorker, WorkerPoll};
pub use state::{LanguageState, TransactionInfo};
pub use weft_language::continuation::{Continuation, ContinuationError, continuation};
