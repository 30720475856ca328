//! Published syntax snapshots.

use std::sync::Arc;

use weft_language::{Language, Tree};
use weft_primitives::{Bias, ChangeSet, Clock, Rope, SystemClock};

use crate::config::SyntaxConfig;
use crate::context::{ParseContext, SharedContext};

/// The parts of a transaction a [`LanguageState`] needs to follow an edit.
#[derive(Debug, Clone, Copy)]
pub struct TransactionInfo<'a> {
	pub changes: &'a ChangeSet,
	/// Document before the transaction.
	pub start_doc: &'a Rope,
	/// Document after the transaction.
	pub doc: &'a Rope,
}

/// An immutable snapshot of a document's syntax.
///
/// The tree is fixed at construction. The context behind it keeps evolving as
/// the worker parses, so a snapshot whose tree no longer matches its context
/// is stale and gets replaced on the next transaction or publish.
#[derive(Debug, Clone)]
pub struct LanguageState {
	tree: Tree,
	context: SharedContext,
}

impl LanguageState {
	/// Snapshots the context's current tree.
	pub fn new(context: SharedContext) -> Self {
		let tree = context.lock().tree().clone();
		Self { tree, context }
	}

	/// Parses the start of `doc` within the apply budget.
	pub fn init(doc: &Rope, language: &Language, config: &SyntaxConfig) -> Self {
		Self::init_with_clock(doc, language, config, Arc::new(SystemClock))
	}

	/// Like [`init`](Self::init), with budgets measured on `clock`. Successor
	/// states keep the clock.
	pub fn init_with_clock(doc: &Rope, language: &Language, config: &SyntaxConfig, clock: Arc<dyn Clock>) -> Self {
		let viewport_end = config.init_viewport.min(doc.len_chars());
		let mut cx = ParseContext::create(language.parser().clone(), doc.clone(), 0..viewport_end)
			.with_min_gap(config.min_fragment_gap)
			.with_clock(clock);
		if !cx.work(config.apply_budget(), Some(viewport_end)) {
			cx.take_tree();
		}
		tracing::debug!(
			target: "weft_syntax::state",
			language = language.name(),
			tree_len = cx.tree_len(),
			doc_len = doc.len_chars(),
			"state.init"
		);
		Self::new(cx.into_shared())
	}

	/// Derives the snapshot for the document after `tr`.
	pub fn apply(&self, tr: &TransactionInfo<'_>, config: &SyntaxConfig) -> Self {
		let mut cx = self.context.lock();
		if tr.changes.is_identity() && cx.tree().ptr_eq(&self.tree) {
			return self.clone();
		}

		let mut next = cx.changes(tr.changes, tr.doc.clone());
		let upto = (cx.tree_len() != tr.start_doc.len_chars())
			.then(|| tr.changes.map_pos(cx.tree_len(), Bias::Left).max(next.viewport().end));
		drop(cx);

		if !next.work(config.apply_budget(), upto) {
			next.take_tree();
		}
		Self::new(next.into_shared())
	}

	pub fn tree(&self) -> &Tree {
		&self.tree
	}

	pub fn context(&self) -> &SharedContext {
		&self.context
	}

	/// Returns true if the context has a newer tree than this snapshot.
	pub fn is_stale(&self) -> bool {
		!self.context.lock().tree().ptr_eq(&self.tree)
	}
}
