//! Read access to syntax trees for editor features.

use std::time::Duration;

use weft_language::Tree;
use weft_primitives::CharIdx;

use crate::host::{DocState, SyntaxHost, Transaction};
use crate::scheduling::ParseWorker;

/// The published tree, or the empty tree when the document has no language.
///
/// The tree may be incomplete; see [`ensure_syntax_tree`] for one that covers a
/// given range.
pub fn syntax_tree(state: &DocState) -> Tree {
	state.syntax().map_or_else(Tree::empty, |syntax| syntax.tree().clone())
}

/// Returns true if the parse context covers `upto`, or the whole document with
/// `None`.
pub fn syntax_tree_available(state: &DocState, upto: Option<CharIdx>) -> bool {
	let Some(syntax) = state.syntax() else {
		return false;
	};
	let upto = upto.unwrap_or_else(|| state.doc().len_chars());
	syntax.context().lock().is_done(upto)
}

/// Parses up to `upto` synchronously, for at most `timeout`.
///
/// The viewport is widened to `0..upto` for the duration so deferred regions in
/// range are parsed properly, then restored. Returns the context's tree if it
/// covers `upto` afterwards.
pub fn ensure_syntax_tree(state: &DocState, upto: Option<CharIdx>, timeout: Duration) -> Option<Tree> {
	let syntax = state.syntax()?;
	let upto = upto.unwrap_or_else(|| state.doc().len_chars());
	let mut cx = syntax.context().lock();

	let previous = cx.viewport().clone();
	cx.update_viewport(0..upto);
	let covered = cx.is_done(upto) || cx.work(timeout, Some(upto));
	let tree = covered.then(|| cx.tree().clone());
	cx.update_viewport(previous);

	tracing::trace!(target: "weft_syntax::queries", upto, covered, "queries.ensure_syntax_tree");
	tree
}

/// Like [`ensure_syntax_tree`] for the host's state, defaulting to the end of
/// the viewport. Dispatches an empty transaction when the result is newer than
/// the published tree so the view picks it up. Returns true if the range is
/// covered.
pub fn force_parsing(host: &mut dyn SyntaxHost, upto: Option<CharIdx>, timeout: Duration) -> bool {
	let upto = upto.unwrap_or_else(|| host.viewport().end);
	let state = host.state();
	if state.syntax().is_none() {
		return false;
	}

	let tree = ensure_syntax_tree(state, Some(upto), timeout);
	let published = syntax_tree(state);
	if tree.as_ref().is_none_or(|tree| !tree.ptr_eq(&published)) {
		host.dispatch(Transaction::empty());
	}
	tree.is_some()
}

/// True while the worker has a slice scheduled or continuations outstanding.
pub fn syntax_parser_running(worker: &ParseWorker) -> bool {
	worker.is_working()
}
