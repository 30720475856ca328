//! Per-document parse state.
//!
//! A [`ParseContext`] owns the committed tree, the fragments it can reuse, the
//! priority viewport and the ranges the parser deferred. Work is done in
//! budgeted calls to [`ParseContext::work`]; an edit produces a successor
//! context through [`ParseContext::changes`] rather than mutating the old one.

use std::fmt;
use std::ops::Range;
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use weft_language::{
	Continuation, DocInput, FragmentList, Parser, PartialParse, Tree, TreeFragment, cut_fragments,
};
use weft_primitives::range::overlaps;
use weft_primitives::{Bias, ChangeSet, CharIdx, Clock, Rope, SystemClock};

mod scope;
mod skipping;
#[cfg(test)]
mod tests;

use scope::ContextScope;

/// A parse context shared between the published language state and the worker.
pub type SharedContext = Arc<Mutex<ParseContext>>;

/// How long a call to [`ParseContext::work`] may run.
///
/// Durations and deadlines are measured on the context's [`Clock`]. The check happens after every parser step, so a single slow step can
/// overrun the budget by its own duration.
pub enum Budget<'a> {
	/// Stop once this much time has passed.
	Duration(Duration),
	/// Stop once this instant has passed.
	Deadline(Instant),
	/// Stop as soon as the predicate returns true.
	Until(&'a mut dyn FnMut() -> bool),
}

impl<'a> Budget<'a> {
	fn into_predicate(self, clock: &Arc<dyn Clock>) -> Box<dyn FnMut() -> bool + 'a> {
		let deadline = match self {
			Budget::Duration(duration) => clock.now() + duration,
			Budget::Deadline(deadline) => deadline,
			Budget::Until(should_stop) => return Box::new(should_stop),
		};
		let clock = clock.clone();
		Box::new(move || clock.now() > deadline)
	}
}

impl From<Duration> for Budget<'_> {
	fn from(duration: Duration) -> Self {
		Budget::Duration(duration)
	}
}

impl From<Instant> for Budget<'_> {
	fn from(deadline: Instant) -> Self {
		Budget::Deadline(deadline)
	}
}

impl<'a, F: FnMut() -> bool> From<&'a mut F> for Budget<'a> {
	fn from(should_stop: &'a mut F) -> Self {
		Budget::Until(should_stop)
	}
}

/// Parse state for one document under one language.
pub struct ParseContext {
	parser: Arc<dyn Parser>,
	doc: Rope,
	fragments: FragmentList,
	tree: Tree,
	/// Prefix of the document `tree` is valid for.
	tree_len: CharIdx,
	viewport: Range<CharIdx>,
	/// Ranges the parser deferred until they come into view.
	skipped: Vec<Range<CharIdx>>,
	/// Placeholder ranges whose fragments are dropped once the tree is absorbed.
	temp_skipped: Vec<Range<CharIdx>>,
	schedule_on: Option<Continuation>,
	parse: Option<Box<dyn PartialParse>>,
	/// Unchanged stretches between edits shorter than this are not kept as fragments.
	min_gap: usize,
	clock: Arc<dyn Clock>,
}

impl ParseContext {
	/// Creates a context with nothing parsed yet.
	pub fn create(parser: Arc<dyn Parser>, doc: Rope, viewport: Range<CharIdx>) -> Self {
		Self {
			parser,
			doc,
			fragments: FragmentList::new(),
			tree: Tree::empty(),
			tree_len: 0,
			viewport,
			skipped: Vec::new(),
			temp_skipped: Vec::new(),
			schedule_on: None,
			parse: None,
			min_gap: 0,
			clock: Arc::new(SystemClock),
		}
	}

	/// Measures [`Budget::Duration`] and [`Budget::Deadline`] on `clock`.
	pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
		self.clock = clock;
		self
	}

	/// Sets the smallest unchanged stretch between two edits that is kept for
	/// reuse. Zero, the default, keeps every piece an edit did not touch.
	pub fn with_min_gap(mut self, min_gap: usize) -> Self {
		self.min_gap = min_gap;
		self
	}

	/// Wraps the context for sharing.
	pub fn into_shared(self) -> SharedContext {
		Arc::new(Mutex::new(self))
	}

	/// Parses until the tree covers `upto` (or the whole document with `None`)
	/// or the budget runs out. Returns true if the target was reached.
	pub fn work<'a>(&mut self, budget: impl Into<Budget<'a>>, upto: Option<CharIdx>) -> bool {
		let doc_len = self.doc.len_chars();
		let upto = upto.filter(|&upto| upto < doc_len);
		let target = upto.unwrap_or(doc_len);

		if !self.tree.is_empty_tree() && self.is_done(target) {
			self.take_tree();
			return true;
		}

		let mut should_stop = budget.into().into_predicate(&self.clock);
		let mut parse = match self.parse.take() {
			Some(parse) => parse,
			None => self.start_parse(),
		};
		stop_before(parse.as_mut(), upto);

		loop {
			let step = parse.advance(&mut self.scope());
			if let Some(tree) = step {
				let stopped_at = parse.stopped_at();
				self.absorb(tree, stopped_at.unwrap_or(doc_len), stopped_at.is_some());
				if self.tree_len >= target {
					tracing::trace!(target: "weft_syntax::context", tree_len = self.tree_len, "context.work.done");
					return true;
				}
				parse = self.start_parse();
				stop_before(parse.as_mut(), upto);
			}

			if should_stop() {
				tracing::trace!(
					target: "weft_syntax::context",
					parsed_pos = parse.parsed_pos(),
					upto = target,
					"context.work.budget_expired"
				);
				self.parse = Some(parse);
				return false;
			}
		}
	}

	/// Commits whatever the live parse has covered beyond the current tree.
	///
	/// The parse is stopped at its current position and drained, so this never
	/// parses new text.
	pub fn take_tree(&mut self) {
		let Some(mut parse) = self.parse.take() else {
			return;
		};
		let pos = parse.parsed_pos();
		if pos < self.tree_len {
			self.parse = Some(parse);
			return;
		}

		if parse.stopped_at().is_none_or(|stop| stop > pos) {
			parse.stop_at(pos);
		}
		let tree = loop {
			if let Some(tree) = parse.advance(&mut self.scope()) {
				break tree;
			}
		};
		self.absorb(tree, pos, true);
	}

	/// Builds the context for the document after `changes`.
	///
	/// When the text changed, the tree is dropped and survives only as fragments.
	/// A pending continuation moves to the successor.
	pub fn changes(&mut self, changes: &ChangeSet, doc: Rope) -> ParseContext {
		self.take_tree();
		debug_assert!(
			changes.is_empty() || changes.len_after() == doc.len_chars(),
			"change set does not produce the new document"
		);

		let mut next = ParseContext {
			parser: self.parser.clone(),
			doc,
			fragments: self.fragments.clone(),
			tree: self.tree.clone(),
			tree_len: self.tree_len,
			viewport: self.viewport.clone(),
			skipped: self.skipped.clone(),
			temp_skipped: Vec::new(),
			schedule_on: self.schedule_on.take(),
			parse: None,
			min_gap: self.min_gap,
			clock: self.clock.clone(),
		};

		if !changes.is_identity() {
			let ranges: Vec<_> = changes.changed_ranges().collect();
			next.fragments = TreeFragment::apply_changes_with_gap(&self.fragments, &ranges, self.min_gap);
			next.tree = Tree::empty();
			next.tree_len = 0;
			next.viewport = changes.map_pos(self.viewport.start, Bias::Left)..changes.map_pos(self.viewport.end, Bias::Right);
			next.skipped = self
				.skipped
				.iter()
				.filter_map(|r| {
					let from = changes.map_pos(r.start, Bias::Right);
					let to = changes.map_pos(r.end, Bias::Left);
					(from < to).then_some(from..to)
				})
				.collect();
		}
		next
	}

	/// Moves the priority window. Returns true if deferred ranges came into
	/// view and were invalidated, which also discards the live parse.
	pub fn update_viewport(&mut self, viewport: Range<CharIdx>) -> bool {
		if self.viewport == viewport {
			return false;
		}
		self.viewport = viewport;

		let mut fragments = self.fragments.clone();
		let before = self.skipped.len();
		let in_view = self.viewport.clone();
		self.skipped.retain(|range| {
			if overlaps(range, &in_view) {
				fragments = cut_fragments(&fragments, range.clone());
				false
			} else {
				true
			}
		});
		if self.skipped.len() == before {
			return false;
		}

		tracing::trace!(
			target: "weft_syntax::context",
			evicted = before - self.skipped.len(),
			viewport = ?self.viewport,
			"context.viewport.evict_skipped"
		);
		self.fragments = fragments;
		self.reset();
		true
	}

	/// Commits and discards the live parse. The committed tree stays.
	pub fn reset(&mut self) {
		if self.parse.is_some() {
			self.take_tree();
			self.parse = None;
		}
	}

	/// Records a range the parser deferred until it scrolls into view.
	pub fn skip_until_in_view(&mut self, from: CharIdx, to: CharIdx) {
		scope::push_skipped(&mut self.skipped, from..to);
	}

	/// Returns true if the committed tree covers the document up to `upto`.
	pub fn is_done(&self, upto: CharIdx) -> bool {
		let upto = upto.min(self.doc.len_chars());
		self.tree_len >= upto && self.fragments.first().is_some_and(|f| f.from() == 0 && f.to() >= upto)
	}

	/// A parser that fills its ranges with a placeholder, to be parsed for real
	/// later. When `until` is given, work is rescheduled once it resolves.
	pub fn skipping_parser(until: Option<Continuation>) -> Arc<dyn Parser> {
		Arc::new(skipping::SkippingParser::new(until))
	}

	pub fn tree(&self) -> &Tree {
		&self.tree
	}

	pub fn tree_len(&self) -> CharIdx {
		self.tree_len
	}

	pub fn fragments(&self) -> &FragmentList {
		&self.fragments
	}

	pub fn viewport(&self) -> &Range<CharIdx> {
		&self.viewport
	}

	pub fn skipped(&self) -> &[Range<CharIdx>] {
		&self.skipped
	}

	pub fn doc(&self) -> &Rope {
		&self.doc
	}

	pub fn clock(&self) -> &Arc<dyn Clock> {
		&self.clock
	}

	pub fn has_pending_parse(&self) -> bool {
		self.parse.is_some()
	}

	/// Hands the pending continuation, if any, to the caller.
	pub fn take_schedule_on(&mut self) -> Option<Continuation> {
		self.schedule_on.take()
	}

	fn start_parse(&self) -> Box<dyn PartialParse> {
		let len = self.doc.len_chars();
		self.parser
			.start_parse(Box::new(DocInput::new(self.doc.clone())), self.fragments.clone(), &[0..len])
	}

	fn scope(&mut self) -> ContextScope<'_> {
		ContextScope {
			viewport: &self.viewport,
			skipped: &mut self.skipped,
			temp_skipped: &mut self.temp_skipped,
			schedule_on: &mut self.schedule_on,
		}
	}

	fn absorb(&mut self, tree: Tree, tree_len: CharIdx, partial: bool) {
		let mut fragments = TreeFragment::add_tree(&tree, &self.fragments, partial);
		for range in self.temp_skipped.drain(..) {
			fragments = cut_fragments(&fragments, range);
		}
		debug_assert!(tree_len <= tree.len(), "tree of length {} committed for {tree_len}", tree.len());
		self.fragments = fragments;
		self.tree_len = tree_len;
		self.tree = tree;
	}
}

fn stop_before(parse: &mut dyn PartialParse, upto: Option<CharIdx>) {
	if let Some(upto) = upto
		&& parse.stopped_at().is_none_or(|stop| stop > upto)
	{
		parse.stop_at(upto);
	}
}

impl fmt::Debug for ParseContext {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("ParseContext")
			.field("doc_len", &self.doc.len_chars())
			.field("tree_len", &self.tree_len)
			.field("fragments", &self.fragments.len())
			.field("viewport", &self.viewport)
			.field("skipped", &self.skipped)
			.field("parsing", &self.parse.is_some())
			.field("schedule_on", &self.schedule_on.is_some())
			.field("min_gap", &self.min_gap)
			.finish()
	}
}
