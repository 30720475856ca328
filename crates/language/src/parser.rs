//! The incremental parser interface.
//!
//! A [`Parser`] starts a [`PartialParse`], which is then driven one bounded step
//! at a time by whoever owns it. Parsers never see scheduling state directly:
//! each step receives a [`ParseScope`] through which it can read the priority
//! window and report work it chose to defer.

use std::ops::Range;

use weft_primitives::{CharIdx, Rope};

use crate::continuation::Continuation;
use crate::fragment::FragmentList;
use crate::input::{DocInput, Input};
use crate::tree::Tree;

/// Services available to a parse while it is being advanced.
pub trait ParseScope {
	/// The range the user is looking at. Parsers may defer work outside it.
	fn viewport(&self) -> Range<CharIdx>;

	/// Records that `from..to` was not parsed properly because it was out of
	/// view. Once the viewport reaches the range it is invalidated and parsed
	/// again.
	fn skip_until_in_view(&mut self, from: CharIdx, to: CharIdx);

	/// Records a range that was filled with a placeholder node. Fragments
	/// covering it are discarded as soon as the tree is absorbed, so the next
	/// parse does not reuse the placeholder.
	fn mark_placeholder(&mut self, range: Range<CharIdx>);

	/// Asks the scheduler to restart work once `until` resolves.
	fn schedule_on(&mut self, until: Continuation);
}

/// An in-progress parse.
pub trait PartialParse: Send {
	/// Performs one bounded unit of work. Returns the finished tree when done.
	fn advance(&mut self, scope: &mut dyn ParseScope) -> Option<Tree>;

	/// Position up to which input has been consumed.
	fn parsed_pos(&self) -> CharIdx;

	/// Tells the parse to finish once it reaches `pos`. Calls with a position
	/// past an earlier stop point are ignored.
	fn stop_at(&mut self, pos: CharIdx);

	/// The active stop point, if any.
	fn stopped_at(&self) -> Option<CharIdx>;
}

/// Something that can parse documents, reusing fragments of earlier trees.
pub trait Parser: Send + Sync {
	/// Starts parsing `ranges` of `input`. Nodes may be taken from `fragments`
	/// where they cover unchanged text.
	fn start_parse(&self, input: Box<dyn Input + Send>, fragments: FragmentList, ranges: &[Range<CharIdx>]) -> Box<dyn PartialParse>;
}

/// A scope for parses that run outside any scheduler.
///
/// Everything is in view and deferred work is dropped.
#[derive(Debug, Clone)]
pub struct DetachedScope {
	viewport: Range<CharIdx>,
}

impl DetachedScope {
	pub fn new(viewport: Range<CharIdx>) -> Self {
		Self { viewport }
	}
}

impl ParseScope for DetachedScope {
	fn viewport(&self) -> Range<CharIdx> {
		self.viewport.clone()
	}

	fn skip_until_in_view(&mut self, _from: CharIdx, _to: CharIdx) {}

	fn mark_placeholder(&mut self, _range: Range<CharIdx>) {}

	fn schedule_on(&mut self, _until: Continuation) {}
}

/// Parses a whole document from scratch, synchronously.
pub fn parse_all(parser: &dyn Parser, doc: &Rope) -> Tree {
	let len = doc.len_chars();
	let mut scope = DetachedScope::new(0..len);
	let mut parse = parser.start_parse(Box::new(DocInput::new(doc.clone())), FragmentList::new(), &[0..len]);
	loop {
		if let Some(tree) = parse.advance(&mut scope) {
			return tree;
		}
	}
}
