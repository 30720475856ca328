use std::ops::Range;

use weft_language::{Continuation, ParseScope};
use weft_primitives::CharIdx;

/// The view of a [`ParseContext`](super::ParseContext) a parse gets while it
/// advances.
pub(super) struct ContextScope<'a> {
	pub(super) viewport: &'a Range<CharIdx>,
	pub(super) skipped: &'a mut Vec<Range<CharIdx>>,
	pub(super) temp_skipped: &'a mut Vec<Range<CharIdx>>,
	pub(super) schedule_on: &'a mut Option<Continuation>,
}

impl ParseScope for ContextScope<'_> {
	fn viewport(&self) -> Range<CharIdx> {
		self.viewport.clone()
	}

	fn skip_until_in_view(&mut self, from: CharIdx, to: CharIdx) {
		push_skipped(self.skipped, from..to);
	}

	fn mark_placeholder(&mut self, range: Range<CharIdx>) {
		self.temp_skipped.push(range);
	}

	fn schedule_on(&mut self, until: Continuation) {
		let merged = match self.schedule_on.take() {
			Some(pending) => Box::pin(async move {
				let (first, second) = tokio::join!(pending, until);
				first.and(second)
			}),
			None => until,
		};
		*self.schedule_on = Some(merged);
	}
}

/// Adds a deferred range unless it is empty or already recorded.
pub(super) fn push_skipped(skipped: &mut Vec<Range<CharIdx>>, range: Range<CharIdx>) {
	if range.start < range.end && !skipped.contains(&range) {
		skipped.push(range);
	}
}
