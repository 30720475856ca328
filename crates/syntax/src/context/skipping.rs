//! The placeholder parser.
//!
//! Used when the real parser is not available yet, for example while a
//! grammar loads. Its parse finishes on the first step with a childless
//! [`NodeType::NONE`] tree and marks its ranges so the placeholder is never
//! reused.

use std::ops::Range;

use futures::FutureExt;
use futures::future::Shared;
use weft_language::{Continuation, FragmentList, Input, NodeType, ParseScope, Parser, PartialParse, Tree};
use weft_primitives::CharIdx;

pub(super) struct SkippingParser {
	until: Option<Shared<Continuation>>,
}

impl SkippingParser {
	pub(super) fn new(until: Option<Continuation>) -> Self {
		Self {
			until: until.map(FutureExt::shared),
		}
	}
}

impl Parser for SkippingParser {
	fn start_parse(&self, input: Box<dyn Input + Send>, _fragments: FragmentList, ranges: &[Range<CharIdx>]) -> Box<dyn PartialParse> {
		let from = ranges.first().map_or(0, |r| r.start);
		let to = ranges.last().map_or(input.len(), |r| r.end);
		Box::new(SkippingParse {
			ranges: ranges.to_vec(),
			from,
			to,
			parsed_pos: from,
			until: self.until.clone(),
		})
	}
}

struct SkippingParse {
	ranges: Vec<Range<CharIdx>>,
	from: CharIdx,
	to: CharIdx,
	parsed_pos: CharIdx,
	until: Option<Shared<Continuation>>,
}

impl PartialParse for SkippingParse {
	fn advance(&mut self, scope: &mut dyn ParseScope) -> Option<Tree> {
		for range in self.ranges.drain(..) {
			scope.mark_placeholder(range);
		}
		if let Some(until) = self.until.take() {
			scope.schedule_on(Box::pin(until));
		}
		self.parsed_pos = self.to;
		Some(Tree::leaf(NodeType::NONE, self.to - self.from))
	}

	fn parsed_pos(&self) -> CharIdx {
		self.parsed_pos
	}

	fn stop_at(&mut self, _pos: CharIdx) {}

	fn stopped_at(&self) -> Option<CharIdx> {
		None
	}
}
