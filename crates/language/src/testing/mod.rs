//! A small, deterministic bracket grammar for exercising the parse scheduler.
//!
//! Grammar, one token per step:
//!
//! * `Word`: `[A-Za-z_][A-Za-z0-9_]*`
//! * `Number`: ASCII digits
//! * `Space`: whitespace, never crossing a line end
//! * `Block`: a matched `()`, `[]` or `{}` pair with `Open` / `Close` children.
//!   Pairs still open when the parse ends become `Unclosed`; stray closers are
//!   `Error` tokens
//! * `Fence`: a run of three or more backticks up to the next such run. Fences
//!   entirely outside the viewport become a childless `LazyFence` and are
//!   reported through [`ParseScope::skip_until_in_view`](crate::ParseScope::skip_until_in_view)
//! * `Punct`: any other single character
//!
//! Whole tokens, blocks and fences are reused from fragments when they lie in
//! unchanged text. [`ParseStats`] counts what was lexed and what was reused, and
//! a step can be made to cost simulated or real time.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use weft_primitives::{CharIdx, ManualClock};

use crate::fragment::FragmentList;
use crate::input::Input;
use crate::parser::{Parser, PartialParse};

mod parse;

/// Node types produced by [`BraceParser`].
pub mod kinds {
	use crate::tree::NodeType;

	pub const DOCUMENT: NodeType = NodeType::new(1, "Document");
	pub const WORD: NodeType = NodeType::new(2, "Word");
	pub const NUMBER: NodeType = NodeType::new(3, "Number");
	pub const PUNCT: NodeType = NodeType::new(4, "Punct");
	pub const SPACE: NodeType = NodeType::new(5, "Space");
	pub const BLOCK: NodeType = NodeType::new(6, "Block");
	pub const UNCLOSED: NodeType = NodeType::new(7, "Unclosed");
	pub const OPEN: NodeType = NodeType::new(8, "Open");
	pub const CLOSE: NodeType = NodeType::new(9, "Close");
	pub const ERROR: NodeType = NodeType::new(10, "Error");
	pub const FENCE: NodeType = NodeType::new(11, "Fence");
	pub const LAZY_FENCE: NodeType = NodeType::new(12, "LazyFence");
	pub const FENCE_MARK: NodeType = NodeType::new(13, "FenceMark");
}

#[derive(Debug, Default)]
struct Counters {
	parses: AtomicUsize,
	steps: AtomicUsize,
	lexed: AtomicUsize,
	reused_nodes: AtomicUsize,
	reused_len: AtomicUsize,
}

/// Shared counters for every parse started by one [`BraceParser`].
#[derive(Debug, Clone, Default)]
pub struct ParseStats(Arc<Counters>);

impl ParseStats {
	pub fn parses_started(&self) -> usize {
		self.0.parses.load(Ordering::Relaxed)
	}

	/// Number of `advance` calls across all parses.
	pub fn steps(&self) -> usize {
		self.0.steps.load(Ordering::Relaxed)
	}

	pub fn lexed_tokens(&self) -> usize {
		self.0.lexed.load(Ordering::Relaxed)
	}

	pub fn reused_nodes(&self) -> usize {
		self.0.reused_nodes.load(Ordering::Relaxed)
	}

	/// Characters covered by reused nodes.
	pub fn reused_len(&self) -> usize {
		self.0.reused_len.load(Ordering::Relaxed)
	}

	pub fn reset(&self) {
		for counter in [&self.0.parses, &self.0.steps, &self.0.lexed, &self.0.reused_nodes, &self.0.reused_len] {
			counter.store(0, Ordering::Relaxed);
		}
	}

	fn record_reuse(&self, len: usize) {
		self.0.reused_nodes.fetch_add(1, Ordering::Relaxed);
		self.0.reused_len.fetch_add(len, Ordering::Relaxed);
	}

	fn record_lex(&self) {
		self.0.lexed.fetch_add(1, Ordering::Relaxed);
	}
}

/// Parser for the bracket grammar described in the module docs.
#[derive(Debug, Clone)]
pub struct BraceParser {
	stats: ParseStats,
	lazy_fences: bool,
	step_cost: Option<(ManualClock, Duration)>,
	step_delay: Option<Duration>,
}

impl BraceParser {
	pub fn new() -> Self {
		Self {
			stats: ParseStats::default(),
			lazy_fences: true,
			step_cost: None,
			step_delay: None,
		}
	}

	/// Whether fences outside the viewport are deferred. On by default.
	pub fn lazy_fences(mut self, enabled: bool) -> Self {
		self.lazy_fences = enabled;
		self
	}

	/// Advances `clock` by `cost` on every step.
	pub fn with_step_cost(mut self, clock: ManualClock, cost: Duration) -> Self {
		self.step_cost = Some((clock, cost));
		self
	}

	/// Blocks the calling thread for `delay` on every step.
	pub fn with_step_delay(mut self, delay: Duration) -> Self {
		self.step_delay = Some(delay);
		self
	}

	pub fn stats(&self) -> &ParseStats {
		&self.stats
	}

	fn charge_step(&self) {
		self.stats.0.steps.fetch_add(1, Ordering::Relaxed);
		if let Some((clock, cost)) = &self.step_cost {
			clock.advance(*cost);
		}
		if let Some(delay) = self.step_delay {
			std::thread::sleep(delay);
		}
	}
}

impl Default for BraceParser {
	fn default() -> Self {
		Self::new()
	}
}

impl Parser for BraceParser {
	fn start_parse(&self, input: Box<dyn Input + Send>, fragments: FragmentList, ranges: &[std::ops::Range<CharIdx>]) -> Box<dyn PartialParse> {
		self.stats.0.parses.fetch_add(1, Ordering::Relaxed);
		Box::new(parse::BraceParse::new(self.clone(), input, fragments, ranges))
	}
}
