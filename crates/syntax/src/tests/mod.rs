//! End-to-end tests: document state, the parse worker and query helpers
//! running against an in-memory host.

use std::ops::Range;
use std::sync::Arc;
use std::time::Duration;

use weft_language::testing::BraceParser;
use weft_language::{ContinuationError, Language, Tree};
use weft_primitives::{Change, CharIdx, ManualClock, Rope};

use super::*;


pub(super) fn init_tracing() {
	let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

/// Small budgets so a slice is a handful of parser steps at one millisecond each.
pub(super) fn test_config() -> SyntaxConfig {
	SyntaxConfig {
		apply_budget_ms: 1000,
		slice_ms: 10,
		min_pause_ms: 5,
		chunk_budget_ms: 30,
		chunk_time_ms: 1000,
		change_bonus_ms: 7,
		init_viewport: 0,
		max_parse_ahead: 100,
		viewport_first_margin: 20,
		min_fragment_gap: 0,
	}
}

/// A bracket-grammar language whose every step costs one millisecond on `clock`.
pub(super) fn timed_language(clock: &ManualClock) -> Arc<Language> {
	let parser = BraceParser::new().with_step_cost(clock.clone(), Duration::from_millis(1));
	Language::new("brace", Arc::new(parser))
}

pub(super) fn brace_language() -> Arc<Language> {
	Language::new("brace", Arc::new(BraceParser::new()))
}

/// An editor view holding one document.
pub(super) struct TestHost {
	pub(super) state: DocState,
	pub(super) viewport: Range<CharIdx>,
	pub(super) focused: bool,
	pub(super) updates: Vec<ViewUpdate>,
	pub(super) errors: Vec<ContinuationError>,
	/// Number of dispatched [`StateEffect::SetLanguageState`] effects.
	pub(super) published: usize,
}

impl TestHost {
	pub(super) fn new(text: &str, language: Option<Arc<Language>>, config: SyntaxConfig, viewport: Range<CharIdx>) -> Self {
		init_tracing();
		Self {
			state: DocState::new(Rope::from(text), language, Arc::new(config)),
			viewport,
			focused: true,
			updates: Vec::new(),
			errors: Vec::new(),
			published: 0,
		}
	}

	/// Applies `changes` and returns the resulting update.
	pub(super) fn edit(&mut self, changes: Vec<Change>) -> ViewUpdate {
		let tr = Transaction::change(self.state.doc(), changes);
		self.dispatch(tr);
		self.updates.last().copied().unwrap_or_default()
	}

	pub(super) fn published_tree(&self) -> Tree {
		syntax_tree(&self.state)
	}

	pub(super) fn context(&self) -> SharedContext {
		self.state.syntax().expect("document has a language").context().clone()
	}

	pub(super) fn worker(&self, clock: &ManualClock) -> ParseWorker {
		ParseWorker::with_clock(self.state.config().clone(), Arc::new(clock.clone()))
	}
}

impl SyntaxHost for TestHost {
	fn state(&self) -> &DocState {
		&self.state
	}

	fn viewport(&self) -> Range<CharIdx> {
		self.viewport.clone()
	}

	fn has_focus(&self) -> bool {
		self.focused
	}

	fn dispatch(&mut self, tr: Transaction) {
		self.published += tr
			.effects
			.iter()
			.filter(|effect| matches!(effect, StateEffect::SetLanguageState(_)))
			.count();
		let (next, update) = self.state.apply(tr);
		self.state = next;
		self.updates.push(update);
	}

	fn report_error(&mut self, error: &ContinuationError) {
		self.errors.push(error.clone());
	}
}
