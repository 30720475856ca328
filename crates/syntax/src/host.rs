//! The slice of editor state the syntax layer lives in.
//!
//! An editor keeps one [`DocState`] per document version. Transactions carry
//! text changes and [`StateEffect`]s; applying one yields the next state plus
//! the [`ViewUpdate`] the parse worker reacts to.

use std::ops::Range;
use std::sync::Arc;

use weft_language::{ContinuationError, Language};
use weft_primitives::{Change, ChangeSet, CharIdx, Clock, Rope, SystemClock};

use crate::config::SyntaxConfig;
use crate::state::{LanguageState, TransactionInfo};

/// Out-of-band state updates carried by a [`Transaction`].
#[derive(Debug, Clone)]
pub enum StateEffect {
	/// Replaces the language state wholesale. Used by the worker to publish.
	SetLanguageState(LanguageState),
	/// Switches the document's language, or removes it with `None`.
	SetLanguage(Option<Arc<Language>>),
}

/// A change to a [`DocState`].
#[derive(Debug, Clone, Default)]
pub struct Transaction {
	/// Text changes. `None` leaves the document untouched.
	pub changes: Option<ChangeSet>,
	pub selection_set: bool,
	pub effects: Vec<StateEffect>,
}

impl Transaction {
	/// A transaction that changes nothing.
	pub fn empty() -> Self {
		Self::default()
	}

	pub fn new(changes: ChangeSet) -> Self {
		Self {
			changes: Some(changes),
			..Self::default()
		}
	}

	/// Builds a transaction from ordered changes against `doc`.
	pub fn change(doc: &Rope, changes: impl IntoIterator<Item = Change>) -> Self {
		Self::new(ChangeSet::from_changes(doc.len_chars(), changes))
	}

	/// A transaction carrying only `effect`.
	pub fn effect(effect: StateEffect) -> Self {
		Self::empty().with_effect(effect)
	}

	pub fn with_selection(mut self) -> Self {
		self.selection_set = true;
		self
	}

	pub fn with_effect(mut self, effect: StateEffect) -> Self {
		self.effects.push(effect);
		self
	}
}

/// What a transaction changed, from the view's point of view.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ViewUpdate {
	pub doc_changed: bool,
	pub selection_set: bool,
}

/// Document text plus its syntax.
#[derive(Debug, Clone)]
pub struct DocState {
	doc: Rope,
	language: Option<Arc<Language>>,
	syntax: Option<LanguageState>,
	config: Arc<SyntaxConfig>,
	clock: Arc<dyn Clock>,
}

impl DocState {
	/// Creates a state, parsing the start of the document when a language is set.
	pub fn new(doc: Rope, language: Option<Arc<Language>>, config: Arc<SyntaxConfig>) -> Self {
		Self::with_clock(doc, language, config, Arc::new(SystemClock))
	}

	/// Like [`new`](Self::new), with parse budgets measured on `clock`.
	pub fn with_clock(doc: Rope, language: Option<Arc<Language>>, config: Arc<SyntaxConfig>, clock: Arc<dyn Clock>) -> Self {
		let syntax = language
			.as_deref()
			.map(|language| LanguageState::init_with_clock(&doc, language, &config, clock.clone()));
		Self {
			doc,
			language,
			syntax,
			config,
			clock,
		}
	}

	/// Applies `tr`, returning the next state and what changed.
	///
	/// # Panics
	///
	/// Panics if the transaction's changes were built for a document of a
	/// different length.
	pub fn apply(&self, tr: Transaction) -> (DocState, ViewUpdate) {
		let changes = tr.changes.unwrap_or_else(|| ChangeSet::identity(self.doc.len_chars()));
		assert!(
			changes.is_empty() || changes.len() == self.doc.len_chars(),
			"changes for a document of length {} applied to one of length {}",
			changes.len(),
			self.doc.len_chars()
		);

		let mut doc = self.doc.clone();
		changes.apply(&mut doc);

		let mut language = self.language.clone();
		let mut published = None;
		for effect in tr.effects {
			match effect {
				StateEffect::SetLanguageState(state) => published = Some(state),
				StateEffect::SetLanguage(next) => language = next,
			}
		}

		let syntax = if let Some(state) = published {
			Some(state)
		} else if !same_language(&language, &self.language) {
			tracing::debug!(
				target: "weft_syntax::state",
				from = self.language.as_deref().map(Language::name),
				to = language.as_deref().map(Language::name),
				"state.language_changed"
			);
			language
				.as_deref()
				.map(|language| LanguageState::init_with_clock(&doc, language, &self.config, self.clock.clone()))
		} else {
			let info = TransactionInfo {
				changes: &changes,
				start_doc: &self.doc,
				doc: &doc,
			};
			self.syntax.as_ref().map(|state| state.apply(&info, &self.config))
		};

		let update = ViewUpdate {
			doc_changed: !changes.is_identity(),
			selection_set: tr.selection_set,
		};
		let next = DocState {
			doc,
			language,
			syntax,
			config: self.config.clone(),
			clock: self.clock.clone(),
		};
		(next, update)
	}

	pub fn doc(&self) -> &Rope {
		&self.doc
	}

	pub fn language(&self) -> Option<&Arc<Language>> {
		self.language.as_ref()
	}

	pub fn syntax(&self) -> Option<&LanguageState> {
		self.syntax.as_ref()
	}

	pub fn config(&self) -> &Arc<SyntaxConfig> {
		&self.config
	}
}

fn same_language(a: &Option<Arc<Language>>, b: &Option<Arc<Language>>) -> bool {
	match (a, b) {
		(Some(a), Some(b)) => Arc::ptr_eq(a, b),
		(None, None) => true,
		_ => false,
	}
}

/// The view a [`ParseWorker`](crate::ParseWorker) runs for.
pub trait SyntaxHost {
	/// The current document state.
	fn state(&self) -> &DocState;

	/// The visible document range.
	fn viewport(&self) -> Range<CharIdx>;

	fn has_focus(&self) -> bool;

	/// Applies a transaction to the host's state.
	fn dispatch(&mut self, tr: Transaction);

	/// Called when a parse continuation fails.
	fn report_error(&mut self, error: &ContinuationError) {
		tracing::error!(target: "weft_syntax::worker", %error, "worker.continuation.failed");
	}
}
