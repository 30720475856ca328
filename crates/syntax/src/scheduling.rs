//! Background parse scheduling for one view.
//!
//! A [`ParseWorker`] moves the view's parse context forward in short slices so
//! the editor never blocks on parsing. It is poll-driven:
//!
//! * [`ParseWorker::update`] after every transaction the view sees
//! * [`ParseWorker::poll`] from the event loop; runs a slice once one is due
//! * [`ParseWorker::wait`] to sleep until the next slice or continuation
//!
//! Slices draw from a budget that refills once per chunk window. Windows only
//! roll over while the view has focus, so a background view parses at most one
//! budget's worth before going quiet. Edits made while focused add a small
//! bonus on top.

use std::sync::Arc;
use std::time::{Duration, Instant};

use weft_language::ContinuationError;
use weft_primitives::{Clock, SystemClock};

use crate::config::SyntaxConfig;
use crate::context::SharedContext;
use crate::continuation::ContinuationSet;
use crate::host::{StateEffect, SyntaxHost, Transaction, ViewUpdate};
use crate::state::LanguageState;

/// What a call to [`ParseWorker::poll`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerPoll {
	/// No slice was due.
	Idle,
	/// A slice was due but the chunk budget is spent.
	OutOfBudget,
	/// A slice was due but the published tree already covers the target.
	UpToDate,
	/// A slice ran.
	Worked {
		/// The slice reached its target.
		done: bool,
		/// A new language state was dispatched.
		published: bool,
	},
}

/// Drives background parsing for one view.
#[derive(Debug)]
pub struct ParseWorker {
	config: Arc<SyntaxConfig>,
	clock: Arc<dyn Clock>,
	/// When the next slice is due.
	timer: Option<Instant>,
	/// End of the current chunk window. `None` before the first slice.
	chunk_end: Option<Instant>,
	chunk_budget: Duration,
	continuations: ContinuationSet,
	/// Continuations that completed while [`wait`](Self::wait) was pending.
	finished: Vec<Result<(), ContinuationError>>,
}

impl ParseWorker {
	pub fn new(config: Arc<SyntaxConfig>) -> Self {
		Self::with_clock(config, Arc::new(SystemClock))
	}

	pub fn with_clock(config: Arc<SyntaxConfig>, clock: Arc<dyn Clock>) -> Self {
		Self {
			config,
			clock,
			timer: None,
			chunk_end: None,
			chunk_budget: Duration::ZERO,
			continuations: ContinuationSet::new(),
			finished: Vec::new(),
		}
	}

	/// Starts working for `host`. Call once when the view is created.
	pub fn attach(&mut self, host: &dyn SyntaxHost) {
		self.schedule_work(host);
	}

	/// Reacts to a transaction the view has applied.
	pub fn update(&mut self, host: &dyn SyntaxHost, update: &ViewUpdate) {
		let Some(cx) = context_of(host) else {
			return;
		};
		let viewport = host.viewport();
		let behind = {
			let mut cx = cx.lock();
			cx.update_viewport(viewport.clone()) || viewport.end > cx.tree_len()
		};
		if behind {
			self.schedule_work(host);
		}

		if update.doc_changed || update.selection_set {
			if host.has_focus() {
				self.chunk_budget += self.config.change_bonus();
			}
			self.schedule_work(host);
		}
		self.check_async_schedule(host);
	}

	/// Call when the view gains focus.
	pub fn focus_changed(&mut self, host: &dyn SyntaxHost) {
		self.schedule_work(host);
	}

	/// Arms the timer unless it is already armed or there is nothing to do.
	pub fn schedule_work(&mut self, host: &dyn SyntaxHost) {
		if self.timer.is_some() {
			return;
		}
		let Some(syntax) = host.state().syntax() else {
			return;
		};
		let target = host.viewport().end + self.config.max_parse_ahead;
		let pending = {
			let cx = syntax.context().lock();
			!syntax.tree().ptr_eq(cx.tree()) || !cx.is_done(target)
		};
		if pending {
			let due = self.clock.now() + self.config.min_pause();
			tracing::trace!(target: "weft_syntax::worker", upto = target, "worker.schedule");
			self.timer = Some(due);
		}
	}

	/// Handles finished continuations, then runs a slice if one is due.
	pub fn poll(&mut self, host: &mut dyn SyntaxHost) -> WorkerPoll {
		let mut finished = std::mem::take(&mut self.finished);
		while let Some(outcome) = self.continuations.try_next() {
			finished.push(outcome);
		}
		if !finished.is_empty() {
			for outcome in finished {
				if let Err(error) = outcome {
					tracing::warn!(target: "weft_syntax::worker", %error, "worker.continuation.error");
					host.report_error(&error);
				}
			}
			self.schedule_work(host);
		}

		match self.timer {
			Some(due) if self.clock.now() >= due => self.work(host),
			_ => WorkerPoll::Idle,
		}
	}

	/// Sleeps until the timer is due or a continuation finishes. Returns false
	/// without waiting when neither is pending.
	pub async fn wait(&mut self) -> bool {
		let has_tasks = !self.continuations.is_empty();
		let sleep_for = self.timer.map(|due| due.saturating_duration_since(self.clock.now()));
		if sleep_for.is_none() && !has_tasks {
			return false;
		}

		let timer = async {
			match sleep_for {
				Some(duration) => tokio::time::sleep(duration).await,
				None => std::future::pending().await,
			}
		};
		tokio::select! {
			() = timer => {}
			outcome = self.continuations.next(), if has_tasks => {
				if let Some(outcome) = outcome {
					self.finished.push(outcome);
				}
			}
		}
		true
	}

	/// True while a slice is scheduled or continuations are outstanding.
	pub fn is_working(&self) -> bool {
		self.timer.is_some() || !self.continuations.is_empty()
	}

	/// When the next slice is due, if one is scheduled.
	pub fn next_wakeup(&self) -> Option<Instant> {
		self.timer
	}

	/// Remaining budget in the current chunk window.
	pub fn chunk_budget(&self) -> Duration {
		self.chunk_budget
	}

	/// Number of continuations not yet finished.
	pub fn outstanding(&self) -> usize {
		self.continuations.len()
	}

	pub fn config(&self) -> &Arc<SyntaxConfig> {
		&self.config
	}

	fn work(&mut self, host: &mut dyn SyntaxHost) -> WorkerPoll {
		self.timer = None;
		let now = self.clock.now();
		if self.chunk_end.is_none_or(|end| end < now) && (self.chunk_end.is_none() || host.has_focus()) {
			self.chunk_end = Some(now + self.config.chunk_time());
			self.chunk_budget = self.config.chunk_budget();
			tracing::trace!(target: "weft_syntax::worker", budget = ?self.chunk_budget, "worker.chunk.start");
		}
		if self.chunk_budget.is_zero() {
			tracing::debug!(target: "weft_syntax::worker", "worker.budget_exhausted");
			return WorkerPoll::OutOfBudget;
		}
		let Some(syntax) = host.state().syntax().cloned() else {
			return WorkerPoll::Idle;
		};

		let vp_end = host.viewport().end;
		let doc_len = host.state().doc().len_chars();
		let max_ahead = self.config.max_parse_ahead;
		let (done, viewport_first, publish) = {
			let mut cx = syntax.context().lock();
			if syntax.tree().ptr_eq(cx.tree()) && cx.is_done(vp_end + max_ahead) {
				return WorkerPoll::UpToDate;
			}

			let deadline = now + self.chunk_budget.min(self.config.slice());
			let viewport_first = cx.tree_len() < vp_end && doc_len > vp_end + self.config.viewport_first_margin;
			let upto = vp_end + if viewport_first { 0 } else { max_ahead };
			tracing::trace!(
				target: "weft_syntax::worker",
				tree_len = cx.tree_len(),
				upto,
				viewport_first,
				"worker.slice.start"
			);

			let clock = &self.clock;
			let mut expired = || clock.now() > deadline;
			let done = cx.work(&mut expired, Some(upto));

			let elapsed = self.clock.now().saturating_duration_since(now);
			self.chunk_budget = self.chunk_budget.saturating_sub(elapsed);
			let publish = done || self.chunk_budget.is_zero();
			if publish {
				cx.take_tree();
			}
			tracing::trace!(
				target: "weft_syntax::worker",
				?elapsed,
				budget = ?self.chunk_budget,
				done,
				tree_len = cx.tree_len(),
				"worker.slice.end"
			);
			(done, viewport_first, publish)
		};

		if publish {
			let state = LanguageState::new(syntax.context().clone());
			tracing::debug!(target: "weft_syntax::worker", tree_len = state.tree().len(), "worker.publish");
			host.dispatch(Transaction::effect(StateEffect::SetLanguageState(state)));
		}
		if !self.chunk_budget.is_zero() && !(done && !viewport_first) {
			self.schedule_work(host);
		}
		self.check_async_schedule(host);

		WorkerPoll::Worked { done, published: publish }
	}

	fn check_async_schedule(&mut self, host: &dyn SyntaxHost) {
		let Some(cx) = context_of(host) else {
			return;
		};
		let until = cx.lock().take_schedule_on();
		if let Some(until) = until {
			self.continuations.spawn(until);
		}
	}
}

impl Drop for ParseWorker {
	fn drop(&mut self) {
		if !self.continuations.is_empty() {
			tracing::trace!(target: "weft_syntax::worker", outstanding = self.continuations.len(), "worker.drop.abort");
			self.continuations.abort_all();
		}
	}
}

fn context_of(host: &dyn SyntaxHost) -> Option<SharedContext> {
	host.state().syntax().map(|syntax| syntax.context().clone())
}
