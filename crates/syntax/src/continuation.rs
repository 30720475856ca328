//! Outstanding parse continuations.

use tokio::task::JoinError;
use weft_language::{Continuation, ContinuationError};
use weft_worker::{WorkerJoinSet, join_error_panic_message};

type Outcome = Result<(), ContinuationError>;

/// Continuations a worker is waiting on.
///
/// Each one runs as a background task; dropping the set aborts them.
#[derive(Debug)]
pub struct ContinuationSet {
	tasks: WorkerJoinSet<Outcome>,
}

impl ContinuationSet {
	pub fn new() -> Self {
		Self {
			tasks: WorkerJoinSet::new("syntax.continuations"),
		}
	}

	pub fn spawn(&mut self, until: Continuation) {
		self.tasks.spawn(until);
		tracing::trace!(target: "weft_syntax::worker", outstanding = self.tasks.len(), "worker.continuation.spawn");
	}

	pub fn len(&self) -> usize {
		self.tasks.len()
	}

	pub fn is_empty(&self) -> bool {
		self.tasks.is_empty()
	}

	/// Takes one finished continuation without waiting.
	pub fn try_next(&mut self) -> Option<Outcome> {
		self.tasks.try_join_next().map(flatten)
	}

	/// Waits for the next continuation to finish. `None` when the set is empty.
	pub async fn next(&mut self) -> Option<Outcome> {
		self.tasks.join_next().await.map(flatten)
	}

	pub fn abort_all(&mut self) {
		self.tasks.abort_all();
	}
}

impl Default for ContinuationSet {
	fn default() -> Self {
		Self::new()
	}
}

fn flatten(joined: Result<Outcome, JoinError>) -> Outcome {
	let outcome = match joined {
		Ok(outcome) => outcome,
		Err(error) => Err(match join_error_panic_message(error) {
			Some(message) => ContinuationError::Panicked(message),
			None => ContinuationError::Cancelled,
		}),
	};
	tracing::trace!(target: "weft_syntax::worker", ok = outcome.is_ok(), "worker.continuation.finish");
	outcome
}
