use std::future::Future;

use tokio::task::{JoinError, JoinSet};

/// A named set of tasks spawned through [`current_handle`](crate::current_handle).
///
/// Filling the set does not require an entered runtime, so synchronous parse
/// code can hand work to it. Dropping the set aborts every task still in it.
#[derive(Debug)]
pub struct WorkerJoinSet<T> {
	name: &'static str,
	spawned: u64,
	inner: JoinSet<T>,
}

impl<T> WorkerJoinSet<T>
where
	T: Send + 'static,
{
	/// Creates an empty set. `name` only appears in trace events.
	pub fn new(name: &'static str) -> Self {
		Self {
			name,
			spawned: 0,
			inner: JoinSet::new(),
		}
	}

	pub fn name(&self) -> &'static str {
		self.name
	}

	/// Number of tasks spawned and not yet joined.
	pub fn len(&self) -> usize {
		self.inner.len()
	}

	pub fn is_empty(&self) -> bool {
		self.inner.is_empty()
	}

	/// Total number of tasks ever spawned into this set.
	pub fn spawned(&self) -> u64 {
		self.spawned
	}

	#[allow(clippy::disallowed_methods)]
	pub fn spawn<F>(&mut self, fut: F)
	where
		F: Future<Output = T> + Send + 'static,
	{
		self.spawned += 1;
		tracing::trace!(target: "weft_worker", set = self.name, pending = self.inner.len(), spawned = self.spawned, "worker.join_set.spawn");
		let handle = crate::current_handle();
		let _guard = handle.enter();
		self.inner.spawn(fut);
	}

	/// Waits for the next completed task. Returns `None` when the set is empty.
	pub async fn join_next(&mut self) -> Option<Result<T, JoinError>> {
		self.inner.join_next().await
	}

	pub fn try_join_next(&mut self) -> Option<Result<T, JoinError>> {
		self.inner.try_join_next()
	}

	/// Aborts every task in the set. Aborted tasks still complete through
	/// [`join_next`](Self::join_next) as cancelled.
	pub fn abort_all(&mut self) {
		if !self.inner.is_empty() {
			tracing::debug!(target: "weft_worker", set = self.name, pending = self.inner.len(), "worker.join_set.abort_all");
		}
		self.inner.abort_all();
	}
}
