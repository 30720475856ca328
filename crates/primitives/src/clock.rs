//! Time sources for budgeted work.
//!
//! Scheduling code never calls [`Instant::now`] directly; it asks a [`Clock`].
//! Production code uses [`SystemClock`], tests drive a [`ManualClock`] so that
//! budgets and pauses can be asserted without sleeping.

use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;

/// A monotonic time source.
pub trait Clock: Send + Sync + fmt::Debug {
	/// Returns the current instant.
	fn now(&self) -> Instant;
}

/// Wall clock backed by [`Instant::now`].
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
	fn now(&self) -> Instant {
		Instant::now()
	}
}

/// A clock that only moves when told to.
///
/// Clones share the same underlying instant.
#[derive(Debug, Clone)]
pub struct ManualClock {
	now: Arc<Mutex<Instant>>,
}

impl ManualClock {
	/// Creates a clock frozen at the current wall-clock instant.
	pub fn new() -> Self {
		Self {
			now: Arc::new(Mutex::new(Instant::now())),
		}
	}

	/// Moves the clock forward.
	pub fn advance(&self, by: Duration) {
		let mut now = self.now.lock();
		*now += by;
	}

	/// Jumps the clock to `instant`. Moving backwards is ignored.
	pub fn set(&self, instant: Instant) {
		let mut now = self.now.lock();
		if instant > *now {
			*now = instant;
		}
	}
}

impl Default for ManualClock {
	fn default() -> Self {
		Self::new()
	}
}

impl Clock for ManualClock {
	fn now(&self) -> Instant {
		*self.now.lock()
	}
}
