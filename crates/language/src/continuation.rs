use std::future::Future;
use std::pin::Pin;

use thiserror::Error;

/// Why an asynchronous parse continuation did not complete normally.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ContinuationError {
	/// The continuation resolved with an error.
	#[error("parse continuation failed: {0}")]
	Failed(String),
	/// The continuation task panicked.
	#[error("parse continuation panicked: {0}")]
	Panicked(String),
	/// The continuation task was aborted before it resolved.
	#[error("parse continuation cancelled")]
	Cancelled,
}

/// A future a parser hands back when it cannot make progress until some
/// external resource (for example a nested grammar) is ready.
pub type Continuation = Pin<Box<dyn Future<Output = Result<(), ContinuationError>> + Send + 'static>>;

/// Boxes a future as a [`Continuation`].
pub fn continuation<F>(future: F) -> Continuation
where
	F: Future<Output = Result<(), ContinuationError>> + Send + 'static,
{
	Box::pin(future)
}
