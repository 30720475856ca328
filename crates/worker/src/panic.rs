use tokio::task::JoinError;

/// Extracts the panic message from a failed task.
///
/// Returns `None` if the task was cancelled rather than panicking.
pub fn join_error_panic_message(error: JoinError) -> Option<String> {
	let payload = error.try_into_panic().ok()?;
	let message = if let Some(s) = payload.downcast_ref::<&'static str>() {
		(*s).to_string()
	} else if let Some(s) = payload.downcast_ref::<String>() {
		s.clone()
	} else {
		"non-string panic payload".to_string()
	};
	Some(message)
}
