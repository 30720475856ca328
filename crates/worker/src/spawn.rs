use std::sync::OnceLock;

use tokio::runtime::{Builder, Handle, Runtime};

/// Returns the ambient runtime handle, or a shared fallback runtime when called
/// outside of one.
pub fn current_handle() -> Handle {
	if let Ok(handle) = Handle::try_current() {
		return handle;
	}

	static FALLBACK: OnceLock<Runtime> = OnceLock::new();
	let runtime = FALLBACK.get_or_init(|| {
		tracing::debug!(target: "weft_worker", "worker.runtime.fallback_start");
		Builder::new_multi_thread()
			.enable_all()
			.worker_threads(1)
			.thread_name("weft-worker")
			.build()
			.expect("failed to build weft-worker fallback tokio runtime")
	});
	runtime.handle().clone()
}
