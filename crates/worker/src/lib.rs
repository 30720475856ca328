//! Runtime entry for asynchronous work spawned on behalf of the parse scheduler.
//!
//! Everything goes through [`current_handle`], which uses the ambient Tokio
//! runtime when there is one and a small shared runtime otherwise, so callers
//! never have to care whether they run inside an async context.

mod join_set;
mod panic;
mod spawn;


pub use join_set::WorkerJoinSet;
pub use panic::join_error_panic_message;
pub use spawn::current_handle;
