// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! # Background threads
//!
//! - [`ThreadPool`]: FIFO work queue on detached worker threads that come and go with
//!   demand. The process-wide instance is reached through [`iothread_perform()`].
//! - [`Debounce`]: at most one running and one queued request per logical operation,
//!   with abandonment of overdue runs.
//! - [`MainThreadQueue`]: the way back, from a worker to the main loop.
//! - [`spawn_detached()`]: the raw spawn used by all of the above and by
//!   [`FdMonitor`], with asynchronous signals blocked in the new thread.
//!
//! Call [`init()`] from `main()` first so main-thread assertions know which thread is
//! which.
//!
//! [`FdMonitor`]: crate::FdMonitor

// Attach sources.
pub mod debounce;
pub mod detached_thread;
pub mod io_thread_pool;
pub mod main_thread_queue;
pub mod thread_identity;
pub mod thread_pool;
pub mod threads_types;
pub mod worker_thread;

// Re-export.
pub use debounce::*;
pub use detached_thread::*;
pub use io_thread_pool::*;
pub use main_thread_queue::*;
pub use thread_identity::*;
pub use thread_pool::*;
pub use threads_types::*;
pub use worker_thread::*;

#[cfg(test)]
mod tests;

pub const DEBUG_IOTHREAD: bool = false;
