// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

/// Control flow signal for loops and threads.
///
/// A unified type for indicating whether a loop or thread should continue processing or
/// stop. Used across:
/// - the [`FdMonitor`] background thread (one lap of the readiness loop).
/// - [`WorkerThread`] loop (one dequeued work item).
/// - [`Debounce`] servicing loop (one pending request).
///
/// [`Debounce`]: crate::Debounce
/// [`FdMonitor`]: crate::FdMonitor
/// [`WorkerThread`]: crate::core::threads::WorkerThread
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Continuation {
    /// Continue to the next iteration.
    #[default]
    Continue,

    /// Stop processing and exit the loop/thread.
    Stop,
}

/// What an [`FdMonitor`] should do with an item after its callback returns.
///
/// Callbacks do not return this directly. They close the item's descriptor (see
/// [`ItemFd::close()`]) and the monitor derives the action from that.
///
/// [`FdMonitor`]: crate::FdMonitor
/// [`ItemFd::close()`]: crate::ItemFd::close
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ItemAction {
    /// Keep watching the item.
    #[default]
    Retain,

    /// Drop the item (and close its descriptor).
    Remove,
}
