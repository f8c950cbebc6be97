// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! # Background fd monitor
//!
//! [`FdMonitor`] multiplexes any number of descriptors onto one background thread.
//! Each [`FdMonitorItem`] owns a descriptor, a callback, and an optional timeout. The
//! callback runs with an [`ItemWakeReason`]:
//!
//! | Reason       | When                                                    |
//! | :----------- | :------------------------------------------------------ |
//! | `Readable`   | `poll(2)` reports the fd readable, hung up, or in error |
//! | `TimedOut`   | the item's timeout elapsed since it was last serviced   |
//! | `Poked`      | some thread called [`FdMonitor::poke()`] with its id    |
//!
//! Readiness is level-triggered. A callback that leaves data unread is called again on
//! the next lap, so callbacks should read until `EAGAIN` or close the item.
//!
//! The active item list belongs to the background thread alone. Other threads talk to
//! it through a lock-guarded pending list and poke list plus an [`FdEventSignaller`].

// Attach sources.
pub mod background_fd_monitor;
pub mod fd_event_signaller;
pub mod fd_monitor;
pub mod fd_monitor_item;
pub mod fd_readable_set;

// Re-export.
pub use background_fd_monitor::*;
pub use fd_event_signaller::*;
pub use fd_monitor::*;
pub use fd_monitor_item::*;
pub use fd_readable_set::*;

#[cfg(test)]
mod tests;

pub const DEBUG_FD_MONITOR: bool = false;
