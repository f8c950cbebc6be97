// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

// cspell:words SIGCHLD

//! # Topic monitor
//!
//! Lets signal handlers and background threads say "something happened" and lets any
//! number of observers wait for it without missing a wakeup.
//!
//! - A [`Topic`] is one kind of event. A [`TopicSet`] is a bitmask of them.
//! - A [`GenerationList`] holds one counter per topic. The monitor's list only grows.
//!   Each observer keeps its own copy and compares.
//! - [`TopicMonitor::post()`] is async-signal-safe.
//! - [`TopicMonitor::check()`] reports which topics advanced and can block until one
//!   does.
//!
//! ```no_run
//! use shell_notify::{Topic, TopicChecker, TopicMonitor, install_signal_handlers};
//!
//! # fn main() -> miette::Result<()> {
//! TopicMonitor::initialize_principal()?;
//! install_signal_handlers()?;
//! let mut sigchld = TopicChecker::for_principal(Topic::SigChld)?;
//! // ... spawn a child ...
//! sigchld.wait();
//! # Ok(())
//! # }
//! ```

// Attach sources.
pub mod binary_semaphore;
pub mod generation_list;
pub mod principal;
pub mod topic;
pub mod topic_checker;
pub mod topic_monitor;

// Re-export.
pub use binary_semaphore::*;
pub use generation_list::*;
pub use principal::*;
pub use topic::*;
pub use topic_checker::*;
pub use topic_monitor::*;

#[cfg(test)]
mod tests;

pub const DEBUG_TOPIC_MONITOR: bool = false;
