// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

// cspell:words SIGCHLD SIGHUP SIGINT selfpipe

//! # Shell notification core
//!
//! The machinery that lets a single-threaded interactive shell main loop learn, without
//! racing or busy-polling, that something asynchronous happened (a child changed state,
//! a descriptor became readable, a background computation finished), and that lets it
//! push blocking work onto a bounded pool of background threads.
//!
//! There are three pieces, plus the ambient glue they share:
//!
//! | Piece             | Module             | What it gives you                                            |
//! | :---------------- | :----------------- | :----------------------------------------------------------- |
//! | [`TopicMonitor`]  | [`topic_monitor`]  | Signal-safe `post()`; block until any topic in a set advances |
//! | [`ThreadPool`]    | [`threads`]        | FIFO work queue, self-growing and self-shrinking              |
//! | [`Debounce`]      | [`threads`]        | At most one in-flight and one queued request per operation    |
//! | [`FdMonitor`]     | [`fd_monitor`]     | Readable / timeout / poke callbacks from one background thread |
//!
//! ```text
//!  signal handler ──post()──►┌──────────────┐◄──check(wait)── main loop
//!                            │ TopicMonitor │
//!                            └──────────────┘
//!  main loop ──perform()──►┌────────────┐──runs──► worker threads
//!                          │ ThreadPool │
//!                          └────────────┘
//!  any thread ──add()/poke()──►┌───────────┐──callbacks──► background thread
//!                              │ FdMonitor │
//!                              └───────────┘
//! ```
//!
//! # Startup
//!
//! ```no_run
//! use shell_notify::{NotifyTunables, TopicMonitor, init_io_thread_pool,
//!                    install_signal_handlers, threads};
//!
//! fn main() -> miette::Result<()> {
//!     threads::init();
//!     init_io_thread_pool(&NotifyTunables::default())?;
//!     TopicMonitor::initialize_principal()?;
//!     install_signal_handlers()?;
//!     Ok(())
//! }
//! ```
//!
//! [`Debounce`]: crate::Debounce
//! [`FdMonitor`]: crate::FdMonitor
//! [`ThreadPool`]: crate::ThreadPool
//! [`TopicMonitor`]: crate::TopicMonitor
//! [`fd_monitor`]: mod@crate::core::fd_monitor
//! [`threads`]: mod@crate::core::threads
//! [`topic_monitor`]: mod@crate::core::topic_monitor

// Enforce strict error handling in production library code only. Tests are allowed to
// use .unwrap() (workspace `Cargo.toml` config allows it).
#![cfg_attr(not(test), deny(clippy::unwrap_in_result))]

// Attach modules (re-exported below to provide clean public API).
pub mod core;

// Re-export.
pub use core::*;
