// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! Tracing setup for binaries and tests that embed the notification core.
//!
//! The library itself only emits [`tracing`] events, gated by per-module `DEBUG_*`
//! consts. Whoever owns `main()` decides where they go by building a [`TracingConfig`]
//! and calling [`TracingConfig::install_global`].

// Attach sources.
pub mod rolling_file_appender_impl;
pub mod tracing_config;
pub mod tracing_init;

// Re-export.
pub use rolling_file_appender_impl::*;
pub use tracing_config::*;
pub use tracing_init::*;
