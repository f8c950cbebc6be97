// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

// Attach sources.
pub mod common;
pub mod config;
pub mod fd_monitor;
pub mod log;
pub mod threads;
pub mod topic_monitor;

#[cfg(test)]
pub mod test_fixtures;

// Re-export.
pub use common::*;
pub use config::*;
pub use fd_monitor::*;
pub use log::*;
pub use threads::*;
pub use topic_monitor::*;
