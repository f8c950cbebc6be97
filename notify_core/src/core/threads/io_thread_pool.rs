// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

use super::{IoThreadPoolAlreadyInitialized, ThreadPool};
use crate::NotifyTunables;
use std::sync::OnceLock;

/// The process-wide pool used to lift blocking I/O off the main thread.
static IO_THREAD_POOL: OnceLock<ThreadPool> = OnceLock::new();

/// Create the io pool with `tunables`. Call once at startup, before any work is
/// submitted. Without it, the first submission creates the pool with defaults.
///
/// # Errors
///
/// Returns [`IoThreadPoolAlreadyInitialized`] if the pool already exists. The existing
/// pool is kept.
pub fn init_io_thread_pool(tunables: &NotifyTunables) -> miette::Result<()> {
    let mut created = false;
    IO_THREAD_POOL.get_or_init(|| {
        created = true;
        ThreadPool::with_tunables(tunables)
    });
    if created {
        Ok(())
    } else {
        Err(IoThreadPoolAlreadyInitialized.into())
    }
}

/// The process-wide io pool, created with defaults on first use.
pub fn io_thread_pool() -> &'static ThreadPool {
    IO_THREAD_POOL.get_or_init(|| ThreadPool::with_tunables(&NotifyTunables::default()))
}

/// Run `f` on the io pool.
pub fn iothread_perform(f: impl FnOnce() + Send + 'static) { io_thread_pool().perform(f, false); }

/// Run `f` on the io pool, spawning past the thread limit if every thread is busy. For
/// work whose deferral could deadlock.
pub fn iothread_perform_cant_wait(f: impl FnOnce() + Send + 'static) {
    io_thread_pool().perform(f, true);
}
