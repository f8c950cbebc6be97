// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

// cspell:words taskthreads

/// A unit of background work. Created by the submitter, moved into the queue, and run
/// exactly once by whichever worker dequeues it.
pub type WorkItem = Box<dyn FnOnce() + Send + 'static>;

/// [`std::thread::Builder::spawn()`] failed where forward progress depended on it.
#[derive(Debug, thiserror::Error, miette::Diagnostic)]
#[error("Failed to spawn {name} thread")]
#[diagnostic(code(shell_notify::threads::thread_spawn))]
#[cfg_attr(
    target_os = "linux",
    diagnostic(help(
        "The system may have reached its thread limit - \
         check `ulimit -u` for per-user limit, \
         `cat /proc/sys/kernel/threads-max` for system-wide limit"
    ))
)]
#[cfg_attr(
    target_os = "macos",
    diagnostic(help(
        "The system may have reached its thread limit - \
         check `ulimit -u` for per-user limit, \
         `sysctl kern.num_taskthreads` for per-process limit"
    ))
)]
pub struct ThreadSpawnError {
    pub name: String,
    #[source]
    pub source: std::io::Error,
}

/// [`init_io_thread_pool()`] ran after the pool was already created, either by an
/// earlier call or lazily by the first [`iothread_perform()`].
///
/// [`init_io_thread_pool()`]: crate::init_io_thread_pool
/// [`iothread_perform()`]: crate::iothread_perform
#[derive(Debug, thiserror::Error, miette::Diagnostic)]
#[error("The io thread pool is already initialized")]
#[diagnostic(
    code(shell_notify::threads::io_pool_already_initialized),
    help("Call init_io_thread_pool() once, before any work is submitted.")
)]
pub struct IoThreadPoolAlreadyInitialized;
