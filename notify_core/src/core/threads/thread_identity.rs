// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! Cheap per-thread ids and the notion of "the main thread".
//!
//! [`std::thread::ThreadId`] goes through an [`Arc`] on every
//! [`current()`](std::thread::current) call. The ids here are a `thread_local!` read of
//! a value handed out once per thread by a relaxed counter.
//!
//! [`Arc`]: std::sync::Arc

// cspell:words atfork

use crate::AtomicU64Ext;
use std::sync::{Once, OnceLock,
                atomic::{AtomicBool, AtomicU64, Ordering}};

/// Set by [`init()`]. Never changes afterwards.
static MAIN_THREAD_ID: OnceLock<u64> = OnceLock::new();

/// Set in the child by the `pthread_atfork` handler that [`init()`] registers.
static IS_FORKED_CHILD: AtomicBool = AtomicBool::new(false);

/// Unit tests run on arbitrary harness threads, so main/background assertions are off.
const THREAD_ASSERTS_DISABLED: bool = cfg!(test);

/// Record the calling thread as the main thread and start tracking `fork(2)`. Call
/// once, early, from `main()`. Later calls are ignored.
pub fn init() {
    register_fork_handler();
    let id = thread_id();
    let main = *MAIN_THREAD_ID.get_or_init(|| id);
    if main != id {
        tracing::warn!(
            message = "threads::init() called again from a different thread; ignored",
            main_thread_id = main,
            caller_thread_id = id
        );
    }
}

/// Make the child side of every later `fork(2)` set [`is_forked_child()`]. Runs once.
pub(crate) fn register_fork_handler() {
    static REGISTER: Once = Once::new();
    REGISTER.call_once(|| {
        #[cfg(unix)]
        {
            extern "C" fn child_post_fork() { IS_FORKED_CHILD.store(true, Ordering::Relaxed); }

            // SAFETY: The handler only stores to an atomic, which is fork-safe.
            let result = unsafe { libc::pthread_atfork(None, None, Some(child_post_fork)) };
            if result != 0 {
                tracing::error!(
                    message = "pthread_atfork failed; forked children go undetected",
                    error = %std::io::Error::from_raw_os_error(result)
                );
            }
        }
    });
}

/// Is this process a child forked after [`init()`]? Only the forking thread survives
/// in the child, so pools, monitors, and their locks must not be used there.
#[must_use]
pub fn is_forked_child() -> bool { IS_FORKED_CHILD.load(Ordering::Relaxed) }

/// # Panics
///
/// Panics in a child forked after [`init()`].
pub fn assert_is_not_forked_child() {
    #[cold]
    fn forked_child() -> ! {
        panic!("Function called from forked child!");
    }

    if is_forked_child() {
        forked_child();
    }
}

/// The calling thread's id. Ids start at `1` and are never reused.
#[must_use]
pub fn thread_id() -> u64 {
    static THREAD_COUNTER: AtomicU64 = AtomicU64::new(0);
    thread_local! {
        static THREAD_ID: u64 = THREAD_COUNTER.next_id();
    }
    THREAD_ID.with(|id| *id)
}

/// `false` until [`init()`] has run.
#[must_use]
pub fn is_main_thread() -> bool { MAIN_THREAD_ID.get() == Some(&thread_id()) }

/// # Panics
///
/// Panics when not called on the thread that ran [`init()`] (or when [`init()`] never
/// ran). Disabled in this crate's unit tests.
pub fn assert_is_main_thread() {
    #[cold]
    fn not_main_thread() -> ! {
        panic!("Function is not running on the main thread (was threads::init() called?)");
    }

    if !THREAD_ASSERTS_DISABLED && !is_main_thread() {
        not_main_thread();
    }
}

/// # Panics
///
/// Panics when called on the main thread. Disabled in this crate's unit tests.
pub fn assert_is_background_thread() {
    #[cold]
    fn on_main_thread() -> ! {
        panic!("Function is not allowed to be called on the main thread!");
    }

    if !THREAD_ASSERTS_DISABLED && is_main_thread() {
        on_main_thread();
    }
}
