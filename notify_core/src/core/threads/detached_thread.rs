// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

// cspell:words sigmask sigset sigfillset sigdelset SIGILL SIGFPE SIGBUS SIGSEGV

//! Fire-and-forget threads that never receive asynchronous signals.
//!
//! A new thread inherits the spawning thread's signal mask. [`spawn_detached()`] blocks
//! every signal except the synchronous fault signals (blocking those is undefined
//! behavior) and the unblockable ones, spawns, then restores the caller's mask. So
//! `SIGCHLD`, `SIGINT`, and friends are always delivered to the main thread, where the
//! handlers installed by [`install_signal_handlers()`] expect to run.
//!
//! The [`JoinHandle`] is dropped on the spot, which detaches the thread. Whatever the
//! thread needs must be moved into its closure (typically an [`Arc`]).
//!
//! [`Arc`]: std::sync::Arc
//! [`JoinHandle`]: std::thread::JoinHandle
//! [`install_signal_handlers()`]: crate::install_signal_handlers

use super::{DEBUG_IOTHREAD, assert_is_not_forked_child, thread_id};

/// Spawn a named, detached thread with asynchronous signals blocked.
///
/// # Errors
///
/// Returns the OS error from [`std::thread::Builder::spawn()`]. Failure does not depend
/// on `f`; it means the process is out of thread resources.
///
/// # Panics
///
/// Panics in a forked child (see [`is_forked_child()`](super::is_forked_child)).
pub fn spawn_detached<F>(name: impl Into<String>, f: F) -> std::io::Result<()>
where
    F: FnOnce() + Send + 'static,
{
    assert_is_not_forked_child();
    let name = name.into();
    let saved_mask = signal_mask::block_async_signals();

    let result = std::thread::Builder::new().name(name.clone()).spawn(f);

    signal_mask::restore(saved_mask);

    match result {
        Ok(handle) => {
            drop(handle);
            DEBUG_IOTHREAD.then(|| {
                tracing::debug!(
                    message = "spawned detached thread",
                    name = %name,
                    spawner_thread_id = thread_id()
                );
            });
            Ok(())
        }
        Err(err) => {
            tracing::error!(
                message = "detached thread spawn failure",
                name = %name,
                error = %err
            );
            Err(err)
        }
    }
}

#[cfg(unix)]
mod signal_mask {
    use std::mem::MaybeUninit;

    pub type SavedMask = libc::sigset_t;

    /// Blocks all signals except the ones where blocking is undefined (`SIGILL`,
    /// `SIGFPE`, `SIGBUS`, `SIGSEGV`) or meaningless (`SIGSTOP`, `SIGKILL`). Returns the
    /// previous mask.
    pub fn block_async_signals() -> SavedMask {
        // SAFETY: the sets are initialized by sigfillset / pthread_sigmask before use.
        unsafe {
            let mut new_set = MaybeUninit::<libc::sigset_t>::uninit();
            libc::sigfillset(new_set.as_mut_ptr());
            for signal in [
                libc::SIGILL,
                libc::SIGFPE,
                libc::SIGBUS,
                libc::SIGSEGV,
                libc::SIGSTOP,
                libc::SIGKILL,
            ] {
                libc::sigdelset(new_set.as_mut_ptr(), signal);
            }

            let mut saved = MaybeUninit::<libc::sigset_t>::uninit();
            let rc = libc::pthread_sigmask(
                libc::SIG_BLOCK,
                new_set.as_ptr(),
                saved.as_mut_ptr(),
            );
            assert_eq!(rc, 0, "Failed to override thread signal mask!");
            saved.assume_init()
        }
    }

    pub fn restore(saved: SavedMask) {
        // SAFETY: `saved` came from a successful pthread_sigmask call.
        let rc = unsafe {
            libc::pthread_sigmask(libc::SIG_SETMASK, &raw const saved, std::ptr::null_mut())
        };
        assert_eq!(rc, 0, "Failed to restore thread signal mask!");
    }
}

#[cfg(not(unix))]
mod signal_mask {
    pub type SavedMask = ();
    pub fn block_async_signals() -> SavedMask {}
    pub fn restore(_saved: SavedMask) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::{sync::mpsc, time::Duration};

    #[test]
    fn detached_thread_runs_and_is_named() {
        let (tx, rx) = mpsc::channel();
        spawn_detached("detached-test", move || {
            let name = std::thread::current().name().map(str::to_owned);
            tx.send(name).unwrap();
        })
        .unwrap();

        let name = rx.recv_timeout(Duration::from_secs(5)).unwrap();
        assert_eq!(name.as_deref(), Some("detached-test"));
    }

    #[cfg(unix)]
    #[test]
    fn detached_thread_blocks_sigchld_and_caller_mask_is_restored() {
        fn current_mask() -> libc::sigset_t {
            unsafe {
                let mut empty = std::mem::MaybeUninit::<libc::sigset_t>::uninit();
                libc::sigemptyset(empty.as_mut_ptr());
                let mut current = std::mem::MaybeUninit::<libc::sigset_t>::uninit();
                let rc = libc::pthread_sigmask(
                    libc::SIG_BLOCK,
                    empty.as_ptr(),
                    current.as_mut_ptr(),
                );
                assert_eq!(rc, 0);
                current.assume_init()
            }
        }

        let mask_before = current_mask();
        let caller_blocked_before =
            unsafe { libc::sigismember(&raw const mask_before, libc::SIGCHLD) };

        let (tx, rx) = mpsc::channel();
        spawn_detached("mask-test", move || {
            let mask = current_mask();
            let sigchld = unsafe { libc::sigismember(&raw const mask, libc::SIGCHLD) };
            let sigsegv = unsafe { libc::sigismember(&raw const mask, libc::SIGSEGV) };
            tx.send((sigchld, sigsegv)).unwrap();
        })
        .unwrap();

        let (sigchld, sigsegv) = rx.recv_timeout(Duration::from_secs(5)).unwrap();
        assert_eq!(sigchld, 1);
        assert_eq!(sigsegv, 0);

        let mask_after = current_mask();
        let caller_blocked_after =
            unsafe { libc::sigismember(&raw const mask_after, libc::SIGCHLD) };
        assert_eq!(caller_blocked_before, caller_blocked_after);
    }
}
