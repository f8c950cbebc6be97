// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

use super::{DEBUG_FD_MONITOR, is_fd_readable};
use crate::{ReadEndMode, WakePipe, drain_wake_bytes, write_wake_byte};
use std::{os::fd::{AsFd, BorrowedFd},
          time::Duration};

/// The wake event for the fd monitor thread and the main-thread completion queue.
///
/// Behaves like a binary semaphore whose "available" state is "the read end is
/// readable". Multiple [`post()`] calls before a [`try_consume()`] coalesce. Both ends
/// are non-blocking and close-on-exec. [`post()`] is async-signal-safe.
///
/// [`post()`]: Self::post
/// [`try_consume()`]: Self::try_consume
#[derive(Debug)]
pub struct FdEventSignaller {
    pipe: WakePipe,
}

/// The wake pipe for an [`FdEventSignaller`] could not be created.
#[derive(Debug, thiserror::Error, miette::Diagnostic)]
#[error("Failed to create fd event signaller")]
#[diagnostic(
    code(shell_notify::fd_monitor::signaller_creation),
    help("The process may be out of file descriptors - check `ulimit -n`")
)]
pub struct SignallerCreationError(#[source] pub std::io::Error);

impl FdEventSignaller {
    /// # Errors
    ///
    /// Returns [`SignallerCreationError`] on fd exhaustion.
    pub fn new() -> Result<Self, SignallerCreationError> {
        WakePipe::new(ReadEndMode::NonBlocking)
            .map(|pipe| Self { pipe })
            .map_err(|errno| SignallerCreationError(errno.into()))
    }

    /// The fd that becomes readable when the event is signalled.
    #[must_use]
    pub fn read_fd(&self) -> BorrowedFd<'_> { self.pipe.read.as_fd() }

    /// Consume the event if it is signalled. Never blocks.
    pub fn try_consume(&self) -> bool {
        match drain_wake_bytes(self.read_fd()) {
            Ok(amt) => amt > 0,
            Err(errno) => {
                tracing::warn!(message = "signaller read failed", error = %errno);
                false
            }
        }
    }

    /// Signal the event. May be coalesced with earlier posts.
    pub fn post(&self) {
        // No logging: this runs in signal handlers.
        let _unused = write_wake_byte(self.pipe.write.as_fd());
    }

    /// Is the event signalled? With `wait`, block until it is. Does not consume.
    pub fn poll(&self, wait: bool) -> bool {
        let timeout = if wait { None } else { Some(Duration::ZERO) };
        let readable = is_fd_readable(self.read_fd(), timeout);
        DEBUG_FD_MONITOR.then(|| {
            tracing::debug!(message = "signaller poll", wait, readable);
        });
        readable
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn post_coalesces_and_consume_clears() {
        let signaller = FdEventSignaller::new().unwrap();
        assert!(!signaller.poll(false));
        assert!(!signaller.try_consume());

        signaller.post();
        signaller.post();
        signaller.post();
        assert!(signaller.poll(false));
        assert!(signaller.poll(true));

        assert!(signaller.try_consume());
        assert!(!signaller.poll(false));
        assert!(!signaller.try_consume());
    }

    #[test]
    fn post_from_other_thread_wakes_waiting_poll() {
        let signaller = std::sync::Arc::new(FdEventSignaller::new().unwrap());
        let poster = std::sync::Arc::clone(&signaller);
        let handle = std::thread::spawn(move || {
            std::thread::sleep(Duration::from_millis(20));
            poster.post();
        });
        assert!(signaller.poll(true));
        handle.join().unwrap();
    }
}
