// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

use super::DEBUG_TOPIC_MONITOR;
use crate::{ReadEndMode, WakePipe, drain_wake_bytes, is_fd_readable, write_wake_byte};
use std::os::fd::AsFd;

/// The wake hint a [`TopicMonitor`] uses to unblock its single reader.
///
/// [`post()`] must be async-signal-safe: no allocation, no locks, no logging.
/// [`wait()`] blocks until at least one [`post()`] happened since the last
/// [`wait()`] returned. Spurious returns are allowed; the monitor re-checks
/// generations after every wake.
///
/// [`TopicMonitor`]: crate::TopicMonitor
/// [`post()`]: WakeSource::post
/// [`wait()`]: WakeSource::wait
pub trait WakeSource: Send + Sync {
    fn post(&self);
    fn wait(&self);
}

/// A [`WakeSource`] built on a self-pipe.
///
/// The write end is always non-blocking. The read end is blocking by default. With
/// [`ReadEndMode::NonBlocking`] the reader polls for readability before reading,
/// which is handy under tooling that can't see through a blocking `read(2)`.
#[derive(Debug)]
pub struct BinarySemaphore {
    pipe: WakePipe,
    read_end_mode: ReadEndMode,
}

/// The wake pipe for a [`TopicMonitor`](crate::TopicMonitor) could not be created.
#[derive(Debug, thiserror::Error, miette::Diagnostic)]
#[error("Failed to create topic monitor wake pipe")]
#[diagnostic(
    code(shell_notify::topic_monitor::wake_pipe_creation),
    help("Signal handlers have nowhere to post without it. Check `ulimit -n`.")
)]
pub struct WakePipeCreationError(#[source] pub std::io::Error);

impl BinarySemaphore {
    /// # Errors
    ///
    /// Returns [`WakePipeCreationError`] if the pipe or its flags can't be set up.
    pub fn new(read_end_mode: ReadEndMode) -> Result<Self, WakePipeCreationError> {
        let pipe = WakePipe::new(read_end_mode)
            .map_err(|errno| WakePipeCreationError(errno.into()))?;
        Ok(Self {
            pipe,
            read_end_mode,
        })
    }

    #[must_use]
    pub fn read_end_mode(&self) -> ReadEndMode { self.read_end_mode }
}

impl WakeSource for BinarySemaphore {
    fn post(&self) {
        // Pipe full is fine: the reader will wake up anyway.
        let _unused = write_wake_byte(self.pipe.write.as_fd());
    }

    fn wait(&self) {
        let fd = self.pipe.read.as_fd();
        loop {
            if self.read_end_mode == ReadEndMode::NonBlocking {
                let _readable = is_fd_readable(fd, None);
            }
            match drain_wake_bytes(fd) {
                Ok(0) => {
                    // EAGAIN on a non-blocking read end, or a lost race; go around.
                    continue;
                }
                Ok(amt) => {
                    DEBUG_TOPIC_MONITOR.then(|| {
                        tracing::debug!(message = "binary semaphore woke", bytes = amt);
                    });
                    return;
                }
                Err(errno) => {
                    // Give up rather than spin. The caller re-checks generations.
                    tracing::error!(message = "binary semaphore read failed", error = %errno);
                    return;
                }
            }
        }
    }
}
