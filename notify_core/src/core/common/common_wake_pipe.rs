// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

// cspell:words CLOEXEC NONBLOCK

//! Self-pipe plumbing shared by [`FdEventSignaller`] and [`BinarySemaphore`].
//!
//! Everything on the write side is async-signal-safe: [`rustix::io::write`] is a thin
//! syscall wrapper that neither allocates nor locks.
//!
//! [`BinarySemaphore`]: crate::BinarySemaphore
//! [`FdEventSignaller`]: crate::FdEventSignaller

use rustix::{fs::OFlags,
             io::{Errno, FdFlags}};
use std::os::fd::{AsFd, BorrowedFd, OwnedFd};

/// The two ends of a close-on-exec pipe.
#[derive(Debug)]
pub struct WakePipe {
    pub read: OwnedFd,
    pub write: OwnedFd,
}

/// Blocking mode of the read end. The write end is always non-blocking, so a full pipe
/// never blocks a poster.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadEndMode {
    Blocking,
    NonBlocking,
}

impl WakePipe {
    /// # Errors
    ///
    /// Returns the OS error if the pipe can't be created (fd exhaustion) or its flags
    /// can't be set.
    pub fn new(read_end_mode: ReadEndMode) -> rustix::io::Result<Self> {
        let (read, write) = rustix::pipe::pipe()?;
        for fd in [&read, &write] {
            rustix::io::fcntl_setfd(fd, rustix::io::fcntl_getfd(fd)? | FdFlags::CLOEXEC)?;
        }
        set_nonblocking(&write)?;
        if read_end_mode == ReadEndMode::NonBlocking {
            set_nonblocking(&read)?;
        }
        Ok(Self { read, write })
    }
}

fn set_nonblocking(fd: impl AsFd) -> rustix::io::Result<()> {
    let flags = rustix::fs::fcntl_getfl(&fd)?;
    rustix::fs::fcntl_setfl(&fd, flags | OFlags::NONBLOCK)
}

/// Write one byte, retrying only on `EINTR`. `EAGAIN` (pipe full) counts as success,
/// since a full pipe is already readable. Safe to call from a signal handler.
///
/// # Errors
///
/// Returns any other OS error. Signal-handler callers must ignore it.
pub fn write_wake_byte(fd: BorrowedFd<'_>) -> rustix::io::Result<()> {
    loop {
        match rustix::io::write(fd, &[1_u8]) {
            Ok(_) | Err(Errno::AGAIN) => return Ok(()),
            Err(Errno::INTR) => {}
            Err(err) => return Err(err),
        }
    }
}

/// Read up to 64 bytes, retrying on `EINTR`. Returns the byte count; `Ok(0)` means
/// nothing was available (`EAGAIN` on a non-blocking fd) or EOF.
///
/// # Errors
///
/// Returns any OS error other than `EINTR` and `EAGAIN`.
pub fn drain_wake_bytes(fd: BorrowedFd<'_>) -> rustix::io::Result<usize> {
    let mut buf = [0_u8; 64];
    loop {
        match rustix::io::read(fd, &mut buf[..]) {
            Ok(amt) => return Ok(amt),
            Err(Errno::AGAIN) => return Ok(0),
            Err(Errno::INTR) => {}
            Err(err) => return Err(err),
        }
    }
}
