// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! Level-triggered readiness checks on top of `poll(2)`.
//!
//! The set is rebuilt by the caller on every lap, so a descriptor that still has unread
//! data is reported again next time. Hang-up and error conditions count as readable:
//! the owner discovers them on its next `read`.

use rustix::event::{PollFd, PollFlags, Timespec};
use smallvec::SmallVec;
use std::{os::fd::BorrowedFd, time::Duration};

const READABLE: PollFlags = PollFlags::IN.union(PollFlags::HUP).union(PollFlags::ERR);

/// The outcome of one [`FdReadableSet::check_readable()`] call, indexed the same way
/// as the descriptors that were passed in.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct FdReadableSet {
    readable: SmallVec<[bool; 8]>,
}

impl FdReadableSet {
    /// Wait up to `timeout` (`None` is forever) for any of `fds` to become readable.
    ///
    /// # Errors
    ///
    /// Returns the `poll(2)` error, including `EINTR`. On error nothing is readable.
    pub fn check_readable<'fd>(
        fds: impl IntoIterator<Item = BorrowedFd<'fd>>,
        timeout: Option<Duration>,
    ) -> rustix::io::Result<Self> {
        let mut poll_fds: SmallVec<[PollFd<'fd>; 8]> = fds
            .into_iter()
            .map(|fd| PollFd::from_borrowed_fd(fd, PollFlags::IN))
            .collect();

        let timespec = timeout.map(duration_to_timespec);
        rustix::event::poll(&mut poll_fds, timespec.as_ref())?;

        Ok(Self {
            readable: poll_fds
                .iter()
                .map(|it| it.revents().intersects(READABLE))
                .collect(),
        })
    }

    /// Was the descriptor at `index` readable? Out of range is `false`.
    #[must_use]
    pub fn test(&self, index: usize) -> bool {
        self.readable.get(index).copied().unwrap_or(false)
    }

    #[must_use]
    pub fn any(&self) -> bool { self.readable.iter().any(|it| *it) }
}

/// Is `fd` readable within `timeout` (`None` is forever)? Errors read as `false`.
#[must_use]
pub fn is_fd_readable(fd: BorrowedFd<'_>, timeout: Option<Duration>) -> bool {
    FdReadableSet::check_readable([fd], timeout).is_ok_and(|it| it.test(0))
}

fn duration_to_timespec(duration: Duration) -> Timespec {
    Timespec {
        tv_sec: i64::try_from(duration.as_secs()).unwrap_or(i64::MAX),
        tv_nsec: duration.subsec_nanos().into(),
    }
}
