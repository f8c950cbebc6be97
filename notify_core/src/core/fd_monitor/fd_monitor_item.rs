// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

use crate::ItemAction;
use std::{os::fd::{AsFd, BorrowedFd, OwnedFd},
          time::{Duration, Instant}};
use strum_macros::Display;

/// Assigned by [`FdMonitor::add()`]. Never recycled. `0` means "not registered yet".
///
/// [`FdMonitor::add()`]: crate::FdMonitor::add
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct FdMonitorItemId(pub u64);

impl FdMonitorItemId {
    #[must_use]
    pub fn is_registered(self) -> bool { self.0 != 0 }
}

/// Why an item's callback is being invoked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum ItemWakeReason {
    /// The fd is readable, hung up, or in error.
    Readable,
    /// The item's timeout elapsed with nothing to read.
    TimedOut,
    /// Someone called [`FdMonitor::poke()`] with this item's id.
    ///
    /// [`FdMonitor::poke()`]: crate::FdMonitor::poke
    Poked,
}

/// The descriptor owned by an [`FdMonitorItem`]. Callbacks get `&mut` access and may
/// [`close()`](Self::close) it, which tells the monitor to drop the item.
#[derive(Debug)]
pub struct ItemFd(Option<OwnedFd>);

impl ItemFd {
    #[must_use]
    pub fn new(fd: OwnedFd) -> Self { Self(Some(fd)) }

    /// `None` once closed.
    #[must_use]
    pub fn as_fd(&self) -> Option<BorrowedFd<'_>> { self.0.as_ref().map(AsFd::as_fd) }

    #[must_use]
    pub fn is_open(&self) -> bool { self.0.is_some() }

    /// Close the descriptor now. The item is removed once the callback returns.
    pub fn close(&mut self) { self.0 = None; }
}

/// Callback signature for [`FdMonitorItem`]. Runs on the fd monitor thread.
pub type FdMonitorCallback = Box<dyn FnMut(&mut ItemFd, ItemWakeReason) + Send + 'static>;

/// A descriptor to watch, what to do when it wakes, and an optional timeout.
///
/// Once passed to [`FdMonitor::add()`] the monitor owns the descriptor. The callback
/// ends the item's life by calling [`ItemFd::close()`].
///
/// [`FdMonitor::add()`]: crate::FdMonitor::add
pub struct FdMonitorItem {
    pub(super) fd: ItemFd,
    pub(super) callback: FdMonitorCallback,
    pub(super) timeout: Option<Duration>,
    pub(super) last_time: Option<Instant>,
    pub(super) item_id: FdMonitorItemId,
}

impl std::fmt::Debug for FdMonitorItem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FdMonitorItem")
            .field("fd", &self.fd)
            .field("timeout", &self.timeout)
            .field("item_id", &self.item_id)
            .finish_non_exhaustive()
    }
}

impl FdMonitorItem {
    /// `timeout` of `None` means the callback only runs on readability or a poke.
    #[must_use]
    pub fn new(
        fd: OwnedFd,
        timeout: Option<Duration>,
        callback: impl FnMut(&mut ItemFd, ItemWakeReason) + Send + 'static,
    ) -> Self {
        Self {
            fd: ItemFd::new(fd),
            callback: Box::new(callback),
            timeout,
            last_time: None,
            item_id: FdMonitorItemId::default(),
        }
    }

    #[must_use]
    pub fn item_id(&self) -> FdMonitorItemId { self.item_id }

    /// Time until this item times out, measured from its last service. `None` if it
    /// has no timeout.
    pub(super) fn remaining_time(&self, now: Instant) -> Option<Duration> {
        let timeout = self.timeout?;
        let last_time = self.last_time.unwrap_or(now);
        Some(timeout.saturating_sub(now.saturating_duration_since(last_time)))
    }

    /// Invoke the callback if `readable` or timed out.
    pub(super) fn service(&mut self, readable: bool, now: Instant) -> ItemAction {
        let timed_out = !readable && self.remaining_time(now) == Some(Duration::ZERO);
        if !readable && !timed_out {
            return ItemAction::Retain;
        }
        self.last_time = Some(now);
        let reason = if readable {
            ItemWakeReason::Readable
        } else {
            ItemWakeReason::TimedOut
        };
        self.invoke(reason)
    }

    /// Invoke the callback with [`ItemWakeReason::Poked`] if this item's id is in the
    /// sorted `pokelist`.
    pub(super) fn maybe_poke(&mut self, pokelist: &[FdMonitorItemId]) -> ItemAction {
        if !self.item_id.is_registered() || pokelist.binary_search(&self.item_id).is_err() {
            return ItemAction::Retain;
        }
        self.invoke(ItemWakeReason::Poked)
    }

    fn invoke(&mut self, reason: ItemWakeReason) -> ItemAction {
        (self.callback)(&mut self.fd, reason);
        if self.fd.is_open() {
            ItemAction::Retain
        } else {
            ItemAction::Remove
        }
    }
}
