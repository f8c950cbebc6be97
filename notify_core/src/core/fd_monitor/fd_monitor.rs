// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

use super::{BackgroundFdMonitor, DEBUG_FD_MONITOR, FdEventSignaller, FdMonitorItem,
            FdMonitorItemId};
use crate::{AtomicU64Ext, DEFAULT_FD_MONITOR_WAIT_LAP, NotifyTunables, ThreadSpawnError,
            spawn_detached};
use miette::IntoDiagnostic;
use std::{sync::{Arc, Mutex, MutexGuard, atomic::AtomicU64},
          time::Duration};

/// State shared between an [`FdMonitor`] and its [`BackgroundFdMonitor`] thread. The
/// active item list is not here: only the background thread touches it.
#[derive(Debug, Default)]
pub(crate) struct FdMonitorShared {
    /// Added but not yet merged into the active list.
    pub pending: Vec<FdMonitorItem>,
    /// Sorted, deduplicated ids waiting for a [`ItemWakeReason::Poked`] callback.
    ///
    /// [`ItemWakeReason::Poked`]: super::ItemWakeReason::Poked
    pub pokelist: Vec<FdMonitorItemId>,
    /// Whether the background thread is alive. Only the thread clears it.
    pub running: bool,
    /// Set on drop. The thread exits on its next wakeup.
    pub terminate: bool,
}

/// Shared handle plus lock helper, cloned into the background thread.
#[derive(Debug, Clone)]
pub(crate) struct FdMonitorHandle {
    pub change_signaller: Arc<FdEventSignaller>,
    pub data: Arc<Mutex<FdMonitorShared>>,
}

impl FdMonitorHandle {
    pub(crate) fn lock(&self) -> MutexGuard<'_, FdMonitorShared> {
        self.data.lock().expect("FdMonitor mutex poisoned")
    }
}

/// Watches a dynamic set of descriptors from one background thread and invokes each
/// item's callback when it is readable, when its timeout elapses, or when poked.
///
/// The thread starts on the first [`add()`](Self::add) and exits by itself after one
/// idle wait-lap with no items. The next [`add()`](Self::add) starts a fresh one.
///
/// ```text
///  any thread                     fd monitor thread
///  ──────────                     ─────────────────
///  add(item) ──► pending ─┐
///  poke(id)  ──► pokelist ┼─ post() ──► wake fd readable
///                         │             merge pending into active items
///                         └───────────► run Poked callbacks next lap
///                                       poll(wake fd + item fds, min timeout)
///                                       run Readable / TimedOut callbacks
/// ```
///
/// Dropping the monitor asks the thread to exit and waits until it has.
#[derive(Debug)]
pub struct FdMonitor {
    handle: FdMonitorHandle,
    last_id: AtomicU64,
    wait_lap: Duration,
}

impl FdMonitor {
    /// Uses the default wait-lap.
    ///
    /// # Errors
    ///
    /// Returns an error if the wake event can't be created.
    pub fn new() -> miette::Result<Self> { Self::with_wait_lap(DEFAULT_FD_MONITOR_WAIT_LAP) }

    /// `wait_lap` is how long the thread lingers with no items before exiting.
    ///
    /// # Errors
    ///
    /// Returns an error if the wake event can't be created.
    pub fn with_wait_lap(wait_lap: Duration) -> miette::Result<Self> {
        let change_signaller = FdEventSignaller::new().into_diagnostic()?;
        Ok(Self {
            handle: FdMonitorHandle {
                change_signaller: Arc::new(change_signaller),
                data: Arc::default(),
            },
            last_id: AtomicU64::new(0),
            wait_lap,
        })
    }

    /// `wait_lap` from [`NotifyTunables::fd_monitor_wait_lap`].
    ///
    /// # Errors
    ///
    /// Returns an error if the wake event can't be created.
    pub fn with_tunables(tunables: &NotifyTunables) -> miette::Result<Self> {
        Self::with_wait_lap(tunables.fd_monitor_wait_lap)
    }

    /// Hand `item` to the monitor. Starts the background thread if it isn't running.
    ///
    /// # Errors
    ///
    /// Returns [`ThreadSpawnError`] if the background thread had to be started and
    /// couldn't be. The item is dropped in that case.
    ///
    /// # Panics
    ///
    /// Panics if `item` was already added to a monitor.
    pub fn add(&self, item: FdMonitorItem) -> miette::Result<FdMonitorItemId> {
        self.add_with_spawner(item, |name, background| {
            spawn_detached(name, move || background.run())
        })
    }

    fn add_with_spawner(
        &self,
        mut item: FdMonitorItem,
        spawn: impl FnOnce(&'static str, BackgroundFdMonitor) -> std::io::Result<()>,
    ) -> miette::Result<FdMonitorItemId> {
        assert!(
            !item.item_id.is_registered(),
            "FdMonitorItem {} was already added",
            item.item_id.0
        );

        let item_id = FdMonitorItemId(self.last_id.next_id());
        item.item_id = item_id;

        {
            let mut data = self.handle.lock();
            data.pending.push(item);

            // Spawn under the lock: a concurrent add() must not see `running` set for a
            // thread that failed to start.
            if !data.running {
                DEBUG_FD_MONITOR.then(|| {
                    tracing::debug!(message = "fd monitor thread starting", item_id = item_id.0);
                });
                data.running = true;
                let background = BackgroundFdMonitor::new(self.handle.clone(), self.wait_lap);
                let name = "fd_monitor";
                if let Err(source) = spawn(name, background) {
                    data.running = false;
                    data.pending.retain(|it| it.item_id != item_id);
                    return Err(ThreadSpawnError {
                        name: name.to_owned(),
                        source,
                    }
                    .into());
                }
            }
        }

        self.handle.change_signaller.post();
        Ok(item_id)
    }

    /// Ask for the item's callback to run with [`ItemWakeReason::Poked`] soon. Unknown or
    /// already-removed ids are ignored by the background thread.
    ///
    /// [`ItemWakeReason::Poked`]: super::ItemWakeReason::Poked
    ///
    /// # Panics
    ///
    /// Panics on the unregistered id `0`.
    pub fn poke(&self, item_id: FdMonitorItemId) {
        assert!(item_id.is_registered(), "Invalid FdMonitorItemId 0");
        let needs_notification = {
            let mut data = self.handle.lock();
            let was_empty = data.pokelist.is_empty();
            if let Err(pos) = data.pokelist.binary_search(&item_id) {
                data.pokelist.insert(pos, item_id);
            }
            was_empty
        };

        if needs_notification {
            self.handle.change_signaller.post();
        }
    }

    /// Is the background thread alive right now?
    #[must_use]
    pub fn is_running(&self) -> bool { self.handle.lock().running }

    #[must_use]
    pub fn wait_lap(&self) -> Duration { self.wait_lap }
}

impl Drop for FdMonitor {
    fn drop(&mut self) {
        self.handle.lock().terminate = true;
        self.handle.change_signaller.post();
        while self.handle.lock().running {
            std::thread::sleep(Duration::from_millis(5));
        }
    }
}
