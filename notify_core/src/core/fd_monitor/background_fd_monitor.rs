// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

use super::{DEBUG_FD_MONITOR, FdMonitorHandle, FdMonitorItem, FdMonitorItemId,
            FdReadableSet};
use crate::{Continuation, ItemAction, assert_is_background_thread};
use rustix::io::Errno;
use std::time::{Duration, Instant};

/// The background half of an [`FdMonitor`]. Owns the active item list.
///
/// [`FdMonitor`]: super::FdMonitor
#[derive(Debug)]
pub(crate) struct BackgroundFdMonitor {
    handle: FdMonitorHandle,
    items: Vec<FdMonitorItem>,
    /// Ids captured from the shared poke list, serviced at the top of the next lap.
    pokelist: Vec<FdMonitorItemId>,
    wait_lap: Duration,
}

impl BackgroundFdMonitor {
    #[must_use]
    pub(crate) fn new(handle: FdMonitorHandle, wait_lap: Duration) -> Self {
        Self {
            handle,
            items: vec![],
            pokelist: vec![],
            wait_lap,
        }
    }

    pub(crate) fn run(mut self) {
        assert_is_background_thread();
        while self.run_one_lap() == Continuation::Continue {}
        DEBUG_FD_MONITOR.then(|| {
            tracing::debug!(message = "fd monitor thread exiting");
        });
    }

    fn run_one_lap(&mut self) -> Continuation {
        if !self.pokelist.is_empty() {
            let pokelist = std::mem::take(&mut self.pokelist);
            self.items.retain_mut(|item| {
                retain_or_log(item.maybe_poke(&pokelist), item.item_id)
            });
        }

        let mut now = Instant::now();
        let mut timeout: Option<Duration> = None;
        for item in &mut self.items {
            if item.last_time.is_none() {
                item.last_time = Some(now);
            }
            if let Some(remaining) = item.remaining_time(now) {
                timeout = Some(timeout.map_or(remaining, |it| it.min(remaining)));
            }
        }

        // With no items, linger one wait-lap so add() bursts don't churn threads.
        let is_wait_lap = self.items.is_empty();
        if is_wait_lap {
            timeout = Some(self.wait_lap);
        }

        // Index 0 is the change signaller, index i + 1 is items[i].
        let readable = {
            let fds = std::iter::once(self.handle.change_signaller.read_fd())
                .chain(self.items.iter().filter_map(|it| it.fd.as_fd()));
            match FdReadableSet::check_readable(fds, timeout) {
                Ok(set) => set,
                Err(Errno::INTR) => FdReadableSet::default(),
                Err(errno) => {
                    tracing::error!(message = "fd monitor poll failed", error = %errno);
                    FdReadableSet::default()
                }
            }
        };

        now = Instant::now();
        let mut index = 0;
        self.items.retain_mut(|item| {
            let is_readable = item.fd.is_open() && {
                index += 1;
                readable.test(index)
            };
            retain_or_log(item.service(is_readable, now), item.item_id)
        });

        let change_signalled = readable.test(0);
        if !change_signalled && !is_wait_lap {
            return Continuation::Continue;
        }

        self.handle.change_signaller.try_consume();
        let mut data = self.handle.lock();
        self.items.append(&mut data.pending);

        debug_assert!(self.pokelist.is_empty(), "dropping pokes");
        std::mem::swap(&mut self.pokelist, &mut data.pokelist);

        // Decide under the lock, otherwise a concurrent add() could see `running` and
        // skip starting a thread that is about to exit.
        let idle = is_wait_lap
            && self.items.is_empty()
            && self.pokelist.is_empty()
            && !change_signalled;
        if data.terminate || idle {
            debug_assert!(data.running, "the running thread must see running");
            data.running = false;
            return Continuation::Stop;
        }

        Continuation::Continue
    }
}

fn retain_or_log(action: ItemAction, item_id: FdMonitorItemId) -> bool {
    match action {
        ItemAction::Retain => true,
        ItemAction::Remove => {
            DEBUG_FD_MONITOR.then(|| {
                tracing::debug!(message = "removing fd monitor item", item_id = item_id.0);
            });
            false
        }
    }
}
