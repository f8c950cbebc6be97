// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

use super::{DEBUG_IOTHREAD, ThreadPoolShared, WorkItem, thread_id};
use crate::Continuation;
use std::{sync::Arc, time::Duration};

/// The loop run by every [`ThreadPool`] thread. Owns a share of the pool's state so the
/// pool handle can be dropped while workers drain the queue.
///
/// [`ThreadPool`]: super::ThreadPool
#[allow(missing_debug_implementations)]
pub struct WorkerThread {
    shared: Arc<ThreadPoolShared>,
    soft_min_threads: usize,
    idle_wait: Duration,
}

impl WorkerThread {
    #[must_use]
    pub fn new(
        shared: Arc<ThreadPoolShared>,
        soft_min_threads: usize,
        idle_wait: Duration,
    ) -> Self {
        Self {
            shared,
            soft_min_threads,
            idle_wait,
        }
    }

    pub fn run(mut self) {
        while self.run_one() == Continuation::Continue {}

        DEBUG_IOTHREAD.then(|| {
            tracing::debug!(message = "worker exiting", thread_id = thread_id());
        });
    }

    fn run_one(&mut self) -> Continuation {
        match self.dequeue_work_or_commit_to_exit() {
            Some(work_item) => {
                work_item();
                Continuation::Continue
            }
            None => Continuation::Stop,
        }
    }

    /// Pop a work item, idling first if the queue is empty and this thread is at the
    /// soft minimum. Returning `None` means this thread has already been subtracted
    /// from the live count and must exit.
    fn dequeue_work_or_commit_to_exit(&mut self) -> Option<WorkItem> {
        let mut data = self.shared.lock();

        if data.request_queue.is_empty()
            && data.total_threads == self.soft_min_threads
            && !self.idle_wait.is_zero()
        {
            data.waiting_threads += 1;
            data = self
                .shared
                .cond_var
                .wait_timeout(data, self.idle_wait)
                .expect("ThreadPool mutex poisoned")
                .0;
            data.waiting_threads -= 1;
        }

        let result = data.request_queue.pop_front();

        // Balance the increment made when this thread was spawned, while still holding
        // the lock, so perform() never counts a thread that won't pick up work.
        if result.is_none() {
            data.total_threads -= 1;
        }

        result
    }
}
