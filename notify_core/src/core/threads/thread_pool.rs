// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

use super::{DEBUG_IOTHREAD, ThreadSpawnError, WorkItem, WorkerThread, spawn_detached};
use crate::NotifyTunables;
use std::{collections::VecDeque,
          sync::{Arc, Condvar, Mutex, MutexGuard},
          time::Duration};

/// Lock-guarded state shared by a [`ThreadPool`] and its [`WorkerThread`]s.
#[derive(Default)]
#[allow(missing_debug_implementations)]
pub struct ThreadPoolProtected {
    /// Outstanding, unclaimed work.
    pub request_queue: VecDeque<WorkItem>,
    /// Threads that exist in the pool, including ones that committed to spawning but
    /// haven't started yet.
    pub total_threads: usize,
    /// Threads idling on [`ThreadPoolShared::cond_var`].
    pub waiting_threads: usize,
}

/// Lives behind an [`Arc`] so that detached workers can outlive the [`ThreadPool`]
/// handle that spawned them.
#[derive(Default)]
#[allow(missing_debug_implementations)]
pub struct ThreadPoolShared {
    pub mutex: Mutex<ThreadPoolProtected>,
    /// Signals "new work available". Tied to [`mutex`](Self::mutex).
    pub cond_var: Condvar,
}

impl ThreadPoolShared {
    pub fn lock(&self) -> MutexGuard<'_, ThreadPoolProtected> {
        self.mutex.lock().expect("ThreadPool mutex poisoned")
    }
}

/// A FIFO work queue serviced by a self-sizing set of detached worker threads.
///
/// - Grows on demand up to [`max_threads`](Self::max_threads). A `cant_wait`
///   submission may exceed it.
/// - Shrinks on its own. A worker that finds the queue empty exits, unless exiting
///   would take the pool below [`soft_min_threads`](Self::soft_min_threads), in which
///   case it first idles for up to the configured idle wait.
///
/// Cloning is cheap and yields another handle to the same pool.
///
/// ```
/// use shell_notify::ThreadPool;
/// use std::sync::mpsc;
///
/// let pool = ThreadPool::new(1, 4);
/// let (tx, rx) = mpsc::channel();
/// pool.perform(move || tx.send(42).unwrap(), false);
/// assert_eq!(rx.recv().unwrap(), 42);
/// ```
#[derive(Clone)]
pub struct ThreadPool {
    shared: Arc<ThreadPoolShared>,
    soft_min_threads: usize,
    max_threads: usize,
    idle_wait: Duration,
}

impl std::fmt::Debug for ThreadPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ThreadPool")
            .field("soft_min_threads", &self.soft_min_threads)
            .field("max_threads", &self.max_threads)
            .field("idle_wait", &self.idle_wait)
            .finish_non_exhaustive()
    }
}

impl ThreadPool {
    /// Uses the default idle wait from [`NotifyTunables`].
    #[must_use]
    pub fn new(soft_min_threads: usize, max_threads: usize) -> Self {
        Self::with_tunables(
            &NotifyTunables::default()
                .with_pool_soft_min_threads(soft_min_threads)
                .with_pool_max_threads(max_threads),
        )
    }

    #[must_use]
    pub fn with_tunables(tunables: &NotifyTunables) -> Self {
        Self {
            shared: Arc::default(),
            soft_min_threads: tunables.pool_soft_min_threads,
            max_threads: tunables.pool_max_threads,
            idle_wait: tunables.pool_idle_wait,
        }
    }

    #[must_use]
    pub fn soft_min_threads(&self) -> usize { self.soft_min_threads }

    #[must_use]
    pub fn max_threads(&self) -> usize { self.max_threads }

    /// Live worker threads right now.
    #[must_use]
    pub fn live_threads(&self) -> usize { self.shared.lock().total_threads }

    /// Workers currently idling for work.
    #[must_use]
    pub fn idle_threads(&self) -> usize { self.shared.lock().waiting_threads }

    /// Work items not yet picked up by a worker.
    #[must_use]
    pub fn queued(&self) -> usize { self.shared.lock().request_queue.len() }

    /// Enqueue `func` to run on a pool thread.
    ///
    /// If `cant_wait` is set, a new thread is spawned when no idle thread can take the
    /// work, even at [`max_threads`](Self::max_threads). Use it when deferring the work
    /// could deadlock, e.g. a pool job that waits on another job it submits.
    ///
    /// Returns the number of live threads at the time of enqueueing.
    ///
    /// # Panics
    ///
    /// Panics if `cant_wait` is set and a needed thread can't be spawned. Without
    /// `cant_wait`, a spawn failure only means the work waits for an existing thread.
    pub fn perform<F>(&self, func: F, cant_wait: bool) -> usize
    where
        F: FnOnce() + Send + 'static,
    {
        self.perform_inner(Box::new(func), cant_wait)
    }

    fn perform_inner(&self, work_item: WorkItem, cant_wait: bool) -> usize {
        enum ThreadAction {
            None,
            Wake,
            Spawn,
        }

        let (local_thread_count, thread_action) = {
            let mut data = self.shared.lock();
            let local_thread_count = data.total_threads;
            data.request_queue.push_back(work_item);

            DEBUG_IOTHREAD.then(|| {
                tracing::debug!(
                    message = "enqueued work item",
                    queue_len = data.request_queue.len(),
                    total_threads = data.total_threads,
                    waiting_threads = data.waiting_threads
                );
            });

            let thread_action = if data.waiting_threads >= data.request_queue.len() {
                ThreadAction::Wake
            } else if cant_wait || data.total_threads < self.max_threads {
                data.total_threads += 1;
                ThreadAction::Spawn
            } else {
                ThreadAction::None
            };
            (local_thread_count, thread_action)
        };

        // Act only after unlocking the mutex.
        match thread_action {
            ThreadAction::None => {}
            ThreadAction::Wake => self.shared.cond_var.notify_one(),
            ThreadAction::Spawn => {
                if let Err(err) = self.spawn_worker() {
                    self.shared.lock().total_threads -= 1;
                    assert!(!cant_wait, "{err}: {}", err.source);
                    tracing::warn!(
                        message = "worker spawn failed, work stays queued",
                        error = %err.source
                    );
                }
            }
        }

        local_thread_count
    }

    fn spawn_worker(&self) -> Result<(), ThreadSpawnError> {
        let worker = WorkerThread::new(
            Arc::clone(&self.shared),
            self.soft_min_threads,
            self.idle_wait,
        );
        let name = "iothread";
        spawn_detached(name, move || worker.run()).map_err(|source| ThreadSpawnError {
            name: name.to_owned(),
            source,
        })
    }
}
