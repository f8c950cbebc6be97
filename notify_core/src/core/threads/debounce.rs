// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

use super::{DEBUG_IOTHREAD, MainThreadQueue, ThreadPool, io_thread_pool};
use crate::{Continuation, DEFAULT_DEBOUNCE_TIMEOUT, NotifyTunables};
use std::{num::NonZeroU64,
          sync::{Arc, Mutex, MutexGuard},
          time::{Duration, Instant}};

/// A pending request. Receives the token of the servicing thread so completions can
/// tell whether that thread was abandoned.
type DebounceRequest = Box<dyn FnOnce(NonZeroU64) + Send + 'static>;

/// Runs at most one request at a time on a background thread, with at most one more
/// queued. A new request overwrites the queued one, so a burst collapses to its latest.
///
/// # Tokens and abandonment
///
/// Each servicing thread gets a fresh token from a monotonic counter. If the running
/// request has taken longer than the timeout when a new one arrives, the running
/// thread is abandoned: its token stops being the active one, a fresh thread with a
/// new token picks up the queued request, and the old thread exits as soon as its
/// current request returns. Nothing is interrupted. A zero timeout never abandons.
///
/// ```text
///  perform(A) ─► token 1 runs A ───────────────────────(slow)──► exits, A's result dropped
///  perform(B) ─► queued
///  perform(C) ─► replaces B; A over timeout ─► token 2 runs C
/// ```
///
/// Cloning yields another handle to the same debouncer.
#[derive(Clone)]
pub struct Debounce {
    timeout: Duration,
    /// `None` submits to the process-wide [`io_thread_pool()`].
    pool: Option<ThreadPool>,
    data: Arc<Mutex<DebounceData>>,
}

struct DebounceData {
    /// Overwritten by every [`Debounce::perform()`].
    next_req: Option<DebounceRequest>,
    /// Token of the non-abandoned servicing thread, if any.
    active_token: Option<NonZeroU64>,
    next_token: NonZeroU64,
    /// When the active thread started its current request.
    start_time: Instant,
}

impl std::fmt::Debug for Debounce {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let data = self.lock();
        f.debug_struct("Debounce")
            .field("timeout", &self.timeout)
            .field("pool", &self.pool)
            .field("has_pending", &data.next_req.is_some())
            .field("active_token", &data.active_token)
            .finish_non_exhaustive()
    }
}

impl Default for Debounce {
    fn default() -> Self { Self::new(DEFAULT_DEBOUNCE_TIMEOUT) }
}

impl Debounce {
    /// Services requests on the process-wide io pool.
    #[must_use]
    pub fn new(timeout: Duration) -> Self {
        Self {
            timeout,
            pool: None,
            data: Arc::new(Mutex::new(DebounceData {
                next_req: None,
                active_token: None,
                next_token: NonZeroU64::MIN,
                start_time: Instant::now(),
            })),
        }
    }

    /// Services requests on the io pool, abandoning after
    /// [`NotifyTunables::debounce_timeout`].
    #[must_use]
    pub fn with_tunables(tunables: &NotifyTunables) -> Self {
        Self::new(tunables.debounce_timeout)
    }

    /// Services requests on `pool` instead of the io pool.
    #[must_use]
    pub fn with_pool(pool: ThreadPool, timeout: Duration) -> Self {
        Self {
            pool: Some(pool),
            ..Self::new(timeout)
        }
    }

    #[must_use]
    pub fn timeout(&self) -> Duration { self.timeout }

    /// Is a request queued and not yet started?
    #[must_use]
    pub fn has_pending(&self) -> bool { self.lock().next_req.is_some() }

    /// Token of the thread currently servicing this debouncer, if any.
    #[must_use]
    pub fn active_token(&self) -> Option<NonZeroU64> { self.lock().active_token }

    /// Queue `handler`, replacing any queued request that hasn't started.
    ///
    /// Returns the token of the thread that will service it. A token larger than any
    /// previously returned means a new thread was started.
    pub fn perform(&self, handler: impl FnOnce() + Send + 'static) -> NonZeroU64 {
        self.perform_inner(Box::new(move |_token| handler()))
    }

    /// Like [`perform()`](Self::perform), then deliver the handler's result to
    /// `completion` on the main thread through `queue`.
    ///
    /// If the servicing thread was abandoned while `handler` ran, the result is
    /// dropped and `completion` never runs.
    pub fn perform_with_completion<Ctx, H, R, C>(
        &self,
        queue: &MainThreadQueue<Ctx>,
        handler: H,
        completion: C,
    ) -> NonZeroU64
    where
        Ctx: 'static,
        H: FnOnce() -> R + Send + 'static,
        R: Send + 'static,
        C: FnOnce(&mut Ctx, R) + Send + 'static,
    {
        let queue = queue.clone();
        let data = Arc::clone(&self.data);
        self.perform_inner(Box::new(move |token| {
            let result = handler();
            let still_active = lock_data(&data).active_token == Some(token);
            if still_active {
                queue.push(move |ctx: &mut Ctx| completion(ctx, result));
            } else {
                DEBUG_IOTHREAD.then(|| {
                    tracing::debug!(
                        message = "dropping result of abandoned debounce thread",
                        token = token.get()
                    );
                });
            }
        }))
    }

    fn perform_inner(&self, request: DebounceRequest) -> NonZeroU64 {
        let (active_token, spawn) = {
            let mut data = self.lock();
            data.next_req = Some(request);

            if data.active_token.is_some()
                && !self.timeout.is_zero()
                && data.start_time.elapsed() > self.timeout
            {
                DEBUG_IOTHREAD.then(|| {
                    tracing::debug!(
                        message = "abandoning debounce thread",
                        token = ?data.active_token
                    );
                });
                data.active_token = None;
            }

            match data.active_token {
                Some(token) => (token, false),
                None => {
                    // Mark the start so the next request doesn't immediately abandon
                    // this thread too.
                    let token = data.next_token;
                    data.active_token = Some(token);
                    data.next_token = token.saturating_add(1);
                    data.start_time = Instant::now();
                    (token, true)
                }
            }
        };

        // Submit after unlocking.
        if spawn {
            let debounce = self.clone();
            let pool = match &self.pool {
                Some(pool) => pool,
                None => io_thread_pool(),
            };
            pool.perform(
                move || {
                    while debounce.run_next(active_token) == Continuation::Continue {}
                },
                false,
            );
        }

        active_token
    }

    /// Run the queued request on the thread holding `token`. Runs on a pool thread.
    fn run_next(&self, token: NonZeroU64) -> Continuation {
        let request = {
            let mut data = self.lock();
            if data.active_token != Some(token) {
                // Abandoned. The fresh thread owns the queue now.
                return Continuation::Stop;
            }
            match data.next_req.take() {
                Some(request) => {
                    data.start_time = Instant::now();
                    request
                }
                None => {
                    data.active_token = None;
                    return Continuation::Stop;
                }
            }
        };

        request(token);
        Continuation::Continue
    }

    fn lock(&self) -> MutexGuard<'_, DebounceData> { lock_data(&self.data) }
}

fn lock_data(data: &Mutex<DebounceData>) -> MutexGuard<'_, DebounceData> {
    data.lock().expect("Debounce mutex poisoned")
}
