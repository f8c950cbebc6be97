// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

use super::{ThreadPool, assert_is_main_thread};
use crate::{FdEventSignaller, is_fd_readable};
use miette::IntoDiagnostic;
use std::{os::fd::BorrowedFd,
          sync::{Arc, Mutex},
          time::Duration};

/// A callback that must run on the main thread with the main loop's context.
pub type MainThreadCallback<Ctx> = Box<dyn FnOnce(&mut Ctx) + Send + 'static>;

/// Hands results from background threads back to the main loop.
///
/// Any thread may [`push()`](Self::push). The main loop watches [`port()`](Self::port)
/// next to its other descriptors and calls [`service_main()`](Self::service_main) when
/// it is readable, which runs the queued callbacks in FIFO order with `&mut Ctx`.
///
/// `Ctx` is whatever the main loop owns and background code must never touch directly
/// (the line editor, the parser, ...). Cloning yields another handle to the same queue.
pub struct MainThreadQueue<Ctx> {
    inner: Arc<MainThreadQueueInner<Ctx>>,
}

struct MainThreadQueueInner<Ctx> {
    queue: Mutex<Vec<MainThreadCallback<Ctx>>>,
    signaller: FdEventSignaller,
}

impl<Ctx> Clone for MainThreadQueue<Ctx> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<Ctx> std::fmt::Debug for MainThreadQueue<Ctx> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MainThreadQueue")
            .field("signaller", &self.inner.signaller)
            .finish_non_exhaustive()
    }
}

impl<Ctx> MainThreadQueue<Ctx> {
    /// # Errors
    ///
    /// Returns an error if the wake event can't be created.
    pub fn new() -> miette::Result<Self> {
        Ok(Self {
            inner: Arc::new(MainThreadQueueInner {
                queue: Mutex::new(vec![]),
                signaller: FdEventSignaller::new().into_diagnostic()?,
            }),
        })
    }

    /// Queue `callback` for the main thread and wake it.
    pub fn push(&self, callback: impl FnOnce(&mut Ctx) + Send + 'static) {
        self.inner
            .queue
            .lock()
            .expect("MainThreadQueue mutex poisoned")
            .push(Box::new(callback));
        self.inner.signaller.post();
    }

    /// Readable when callbacks are waiting.
    #[must_use]
    pub fn port(&self) -> BorrowedFd<'_> { self.inner.signaller.read_fd() }

    /// Callbacks queued and not yet serviced.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner
            .queue
            .lock()
            .expect("MainThreadQueue mutex poisoned")
            .len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool { self.len() == 0 }

    /// Run every queued callback, oldest first.
    ///
    /// # Panics
    ///
    /// Panics when not called on the main thread.
    pub fn service_main(&self, ctx: &mut Ctx) {
        assert_is_main_thread();

        // Consume before taking the queue. push() does the opposite, so a callback
        // pushed after the take leaves the port readable.
        self.inner.signaller.try_consume();

        let callbacks = std::mem::take(
            &mut *self
                .inner
                .queue
                .lock()
                .expect("MainThreadQueue mutex poisoned"),
        );
        for callback in callbacks {
            callback(ctx);
        }
    }

    /// [`service_main()`](Self::service_main) if the port becomes readable within
    /// `timeout`.
    pub fn service_main_with_timeout(&self, ctx: &mut Ctx, timeout: Duration) {
        if is_fd_readable(self.port(), Some(timeout)) {
            self.service_main(ctx);
        }
    }

    /// Keep servicing until `pool` has no live threads, then service once more. Polls,
    /// so it is meant for tests and diagnostics, not the interactive loop.
    pub fn drain_all(&self, pool: &ThreadPool, ctx: &mut Ctx) {
        while pool.live_threads() > 0 {
            self.service_main_with_timeout(ctx, Duration::from_millis(100));
        }
        self.service_main(ctx);
    }
}
