// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! Synchronization helpers shared by the threaded tests.

use std::{sync::{Arc, Condvar, Mutex},
          time::{Duration, Instant}};

/// Poll `predicate` every few milliseconds until it holds or `limit` passes.
pub fn wait_until(limit: Duration, mut predicate: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + limit;
    while Instant::now() < deadline {
        if predicate() {
            return true;
        }
        std::thread::sleep(Duration::from_millis(5));
    }
    predicate()
}

/// A one-way latch that blocked jobs wait on until the test opens it.
#[derive(Debug, Clone, Default)]
pub struct Gate {
    inner: Arc<(Mutex<bool>, Condvar)>,
}

impl Gate {
    pub fn wait(&self) {
        let (open, cv) = &*self.inner;
        let guard = open.lock().unwrap();
        let _guard = cv.wait_while(guard, |open| !*open).unwrap();
    }

    pub fn open(&self) {
        let (open, cv) = &*self.inner;
        *open.lock().unwrap() = true;
        cv.notify_all();
    }
}
