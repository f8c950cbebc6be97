// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

use crate::core::test_fixtures::{Gate, wait_until};
use crate::{NotifyTunables, ThreadPool};
use pretty_assertions::assert_eq;
use std::{sync::{Arc, Mutex,
                 atomic::{AtomicUsize, Ordering}},
          time::Duration};

#[derive(Default)]
struct Occupancy {
    running: AtomicUsize,
    peak: AtomicUsize,
    done: AtomicUsize,
}

impl Occupancy {
    fn enter(&self) {
        let now = self.running.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
    }

    fn leave(&self) {
        self.running.fetch_sub(1, Ordering::SeqCst);
        self.done.fetch_add(1, Ordering::SeqCst);
    }
}

#[test]
fn single_thread_pool_is_fifo() {
    let pool = ThreadPool::new(0, 1);
    let order = Arc::new(Mutex::new(vec![]));
    for it in 0..10 {
        let order = Arc::clone(&order);
        pool.perform(move || order.lock().unwrap().push(it), false);
    }
    assert!(wait_until(Duration::from_secs(5), || order.lock().unwrap().len() == 10));
    assert_eq!(*order.lock().unwrap(), (0..10).collect::<Vec<_>>());
}

#[test]
fn live_threads_never_exceed_max() {
    let max_threads = 3;
    let pool = ThreadPool::new(0, max_threads);
    let gate = Gate::default();
    let occupancy = Arc::new(Occupancy::default());

    for _ in 0..12 {
        let gate = gate.clone();
        let occupancy = Arc::clone(&occupancy);
        pool.perform(
            move || {
                occupancy.enter();
                gate.wait();
                occupancy.leave();
            },
            false,
        );
        assert!(pool.live_threads() <= max_threads);
    }

    assert!(wait_until(Duration::from_secs(5), || {
        occupancy.running.load(Ordering::SeqCst) == max_threads
    }));
    assert_eq!(pool.live_threads(), max_threads);
    assert_eq!(pool.queued(), 12 - max_threads);

    gate.open();
    assert!(wait_until(Duration::from_secs(5), || {
        occupancy.done.load(Ordering::SeqCst) == 12
    }));
    assert!(occupancy.peak.load(Ordering::SeqCst) <= max_threads);

    // Soft minimum of zero: every thread leaves once the queue is empty.
    assert!(wait_until(Duration::from_secs(5), || pool.live_threads() == 0));
}

#[test]
fn cant_wait_spawns_past_the_limit() {
    let pool = ThreadPool::new(0, 1);
    let gate = Gate::default();

    let blocker_gate = gate.clone();
    pool.perform(move || blocker_gate.wait(), false);
    assert!(wait_until(Duration::from_secs(5), || pool.queued() == 0));

    // Without cant_wait this would sit behind the blocker forever.
    let (tx, rx) = std::sync::mpsc::channel();
    let live_at_submit = pool.perform(move || tx.send(()).unwrap(), true);
    assert_eq!(live_at_submit, 1);
    assert!(rx.recv_timeout(Duration::from_secs(5)).is_ok());

    gate.open();
    assert!(wait_until(Duration::from_secs(5), || pool.live_threads() == 0));
}

#[test]
fn threads_above_soft_min_exit_and_soft_min_thread_lingers() {
    let idle_wait = Duration::from_millis(300);
    let pool = ThreadPool::with_tunables(
        &NotifyTunables::default()
            .with_pool_soft_min_threads(1)
            .with_pool_max_threads(4)
            .with_pool_idle_wait(idle_wait),
    );
    let gate = Gate::default();
    let occupancy = Arc::new(Occupancy::default());

    for _ in 0..4 {
        let gate = gate.clone();
        let occupancy = Arc::clone(&occupancy);
        pool.perform(
            move || {
                occupancy.enter();
                gate.wait();
                occupancy.leave();
            },
            false,
        );
    }
    assert!(wait_until(Duration::from_secs(5), || {
        occupancy.running.load(Ordering::SeqCst) == 4
    }));
    assert_eq!(pool.live_threads(), 4);

    gate.open();

    // Extra threads leave at once. The last one idles at the soft minimum.
    assert!(wait_until(Duration::from_secs(5), || pool.live_threads() <= 1));

    // Then it gives up after the idle wait.
    assert!(wait_until(idle_wait * 10, || pool.live_threads() == 0));
}

#[test]
fn idle_thread_is_woken_instead_of_spawning() {
    let pool = ThreadPool::with_tunables(
        &NotifyTunables::default()
            .with_pool_soft_min_threads(1)
            .with_pool_max_threads(4)
            .with_pool_idle_wait(Duration::from_secs(10)),
    );

    let (tx, rx) = std::sync::mpsc::channel();
    let first_tx = tx.clone();
    pool.perform(move || first_tx.send(1).unwrap(), false);
    assert_eq!(rx.recv_timeout(Duration::from_secs(5)).unwrap(), 1);
    assert!(wait_until(Duration::from_secs(5), || pool.idle_threads() == 1));

    let live_at_submit = pool.perform(move || tx.send(2).unwrap(), false);
    assert_eq!(live_at_submit, 1);
    assert_eq!(pool.live_threads(), 1);
    assert_eq!(rx.recv_timeout(Duration::from_secs(5)).unwrap(), 2);
}

#[test]
fn zero_idle_wait_exits_immediately() {
    let pool = ThreadPool::with_tunables(
        &NotifyTunables::default()
            .with_pool_soft_min_threads(1)
            .with_pool_idle_wait(Duration::ZERO),
    );
    let (tx, rx) = std::sync::mpsc::channel();
    pool.perform(move || tx.send(()).unwrap(), false);
    rx.recv_timeout(Duration::from_secs(5)).unwrap();
    assert!(wait_until(Duration::from_millis(500), || pool.live_threads() == 0));
}
