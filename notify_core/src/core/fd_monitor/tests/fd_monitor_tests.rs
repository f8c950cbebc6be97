// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! Behavior of a live [`FdMonitor`] thread driven through real pipes.

use crate::{FdMonitor, FdMonitorItem, ItemFd, ItemWakeReason, ReadEndMode, WakePipe,
            core::test_fixtures::wait_until, drain_wake_bytes, write_wake_byte};
use pretty_assertions::assert_eq;
use std::{os::fd::{AsFd, OwnedFd},
          sync::{Arc, Mutex},
          time::{Duration, Instant}};

type Seen = Arc<Mutex<Vec<(ItemWakeReason, Instant)>>>;

/// A pipe whose read end is wrapped in an item that records every wake reason, drains
/// on `Readable`, and closes itself when `close_on` fires.
fn recording_item(
    timeout: Option<Duration>,
    close_on: Option<ItemWakeReason>,
) -> (FdMonitorItem, Seen, OwnedFd) {
    let WakePipe { read, write } = WakePipe::new(ReadEndMode::NonBlocking).unwrap();
    let seen: Seen = Arc::default();
    let seen_in_callback = Arc::clone(&seen);
    let item = FdMonitorItem::new(read, timeout, move |fd: &mut ItemFd, reason| {
        seen_in_callback
            .lock()
            .unwrap()
            .push((reason, Instant::now()));
        if reason == ItemWakeReason::Readable
            && let Some(borrowed) = fd.as_fd()
        {
            drain_wake_bytes(borrowed).unwrap();
        }
        if close_on == Some(reason) {
            fd.close();
        }
    });
    (item, seen, write)
}

fn reasons(seen: &Seen) -> Vec<ItemWakeReason> {
    seen.lock().unwrap().iter().map(|(it, _)| *it).collect()
}

#[test]
fn one_byte_yields_exactly_one_readable_callback() {
    let monitor = FdMonitor::new().unwrap();
    let (item, seen, write) = recording_item(None, None);
    monitor.add(item).unwrap();

    write_wake_byte(write.as_fd()).unwrap();
    assert!(wait_until(Duration::from_secs(2), || !reasons(&seen).is_empty()));

    // No spurious repeats while nothing else is written.
    std::thread::sleep(Duration::from_millis(200));
    assert_eq!(reasons(&seen), vec![ItemWakeReason::Readable]);

    write_wake_byte(write.as_fd()).unwrap();
    assert!(wait_until(Duration::from_secs(2), || reasons(&seen).len() == 2));
}

#[test]
fn only_the_written_pipe_is_readable() {
    let monitor = FdMonitor::new().unwrap();
    let (quiet_item, quiet_seen, _quiet_write) = recording_item(None, None);
    let (loud_item, loud_seen, loud_write) = recording_item(None, None);
    monitor.add(quiet_item).unwrap();
    monitor.add(loud_item).unwrap();

    write_wake_byte(loud_write.as_fd()).unwrap();
    assert!(wait_until(Duration::from_secs(2), || !reasons(&loud_seen).is_empty()));
    std::thread::sleep(Duration::from_millis(50));
    assert!(reasons(&quiet_seen).is_empty());
}

#[test]
fn timeout_fires_once_and_not_early() {
    let monitor = FdMonitor::new().unwrap();
    let timeout = Duration::from_millis(50);
    let (item, seen, _write) = recording_item(Some(timeout), Some(ItemWakeReason::TimedOut));

    let added_at = Instant::now();
    monitor.add(item).unwrap();

    assert!(wait_until(Duration::from_secs(2), || !reasons(&seen).is_empty()));
    std::thread::sleep(Duration::from_millis(150));

    let seen = seen.lock().unwrap();
    assert_eq!(seen.len(), 1);
    let (reason, fired_at) = seen[0];
    assert_eq!(reason, ItemWakeReason::TimedOut);
    assert!(fired_at.duration_since(added_at) >= timeout);
}

#[test]
fn timeout_repeats_until_closed() {
    let monitor = FdMonitor::new().unwrap();
    let (item, seen, _write) = recording_item(Some(Duration::from_millis(20)), None);
    monitor.add(item).unwrap();
    assert!(wait_until(Duration::from_secs(2), || reasons(&seen).len() >= 3));
    assert!(reasons(&seen).iter().all(|it| *it == ItemWakeReason::TimedOut));
}

#[test]
fn poke_runs_callback_without_data() {
    let monitor = FdMonitor::new().unwrap();
    let (item, seen, _write) = recording_item(None, Some(ItemWakeReason::Poked));
    let item_id = monitor.add(item).unwrap();

    monitor.poke(item_id);
    monitor.poke(item_id);
    assert!(wait_until(Duration::from_secs(2), || !reasons(&seen).is_empty()));
    std::thread::sleep(Duration::from_millis(50));

    // The callback closed the item on the first poke, so a second one can't land.
    assert_eq!(reasons(&seen), vec![ItemWakeReason::Poked]);

    // Poking a removed item is ignored.
    monitor.poke(item_id);
    std::thread::sleep(Duration::from_millis(50));
    assert_eq!(reasons(&seen).len(), 1);
}

#[test]
fn thread_exits_after_wait_lap_and_restarts_on_add() {
    let wait_lap = Duration::from_millis(50);
    let monitor = FdMonitor::with_wait_lap(wait_lap).unwrap();

    let (item, seen, write) = recording_item(None, Some(ItemWakeReason::Readable));
    monitor.add(item).unwrap();
    assert!(monitor.is_running());

    write_wake_byte(write.as_fd()).unwrap();
    assert!(wait_until(Duration::from_secs(2), || !reasons(&seen).is_empty()));

    // Item removed; the thread should notice within about one wait-lap.
    assert!(wait_until(wait_lap * 10, || !monitor.is_running()));

    let (item, seen, write) = recording_item(None, Some(ItemWakeReason::Readable));
    monitor.add(item).unwrap();
    assert!(monitor.is_running());
    write_wake_byte(write.as_fd()).unwrap();
    assert!(wait_until(Duration::from_secs(2), || !reasons(&seen).is_empty()));
}

#[test]
fn hung_up_pipe_is_readable_until_closed() {
    let monitor = FdMonitor::new().unwrap();
    let (item, seen, write) = recording_item(None, Some(ItemWakeReason::Readable));
    monitor.add(item).unwrap();
    drop(write);
    assert!(wait_until(Duration::from_secs(2), || !reasons(&seen).is_empty()));
    std::thread::sleep(Duration::from_millis(50));
    assert_eq!(reasons(&seen), vec![ItemWakeReason::Readable]);
}

#[test]
fn drop_stops_a_busy_monitor() {
    let monitor = FdMonitor::new().unwrap();
    let (item, _seen, _write) = recording_item(Some(Duration::from_secs(60)), None);
    monitor.add(item).unwrap();
    assert!(monitor.is_running());

    let started = Instant::now();
    drop(monitor);
    assert!(started.elapsed() < Duration::from_secs(2));
}

#[test]
#[should_panic(expected = "Invalid FdMonitorItemId 0")]
fn poking_unregistered_id_panics() {
    let monitor = FdMonitor::new().unwrap();
    monitor.poke(crate::FdMonitorItemId::default());
}
