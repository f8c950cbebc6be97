// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

use crate::{GenerationList, Topic, TopicMonitor, TopicSet};
use pretty_assertions::assert_eq;
use std::{sync::{Arc, Barrier, mpsc},
          thread,
          time::Duration};
use test_case::test_case;

fn monitor_for(nonblocking: bool) -> TopicMonitor {
    if nonblocking {
        TopicMonitor::with_nonblocking_reader().unwrap()
    } else {
        TopicMonitor::new().unwrap()
    }
}

/// Every round the poster posts once after all checkers have caught up. A checker
/// that misses a wakeup hangs, and the outer timeout catches it.
#[test_case(false ; "blocking reader")]
#[test_case(true ; "nonblocking reader")]
fn no_missed_wakeup_across_threads(nonblocking: bool) {
    const CHECKERS: usize = 4;
    const ROUNDS: u64 = 100;

    let monitor = Arc::new(monitor_for(nonblocking));
    let barrier = Arc::new(Barrier::new(CHECKERS + 1));
    let (done_tx, done_rx) = mpsc::channel();

    for _ in 0..CHECKERS {
        let monitor = Arc::clone(&monitor);
        let barrier = Arc::clone(&barrier);
        let done_tx = done_tx.clone();
        thread::spawn(move || {
            let mut gens = GenerationList::new();
            for round in 1..=ROUNDS {
                barrier.wait();
                let changed = monitor.check(&mut gens, Topic::InternalExit.into(), true);
                assert_eq!(changed, TopicSet::from(Topic::InternalExit));
                assert_eq!(gens.get(Topic::InternalExit), round);
            }
            done_tx.send(gens).unwrap();
        });
    }
    drop(done_tx);

    {
        let monitor = Arc::clone(&monitor);
        let barrier = Arc::clone(&barrier);
        thread::spawn(move || {
            for _ in 0..ROUNDS {
                barrier.wait();
                monitor.post(Topic::InternalExit);
            }
        });
    }

    for _ in 0..CHECKERS {
        let gens = done_rx
            .recv_timeout(Duration::from_secs(20))
            .expect("checker missed a wakeup");
        assert_eq!(gens.get(Topic::InternalExit), ROUNDS);
    }
}

#[test]
fn posts_without_a_check_coalesce_into_one_generation() {
    let monitor = TopicMonitor::new().unwrap();
    let mut gens = GenerationList::new();

    for _ in 0..5 {
        monitor.post(Topic::SigChld);
    }
    let changed = monitor.check(&mut gens, Topic::SigChld.into(), false);
    assert_eq!(changed, TopicSet::from(Topic::SigChld));
    assert_eq!(gens.get(Topic::SigChld), 1);
    assert_eq!(monitor.current_generations().metageneration(), 1);
}

#[test]
fn non_waiting_check_reports_nothing_when_idle() {
    let monitor = TopicMonitor::new().unwrap();
    let mut gens = GenerationList::new();
    assert!(monitor.check(&mut gens, TopicSet::all(), false).is_empty());
    assert_eq!(gens, GenerationList::new());
}

#[test]
fn only_topics_of_interest_are_reported_and_refreshed() {
    let monitor = TopicMonitor::new().unwrap();
    let mut gens = GenerationList::new();

    monitor.post(Topic::SigHupInt);
    monitor.post(Topic::SigChld);

    let interest = TopicSet::from(Topic::SigChld) | Topic::InternalExit;
    let changed = monitor.check(&mut gens, interest, false);
    assert_eq!(changed, TopicSet::from(Topic::SigChld));
    assert_eq!(gens.get(Topic::SigChld), 1);
    // Not asked about, so not refreshed.
    assert_eq!(gens.get(Topic::SigHupInt), 0);
}

#[test]
fn waiting_check_ignores_other_topics() {
    let monitor = Arc::new(TopicMonitor::new().unwrap());
    let (tx, rx) = mpsc::channel();

    {
        let monitor = Arc::clone(&monitor);
        thread::spawn(move || {
            let mut gens = GenerationList::new();
            let changed = monitor.check(&mut gens, Topic::SigChld.into(), true);
            tx.send(changed).unwrap();
        });
    }

    thread::sleep(Duration::from_millis(30));
    monitor.post(Topic::SigHupInt);
    assert!(rx.recv_timeout(Duration::from_millis(100)).is_err());

    monitor.post(Topic::SigChld);
    let changed = rx.recv_timeout(Duration::from_secs(5)).unwrap();
    assert_eq!(changed, TopicSet::from(Topic::SigChld));
}
