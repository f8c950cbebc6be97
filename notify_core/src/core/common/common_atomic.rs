// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! Extension trait for [`AtomicU64`] used by the monotonic id allocators. See
//! [`AtomicU64Ext`] for details.
//!
//! [`AtomicU64`]: std::sync::atomic::AtomicU64

use std::sync::atomic::{AtomicU64, Ordering};

/// Ergonomic helpers for [`AtomicU64`] id allocators that hide the [`fetch_add`]
/// return-value quirk.
///
/// ## The `fetch_add` quirk
///
/// [`AtomicU64::fetch_add`] atomically adds to the stored value but returns the **old**
/// value, not the new one. [`next_id`] derives the new value locally from the old value
/// rather than issuing a second load, which would race with other allocators:
///
/// ```text
///              Thread A              Thread B          Stored
///              --------              --------          ------
///                                                        5
///  fetch_add(1) -> old=5                                 6
///                              fetch_add(1) -> old=6     7
///
///  // Bad: self.load() returns 7 (Thread B's increment leaked in)
///  // Good: old + 1 returns 6 (derived from own old value)
/// ```
///
/// Ids start at `1` when the counter starts at `0`, so `0` can be used as a "not yet
/// assigned" sentinel. A 64-bit counter never wraps in practice.
///
/// [`AtomicU64::fetch_add`]: std::sync::atomic::AtomicU64::fetch_add
/// [`fetch_add`]: std::sync::atomic::AtomicU64::fetch_add
/// [`next_id`]: Self::next_id
pub trait AtomicU64Ext {
    /// Atomically increments the counter and returns the **new** value.
    fn next_id(&self) -> u64;

    /// Reads the current value (the last id handed out, or `0`).
    fn last_id(&self) -> u64;
}

impl AtomicU64Ext for AtomicU64 {
    fn next_id(&self) -> u64 { self.fetch_add(1, Ordering::Relaxed) + 1 }

    fn last_id(&self) -> u64 { self.load(Ordering::Relaxed) }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::{collections::HashSet, sync::Arc, thread};

    #[test]
    fn first_id_is_one() {
        let counter = AtomicU64::new(0);
        assert_eq!(counter.last_id(), 0);
        assert_eq!(counter.next_id(), 1);
        assert_eq!(counter.next_id(), 2);
        assert_eq!(counter.last_id(), 2);
    }

    #[test]
    fn concurrent_ids_are_unique() {
        let counter = Arc::new(AtomicU64::new(0));
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let counter = Arc::clone(&counter);
                thread::spawn(move || {
                    (0..250).map(|_| counter.next_id()).collect::<Vec<_>>()
                })
            })
            .collect();

        let mut seen = HashSet::new();
        for handle in handles {
            for id in handle.join().unwrap() {
                assert!(seen.insert(id), "duplicate id {id}");
            }
        }
        assert_eq!(seen.len(), 1000);
        assert!(!seen.contains(&0));
    }
}
