// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

use super::{BinarySemaphore, DEBUG_TOPIC_MONITOR, Generation, GenerationList, Topic,
            TopicSet, WakeSource};
use crate::{NotifyTunables, ReadEndMode};
use std::sync::{Condvar, Mutex, MutexGuard,
                atomic::{AtomicU8, Ordering, fence}};

/// State guarded by [`TopicMonitor`]'s lock.
#[derive(Debug, Default)]
struct TopicMonitorData {
    /// Latest generation of each topic. Only grows.
    current: GenerationList,
    /// Some thread is blocked in [`WakeSource::wait()`]. At most one at a time.
    has_reader: bool,
}

/// Generation-counted notifications that are safe to post from a signal handler.
///
/// Posters call [`post()`]. Observers keep their own [`GenerationList`] and call
/// [`check()`] to learn which topics advanced since they last looked, optionally
/// blocking until one does.
///
/// # How posting stays signal-safe
///
/// [`post()`] only touches `pending_updates` (an atomic bitmask) and writes one byte
/// to the wake source. Turning pending bits into generation increments ("flushing")
/// happens later under the lock, on the observer's side.
///
/// # Single reader
///
/// However many threads wait, exactly one of them (the one that sets `has_reader`)
/// blocks in [`WakeSource::wait()`]. The rest sleep on `data_notifier` and are woken
/// when generations change or the reader leaves, then re-compare generations. No
/// thread trusts the number of wake bytes.
///
/// [`check()`]: Self::check
/// [`post()`]: Self::post
pub struct TopicMonitor<S: WakeSource = BinarySemaphore> {
    data: Mutex<TopicMonitorData>,
    /// Notified when generations change or the reader is done.
    data_notifier: Condvar,
    /// Topics posted but not yet flushed into `data.current`.
    pending_updates: AtomicU8,
    wake: S,
}

impl<S: WakeSource> std::fmt::Debug for TopicMonitor<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TopicMonitor")
            .field(
                "pending_updates",
                &TopicSet::from_bits_truncate(self.pending_updates.load(Ordering::Relaxed)),
            )
            .finish_non_exhaustive()
    }
}

impl TopicMonitor {
    /// A monitor with a blocking wake pipe.
    ///
    /// # Errors
    ///
    /// Returns [`WakePipeCreationError`](super::WakePipeCreationError) if the pipe
    /// can't be created. There is no degraded mode.
    pub fn new() -> miette::Result<Self> { Self::with_read_end_mode(ReadEndMode::Blocking) }

    /// A monitor whose reader polls for readability before reading.
    ///
    /// # Errors
    ///
    /// See [`TopicMonitor::new()`].
    pub fn with_nonblocking_reader() -> miette::Result<Self> {
        Self::with_read_end_mode(ReadEndMode::NonBlocking)
    }

    /// # Errors
    ///
    /// See [`TopicMonitor::new()`].
    pub fn with_tunables(tunables: &NotifyTunables) -> miette::Result<Self> {
        if tunables.topic_nonblocking_reader {
            Self::with_nonblocking_reader()
        } else {
            Self::new()
        }
    }

    fn with_read_end_mode(read_end_mode: ReadEndMode) -> miette::Result<Self> {
        let wake = BinarySemaphore::new(read_end_mode)?;
        Ok(Self::with_wake_source(wake))
    }
}

impl<S: WakeSource> TopicMonitor<S> {
    pub fn with_wake_source(wake: S) -> Self {
        Self {
            data: Mutex::new(TopicMonitorData::default()),
            data_notifier: Condvar::new(),
            pending_updates: AtomicU8::new(0),
            wake,
        }
    }

    pub fn wake_source(&self) -> &S { &self.wake }

    fn lock(&self) -> MutexGuard<'_, TopicMonitorData> {
        self.data.lock().expect("TopicMonitor data mutex poisoned")
    }

    /// Record that `topic` happened. Async-signal-safe: no allocation, no lock, no
    /// logging.
    pub fn post(&self, topic: Topic) {
        let bit = topic.bit();
        let old_bits = self.pending_updates.fetch_or(bit, Ordering::Relaxed);
        fence(Ordering::Release);
        // Already pending means someone else already woke the reader.
        if old_bits & bit == 0 {
            self.wake.post();
        }
    }

    /// Apply pending posts to `data.current`. Caller holds the lock.
    fn flush_pending_updates(&self, data: &mut TopicMonitorData) {
        let changed_bits = self.pending_updates.swap(0, Ordering::Relaxed);
        fence(Ordering::Acquire);
        if changed_bits == 0 {
            return;
        }
        for topic in TopicSet::from_bits_truncate(changed_bits).iter() {
            data.current.increment(topic);
        }
        DEBUG_TOPIC_MONITOR.then(|| {
            tracing::debug!(message = "flushed topic posts", generations = %data.current);
        });
        self.data_notifier.notify_all();
    }

    /// The current generations, with pending posts applied.
    pub fn current_generations(&self) -> GenerationList {
        let mut data = self.lock();
        self.flush_pending_updates(&mut data);
        data.current
    }

    pub fn generation_for_topic(&self, topic: Topic) -> Generation {
        self.current_generations().get(topic)
    }

    /// Block until the current generations differ from `input_gens`, and return them.
    ///
    /// The first thread to find nothing new becomes the reader and blocks on the wake
    /// source. Everyone else waits on the condvar for the reader (or a flush).
    pub fn await_gens(&self, input_gens: &GenerationList) -> GenerationList {
        let mut gens = *input_gens;
        while gens == *input_gens {
            let become_reader = {
                let mut data = self.lock();
                loop {
                    self.flush_pending_updates(&mut data);
                    gens = data.current;
                    if gens != *input_gens {
                        break false;
                    }
                    if !data.has_reader {
                        data.has_reader = true;
                        break true;
                    }
                    data = self
                        .data_notifier
                        .wait(data)
                        .expect("TopicMonitor data mutex poisoned");
                }
            };

            if become_reader {
                DEBUG_TOPIC_MONITOR.then(|| {
                    tracing::debug!(message = "became reader", generations = %gens);
                });
                self.wake.wait();

                let mut data = self.lock();
                self.flush_pending_updates(&mut data);
                gens = data.current;
                data.has_reader = false;
                self.data_notifier.notify_all();
            }
        }
        gens
    }

    /// Bring `gens` up to date for `topics` and return the ones that advanced.
    ///
    /// With `wait`, block until at least one of `topics` advanced. Without it, return
    /// right away, possibly with an empty set. Slots of `gens` outside `topics` are
    /// left alone. An empty `topics` never blocks.
    pub fn check(&self, gens: &mut GenerationList, topics: TopicSet, wait: bool) -> TopicSet {
        if topics.is_empty() {
            return TopicSet::empty();
        }

        let mut current = self.current_generations();
        loop {
            let mut changed = TopicSet::empty();
            for topic in topics.iter() {
                debug_assert!(
                    gens[topic] <= current[topic],
                    "observer generation is ahead of the monitor"
                );
                if gens[topic] < current[topic] {
                    gens[topic] = current[topic];
                    changed.insert(topic);
                }
            }
            if !wait || !changed.is_empty() {
                return changed;
            }
            current = self.await_gens(&current);
        }
    }
}
