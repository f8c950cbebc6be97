// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! Construction-time tunables: [`NotifyTunables`].

use std::time::Duration;

/// Default soft minimum of live pool threads. A thread at the soft minimum waits for
/// work (up to [`DEFAULT_POOL_IDLE_WAIT`]) instead of exiting immediately.
pub const DEFAULT_POOL_SOFT_MIN_THREADS: usize = 1;

/// Default cap on live pool threads (ignored by `cant_wait` submissions).
pub const DEFAULT_POOL_MAX_THREADS: usize = 1024;

/// How long a thread at the soft minimum waits for work before exiting.
pub const DEFAULT_POOL_IDLE_WAIT: Duration = Duration::from_millis(500);

/// How long a debounced unit of work may run before a new request abandons it.
pub const DEFAULT_DEBOUNCE_TIMEOUT: Duration = Duration::from_millis(500);

/// How long the fd monitor thread lingers with no items before it exits.
pub const DEFAULT_FD_MONITOR_WAIT_LAP: Duration = Duration::from_millis(256);

/// The small set of knobs that the notification core exposes.
///
/// None of these change correctness, only latency and resource usage. They are not
/// user-facing configuration: the shell picks them once at startup and passes them to
/// the constructors that care.
///
/// | Field                       | Consumer                  | Zero means                     |
/// | :-------------------------- | :------------------------ | :----------------------------- |
/// | [`pool_soft_min_threads`]   | [`ThreadPool`]            | every idle thread exits        |
/// | [`pool_max_threads`]        | [`ThreadPool`]            | only `cant_wait` spawns        |
/// | [`pool_idle_wait`]          | [`ThreadPool`] workers    | never wait on the condvar      |
/// | [`debounce_timeout`]        | [`Debounce`]              | never abandon                  |
/// | [`fd_monitor_wait_lap`]     | [`FdMonitor`]             | exit as soon as empty          |
/// | [`topic_nonblocking_reader`]| [`TopicMonitor`]          | (bool) blocking `read(2)`      |
///
/// [`Debounce`]: crate::Debounce
/// [`FdMonitor`]: crate::FdMonitor
/// [`ThreadPool`]: crate::ThreadPool
/// [`TopicMonitor`]: crate::TopicMonitor
/// [`debounce_timeout`]: Self::debounce_timeout
/// [`fd_monitor_wait_lap`]: Self::fd_monitor_wait_lap
/// [`pool_idle_wait`]: Self::pool_idle_wait
/// [`pool_max_threads`]: Self::pool_max_threads
/// [`pool_soft_min_threads`]: Self::pool_soft_min_threads
/// [`topic_nonblocking_reader`]: Self::topic_nonblocking_reader
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NotifyTunables {
    pub pool_soft_min_threads: usize,
    pub pool_max_threads: usize,
    pub pool_idle_wait: Duration,
    pub debounce_timeout: Duration,
    pub fd_monitor_wait_lap: Duration,
    /// Make the topic monitor's wake pipe non-blocking and wait for readability with
    /// `poll(2)` before reading. Useful under tooling that swallows signals while a
    /// thread sits in a blocking `read(2)`.
    pub topic_nonblocking_reader: bool,
}

impl Default for NotifyTunables {
    fn default() -> Self {
        Self {
            pool_soft_min_threads: DEFAULT_POOL_SOFT_MIN_THREADS,
            pool_max_threads: DEFAULT_POOL_MAX_THREADS,
            pool_idle_wait: DEFAULT_POOL_IDLE_WAIT,
            debounce_timeout: DEFAULT_DEBOUNCE_TIMEOUT,
            fd_monitor_wait_lap: DEFAULT_FD_MONITOR_WAIT_LAP,
            topic_nonblocking_reader: false,
        }
    }
}

impl NotifyTunables {
    #[must_use]
    pub fn with_pool_soft_min_threads(mut self, it: usize) -> Self {
        self.pool_soft_min_threads = it;
        self
    }

    #[must_use]
    pub fn with_pool_max_threads(mut self, it: usize) -> Self {
        self.pool_max_threads = it;
        self
    }

    #[must_use]
    pub fn with_pool_idle_wait(mut self, it: Duration) -> Self {
        self.pool_idle_wait = it;
        self
    }

    #[must_use]
    pub fn with_debounce_timeout(mut self, it: Duration) -> Self {
        self.debounce_timeout = it;
        self
    }

    #[must_use]
    pub fn with_fd_monitor_wait_lap(mut self, it: Duration) -> Self {
        self.fd_monitor_wait_lap = it;
        self
    }

    #[must_use]
    pub fn with_topic_nonblocking_reader(mut self, it: bool) -> Self {
        self.topic_nonblocking_reader = it;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn defaults_match_historical_values() {
        let it = NotifyTunables::default();
        assert_eq!(it.pool_soft_min_threads, 1);
        assert_eq!(it.pool_max_threads, 1024);
        assert_eq!(it.pool_idle_wait, Duration::from_millis(500));
        assert_eq!(it.debounce_timeout, Duration::from_millis(500));
        assert_eq!(it.fd_monitor_wait_lap, Duration::from_millis(256));
        assert!(!it.topic_nonblocking_reader);
    }

    #[test]
    fn builder_overrides_only_named_fields() {
        let it = NotifyTunables::default()
            .with_pool_max_threads(4)
            .with_pool_idle_wait(Duration::ZERO);
        assert_eq!(it.pool_max_threads, 4);
        assert_eq!(it.pool_idle_wait, Duration::ZERO);
        assert_eq!(it.pool_soft_min_threads, DEFAULT_POOL_SOFT_MIN_THREADS);
        assert_eq!(it.debounce_timeout, DEFAULT_DEBOUNCE_TIMEOUT);
    }
}
