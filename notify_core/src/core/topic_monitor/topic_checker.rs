// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

use super::{BinarySemaphore, Generation, GenerationList, PrincipalNotInitialized, Topic,
            TopicMonitor, WakeSource, principal};

/// Watches a single [`Topic`]. Remembers the generation it last saw, so each
/// [`check()`] answers "did this happen since I last asked?".
///
/// [`check()`]: Self::check
#[derive(Debug)]
pub struct TopicChecker<'a, S: WakeSource = BinarySemaphore> {
    monitor: &'a TopicMonitor<S>,
    topic: Topic,
    gens: GenerationList,
}

impl<'a, S: WakeSource> TopicChecker<'a, S> {
    /// Starts from the monitor's current generations, so posts that already happened
    /// are not reported.
    pub fn new(monitor: &'a TopicMonitor<S>, topic: Topic) -> Self {
        Self {
            monitor,
            topic,
            gens: monitor.current_generations(),
        }
    }

    #[must_use]
    pub fn topic(&self) -> Topic { self.topic }

    /// The last generation this checker observed.
    #[must_use]
    pub fn generation(&self) -> Generation { self.gens.get(self.topic) }

    /// Has the topic advanced since the last call? Never blocks.
    pub fn check(&mut self) -> bool {
        !self
            .monitor
            .check(&mut self.gens, self.topic.into(), false)
            .is_empty()
    }

    /// Block until the topic advances.
    pub fn wait(&mut self) { self.monitor.check(&mut self.gens, self.topic.into(), true); }
}

impl TopicChecker<'static> {
    /// # Errors
    ///
    /// Returns [`PrincipalNotInitialized`] before the principal monitor exists.
    pub fn for_principal(topic: Topic) -> Result<Self, PrincipalNotInitialized> {
        principal().map(|monitor| Self::new(monitor, topic))
    }
}
