// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

use super::Topic;
use strum::{EnumCount, IntoEnumIterator};

/// Per-topic event counter. Starts at 0, only grows, never wraps in practice.
pub type Generation = u64;

/// One [`Generation`] per [`Topic`]: the latest generations some observer knows of.
///
/// The monitor's current list only grows slot-wise. An observer's list is always
/// slot-wise less than or equal to it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct GenerationList([Generation; Topic::COUNT]);

impl GenerationList {
    #[must_use]
    pub const fn new() -> Self { Self([0; Topic::COUNT]) }

    #[must_use]
    pub fn get(&self, topic: Topic) -> Generation { self.0[topic.index()] }

    pub fn set(&mut self, topic: Topic, generation: Generation) {
        self.0[topic.index()] = generation;
    }

    /// Bump `topic` by one. Used by the monitor when flushing posts.
    pub fn increment(&mut self, topic: Topic) { self.0[topic.index()] += 1; }

    /// Lower this list's `topic` slot to `other`'s, if `other`'s is smaller.
    pub fn set_min_from(&mut self, topic: Topic, other: &Self) {
        let other = other.get(topic);
        if self.get(topic) > other {
            self.set(topic, other);
        }
    }

    /// Sum of all slots. Grows whenever any topic does.
    #[must_use]
    pub fn metageneration(&self) -> Generation { self.0.iter().sum() }

    #[must_use]
    pub fn as_array(&self) -> [Generation; Topic::COUNT] { self.0 }
}

impl std::ops::Index<Topic> for GenerationList {
    type Output = Generation;
    fn index(&self, topic: Topic) -> &Generation { &self.0[topic.index()] }
}

impl std::ops::IndexMut<Topic> for GenerationList {
    fn index_mut(&mut self, topic: Topic) -> &mut Generation { &mut self.0[topic.index()] }
}

/// `1,0,4`: one number per topic in declaration order.
impl std::fmt::Display for GenerationList {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (idx, topic) in Topic::iter().enumerate() {
            if idx > 0 {
                f.write_str(",")?;
            }
            write!(f, "{}", self.get(topic))?;
        }
        Ok(())
    }
}
