// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

// cspell:words SIGHUP SIGINT SIGCHLD

use strum::IntoEnumIterator;
use strum_macros::{Display, EnumCount, EnumIter};

/// Something that can happen asynchronously. Posting to a topic means it happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Display, EnumIter,
         EnumCount)]
#[repr(u8)]
pub enum Topic {
    /// `SIGHUP` or `SIGINT` was delivered.
    SigHupInt,
    /// `SIGCHLD` was delivered.
    SigChld,
    /// An internal (in-process) job finished.
    InternalExit,
}

impl Topic {
    #[must_use]
    pub const fn index(self) -> usize { self as usize }

    #[must_use]
    pub const fn bit(self) -> u8 { 1 << (self as u8) }
}

/// A set of [`Topic`]s, stored as a bitmask.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct TopicSet(u8);

impl TopicSet {
    #[must_use]
    pub const fn empty() -> Self { Self(0) }

    #[must_use]
    pub fn all() -> Self { Topic::iter().collect() }

    #[must_use]
    pub const fn from_bits_truncate(bits: u8) -> Self {
        Self(bits & ((1 << <Topic as strum::EnumCount>::COUNT) - 1))
    }

    #[must_use]
    pub const fn bits(self) -> u8 { self.0 }

    #[must_use]
    pub const fn is_empty(self) -> bool { self.0 == 0 }

    #[must_use]
    pub const fn contains(self, topic: Topic) -> bool { self.0 & topic.bit() != 0 }

    pub fn insert(&mut self, topic: Topic) { self.0 |= topic.bit(); }

    #[must_use]
    pub const fn union(self, other: Self) -> Self { Self(self.0 | other.0) }

    pub fn iter(self) -> impl Iterator<Item = Topic> {
        Topic::iter().filter(move |topic| self.contains(*topic))
    }
}

impl From<Topic> for TopicSet {
    fn from(topic: Topic) -> Self { Self(topic.bit()) }
}

impl FromIterator<Topic> for TopicSet {
    fn from_iter<I: IntoIterator<Item = Topic>>(iter: I) -> Self {
        let mut it = Self::empty();
        for topic in iter {
            it.insert(topic);
        }
        it
    }
}

impl std::ops::BitOr for TopicSet {
    type Output = Self;
    fn bitor(self, rhs: Self) -> Self { self.union(rhs) }
}

impl std::ops::BitOr<Topic> for TopicSet {
    type Output = Self;
    fn bitor(self, rhs: Topic) -> Self { self.union(rhs.into()) }
}

impl std::fmt::Debug for TopicSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn bits_are_distinct() {
        let bits: Vec<u8> = Topic::iter().map(Topic::bit).collect();
        assert_eq!(bits, vec![0b001, 0b010, 0b100]);
        assert_eq!(TopicSet::all().bits(), 0b111);
    }

    #[test]
    fn set_operations() {
        let mut set = TopicSet::empty();
        assert!(set.is_empty());
        set.insert(Topic::SigChld);
        assert!(set.contains(Topic::SigChld));
        assert!(!set.contains(Topic::SigHupInt));

        let both = set | Topic::InternalExit;
        assert_eq!(both.iter().collect::<Vec<_>>(), vec![
            Topic::SigChld,
            Topic::InternalExit
        ]);
        assert_eq!(format!("{both:?}"), "{SigChld, InternalExit}");
    }

    #[test]
    fn truncates_unknown_bits() {
        assert_eq!(TopicSet::from_bits_truncate(0xFF), TopicSet::all());
    }
}
