//! Insertion-ordered set of checksums.

use std::collections::HashSet;

/// Unique checksums in first-seen order.
///
/// Adding a checksum that is already present changes nothing, so the output
/// order is the order in which each checksum was first added.
#[derive(Debug, Clone, Default)]
pub struct ChecksumSet {
    order: Vec<String>,
    seen: HashSet<String>,
}

impl ChecksumSet {
    /// Creates an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a checksum; returns true if it was not already present.
    pub fn add(&mut self, checksum: impl Into<String>) -> bool {
        let checksum = checksum.into();
        if self.seen.contains(&checksum) {
            return false;
        }
        self.seen.insert(checksum.clone());
        self.order.push(checksum);
        true
    }

    /// Returns true if `checksum` has been added.
    #[must_use]
    pub fn contains(&self, checksum: &str) -> bool {
        self.seen.contains(checksum)
    }

    /// Number of unique checksums.
    #[must_use]
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Returns true if nothing has been added.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Iterates checksums in first-seen order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }

    /// Consumes the set, returning checksums in first-seen order.
    #[must_use]
    pub fn into_ordered(self) -> Vec<String> {
        self.order
    }
}

impl<S: Into<String>> Extend<S> for ChecksumSet {
    fn extend<I: IntoIterator<Item = S>>(&mut self, iter: I) {
        for checksum in iter {
            self.add(checksum);
        }
    }
}

impl<S: Into<String>> FromIterator<S> for ChecksumSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut set = Self::new();
        set.extend(iter);
        set
    }
}
