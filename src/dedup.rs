//! Tracking of build revisions that have already been announced.

use std::collections::HashSet;

/// Store of revisions whose notification has been published.
///
/// The reconciliation loop is the only writer. A revision is added only
/// after its comment has been posted, so a restart (or a failed post) leads
/// to the revision being announced again.
#[cfg_attr(test, mockall::automock)]
pub trait RevisionStore: Send {
    /// Returns true when the revision has already been announced.
    fn contains(&self, revision: &str) -> bool;

    /// Records a successfully announced revision.
    fn add(&mut self, revision: &str);
}

/// Process-local revision store, reset on every restart.
#[derive(Debug, Default, Clone)]
pub struct InMemoryRevisionStore {
    revisions: HashSet<String>,
}

impl InMemoryRevisionStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of recorded revisions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.revisions.len()
    }

    /// Returns true when nothing has been recorded yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.revisions.is_empty()
    }
}

impl RevisionStore for InMemoryRevisionStore {
    fn contains(&self, revision: &str) -> bool {
        self.revisions.contains(revision)
    }

    fn add(&mut self, revision: &str) {
        self.revisions.insert(revision.to_owned());
    }
}

#[cfg(test)]
mod tests {
    use super::{InMemoryRevisionStore, RevisionStore};

    #[test]
    fn starts_empty() {
        let store = InMemoryRevisionStore::new();
        assert!(store.is_empty());
        assert!(!store.contains("abc123"));
    }

    #[test]
    fn remembers_added_revisions() {
        let mut store = InMemoryRevisionStore::new();
        store.add("abc123");

        assert!(store.contains("abc123"));
        assert!(!store.contains("def456"));
    }

    #[test]
    fn adding_twice_keeps_one_entry() {
        let mut store = InMemoryRevisionStore::new();
        store.add("abc123");
        store.add("abc123");

        assert_eq!(store.len(), 1);
    }
}
