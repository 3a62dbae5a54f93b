use crate::metajob::Metajob;
use std::collections::BTreeSet;

/// An in-memory ordered multiset of [`Metajob`], kept sorted ascending on its sort key at all
/// times.
///
/// `Metajob::id` is globally unique in practice, so a `BTreeSet` gives us insert / pop-min /
/// pop-max / snapshot in `O(log n)` without ever needing to reconcile duplicate keys; the ordering
/// the set maintains for us is exactly the lexicographic `(priority, run_at, id)` order
/// `JobCache` needs.
#[derive(Debug, Default)]
pub(crate) struct SortedStore {
    entries: BTreeSet<Metajob>,
}

impl SortedStore {
    pub(crate) fn new() -> Self {
        SortedStore {
            entries: BTreeSet::new(),
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub(crate) fn insert(&mut self, job: Metajob) {
        let _ = self.entries.insert(job);
    }

    /// The most important (smallest) entry, without removing it.
    pub(crate) fn peek_min(&self) -> Option<&Metajob> {
        self.entries.iter().next()
    }

    /// Removes and returns the most important (smallest) entry.
    pub(crate) fn pop_min(&mut self) -> Option<Metajob> {
        self.entries.pop_first()
    }

    /// Removes and returns the least important (largest) entry — the one `push` evicts first
    /// when the store is over capacity.
    pub(crate) fn pop_max(&mut self) -> Option<Metajob> {
        self.entries.pop_last()
    }

    /// A freshly allocated, ascending snapshot of the store's contents. Independent of the store
    /// afterward — mutating the store does not affect a previously returned snapshot.
    pub(crate) fn snapshot(&self) -> Vec<Metajob> {
        self.entries.iter().cloned().collect()
    }

    /// Removes every entry and returns them in ascending order.
    pub(crate) fn drain_sorted(&mut self) -> Vec<Metajob> {
        std::mem::take(&mut self.entries).into_iter().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, SystemTime};

    fn job(priority: i64, id: i64) -> Metajob {
        Metajob::new(priority, SystemTime::UNIX_EPOCH + Duration::from_secs(id as u64), id)
    }

    #[test]
    fn pop_min_returns_ascending_order() {
        let mut store = SortedStore::new();
        store.insert(job(2, 2));
        store.insert(job(1, 1));
        store.insert(job(3, 3));

        assert_eq!(store.pop_min(), Some(job(1, 1)));
        assert_eq!(store.pop_min(), Some(job(2, 2)));
        assert_eq!(store.pop_min(), Some(job(3, 3)));
        assert_eq!(store.pop_min(), None);
    }

    #[test]
    fn pop_max_returns_least_important_first() {
        let mut store = SortedStore::new();
        store.insert(job(1, 1));
        store.insert(job(2, 2));
        store.insert(job(3, 3));

        assert_eq!(store.pop_max(), Some(job(3, 3)));
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn snapshot_is_sorted_and_independent() {
        let mut store = SortedStore::new();
        store.insert(job(5, 5));
        store.insert(job(1, 1));

        let snapshot = store.snapshot();
        assert_eq!(snapshot, vec![job(1, 1), job(5, 5)]);

        store.insert(job(0, 0));
        assert_eq!(snapshot, vec![job(1, 1), job(5, 5)]);
    }

    #[test]
    fn drain_sorted_empties_the_store() {
        let mut store = SortedStore::new();
        store.insert(job(2, 2));
        store.insert(job(1, 1));

        assert_eq!(store.drain_sorted(), vec![job(1, 1), job(2, 2)]);
        assert!(store.is_empty());
        assert_eq!(store.drain_sorted(), Vec::new());
    }
}
