//! Keyed set difference, the primitive behind every reconciliation pass.

use std::collections::HashSet;
use std::hash::Hash;

/// What has to change to turn one collection into another.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delta<T> {
    /// Present now, absent from the desired collection. In `current` order.
    pub to_remove: Vec<T>,
    /// Absent now, present in the desired collection. In `desired` order.
    pub to_add: Vec<T>,
}

impl<T> Delta<T> {
    /// Returns `true` when the collections already agree.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.to_remove.is_empty() && self.to_add.is_empty()
    }

    /// Total number of operations the delta implies.
    #[must_use]
    pub fn len(&self) -> usize {
        self.to_remove.len() + self.to_add.len()
    }
}

impl<T> Default for Delta<T> {
    fn default() -> Self {
        Self {
            to_remove: Vec::new(),
            to_add: Vec::new(),
        }
    }
}

/// Computes which elements to remove from `current` and which to add from
/// `desired` so that both sides end up with the same key set.
///
/// Elements whose key appears on both sides are left alone; attribute drift
/// inside a matched pair is not detected. Desired elements sharing a key
/// collapse to the first one. Runs in `O(|current| + |desired|)`.
pub fn diff<T, K, F>(current: &[T], desired: &[T], key: F) -> Delta<T>
where
    T: Clone,
    K: Eq + Hash,
    F: Fn(&T) -> K,
{
    let current_keys: HashSet<K> = current.iter().map(&key).collect();
    let desired_keys: HashSet<K> = desired.iter().map(&key).collect();

    let to_remove = current
        .iter()
        .filter(|item| !desired_keys.contains(&key(*item)))
        .cloned()
        .collect();

    let mut queued = HashSet::new();
    let to_add = desired
        .iter()
        .filter(|item| {
            let k = key(*item);
            !current_keys.contains(&k) && queued.insert(k)
        })
        .cloned()
        .collect();

    Delta { to_remove, to_add }
}
