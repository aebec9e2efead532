//! Keyed reconciliation between a rendered set and a model set.

use std::collections::HashSet;
use std::fmt::Debug;
use std::hash::Hash;

/// Result of diffing two keyed collections.
///
/// The three lists are disjoint. `create` and `update` follow the order of
/// the current collection, `delete` follows the order of the previous one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyedDiff<K> {
    pub create: Vec<K>,
    pub update: Vec<K>,
    pub delete: Vec<K>,
}

impl<K> Default for KeyedDiff<K> {
    fn default() -> Self {
        Self {
            create: Vec::new(),
            update: Vec::new(),
            delete: Vec::new(),
        }
    }
}

impl<K> KeyedDiff<K> {
    /// True when nothing has to be created or deleted.
    pub fn is_stable(&self) -> bool {
        self.create.is_empty() && self.delete.is_empty()
    }
}

/// Compute the create/update/delete sets that turn `previous` into `current`.
///
/// Keys are compared by identity, never by position. A key repeated in
/// `current` is only taken once; later duplicates are logged and dropped.
pub fn diff<K>(previous: &[K], current: &[K]) -> KeyedDiff<K>
where
    K: Clone + Eq + Hash + Debug,
{
    let before: HashSet<&K> = previous.iter().collect();
    let mut seen: HashSet<&K> = HashSet::with_capacity(current.len());
    let mut result = KeyedDiff::default();

    for key in current {
        if !seen.insert(key) {
            log::warn!("Duplicate key {key:?}, ignoring repeated entry");
            continue;
        }
        if before.contains(key) {
            result.update.push(key.clone());
        } else {
            result.create.push(key.clone());
        }
    }

    let mut removed: HashSet<&K> = HashSet::new();
    for key in previous {
        if !seen.contains(key) && removed.insert(key) {
            result.delete.push(key.clone());
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_enter_update_exit() {
        let result = diff(&["a", "b", "c"], &["b", "d", "a"]);
        assert_eq!(result.create, vec!["d"]);
        assert_eq!(result.update, vec!["b", "a"]);
        assert_eq!(result.delete, vec!["c"]);
        assert!(!result.is_stable());
    }

    #[test]
    fn test_same_keys_are_stable() {
        let keys = ["x", "y", "z"];
        let result = diff(&keys, &keys);
        assert!(result.is_stable());
        assert_eq!(result.update, keys.to_vec());
    }

    #[test]
    fn test_reorder_is_update_only() {
        let result = diff(&[1, 2, 3], &[3, 1, 2]);
        assert!(result.is_stable());
        assert_eq!(result.update, vec![3, 1, 2]);
    }

    #[test]
    fn test_empty_previous_creates_everything() {
        let result = diff(&[], &["a", "b"]);
        assert_eq!(result.create, vec!["a", "b"]);
        assert!(result.update.is_empty());
        assert!(result.delete.is_empty());
    }

    #[test]
    fn test_duplicate_current_keys_taken_once() {
        let result = diff(&["a"], &["a", "b", "a", "b"]);
        assert_eq!(result.update, vec!["a"]);
        assert_eq!(result.create, vec!["b"]);
        assert!(result.delete.is_empty());
    }
}
