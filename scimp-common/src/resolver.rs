//! Existence checks by exact, case-sensitive name.

use std::collections::HashMap;
use std::collections::hash_map::Entry;

use tracing::warn;

/// Lookup of entities by name, built once per reconciliation pass.
///
/// When several entities share a name, the first one listed by the remote
/// service wins and later duplicates are reported once.
#[derive(Debug, Clone)]
pub struct NameIndex<T> {
    by_name: HashMap<String, T>,
}

impl<T> NameIndex<T> {
    pub fn build<I, F>(items: I, name_of: F) -> Self
    where
        I: IntoIterator<Item = T>,
        F: Fn(&T) -> &str,
    {
        let mut by_name = HashMap::new();
        for item in items {
            let name = name_of(&item).to_string();
            match by_name.entry(name) {
                Entry::Vacant(slot) => {
                    slot.insert(item);
                }
                Entry::Occupied(slot) => {
                    warn!(name = %slot.key(), "Duplicate name; keeping first match");
                }
            }
        }
        Self { by_name }
    }

    pub fn get(&self, name: &str) -> Option<&T> {
        self.by_name.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.by_name.contains_key(name)
    }

    /// Record an entity created during this pass.
    ///
    /// An existing entry with the same name is kept.
    pub fn insert(&mut self, name: impl Into<String>, item: T) -> &T {
        self.by_name.entry(name.into()).or_insert(item)
    }

    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn index(names: &[(&'static str, u32)]) -> NameIndex<(&'static str, u32)> {
        NameIndex::build(names.iter().copied(), |(name, _)| *name)
    }

    #[test]
    fn test_exact_match_only() {
        let idx = index(&[("Net-Ops", 1), ("VPC-Baseline", 2)]);
        assert_eq!(idx.get("Net-Ops"), Some(&("Net-Ops", 1)));
        assert!(idx.get("net-ops").is_none());
        assert!(idx.get("Net-Ops ").is_none());
        assert!(!idx.contains("VPC"));
        assert_eq!(idx.len(), 2);
    }

    #[test]
    fn test_first_duplicate_wins() {
        let idx = index(&[("Net-Ops", 1), ("Net-Ops", 2)]);
        assert_eq!(idx.get("Net-Ops").map(|(_, n)| *n), Some(1));
        assert_eq!(idx.len(), 1);
    }

    #[test]
    fn test_insert_keeps_existing() {
        let mut idx = index(&[("Net-Ops", 1)]);
        assert_eq!(idx.insert("Net-Ops", ("Net-Ops", 9)).1, 1);
        assert_eq!(idx.insert("Data", ("Data", 3)).1, 3);
        assert!(idx.contains("Data"));
    }

    #[test]
    fn test_empty() {
        let idx: NameIndex<(&'static str, u32)> = index(&[]);
        assert!(idx.is_empty());
    }

    mod proptest_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn test_index_agrees_with_linear_scan(
                names in prop::collection::vec("[A-Ca-c]{1,2}", 0..20),
                probe in "[A-Ca-c]{1,2}",
            ) {
                let items: Vec<(String, usize)> =
                    names.iter().cloned().enumerate().map(|(i, n)| (n, i)).collect();
                let idx = NameIndex::build(items.clone(), |(name, _)| name.as_str());

                let linear = items.iter().find(|(name, _)| *name == probe);
                prop_assert_eq!(idx.get(&probe), linear);
            }
        }
    }
}
