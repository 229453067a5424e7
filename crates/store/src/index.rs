// Copyright 2024 Gibson Core Authors.
// Licensed under the BSD-3-Clause license.

//! The key index, rewritten from the `rbtree`/trie pairing in
//! `gbProcessQuery`'s single- and multi-key paths. The source walks a
//! sorted tree node-by-node and mutates matched nodes in place through a
//! callback; this rewrite keeps the same sorted-order prefix walk but
//! mutates through `remove`/`insert` on a `BTreeMap` rather than exposing
//! a node-handle API, per the design notes' sanctioned alternative.

use std::collections::BTreeMap;

use crate::item::Item;

/// An ordered, prefix-searchable key/item map.
#[derive(Debug, Default)]
pub struct Store {
    items: BTreeMap<Box<[u8]>, Item>,
}

/// A key pattern: either an exact key or a `prefix*` wildcard, matching
/// the two forms `gbProcessQuery` accepts for multi-key opcodes.
enum Pattern<'a> {
    Exact(&'a [u8]),
    Prefix(&'a [u8]),
}

fn classify(pattern: &[u8]) -> Pattern<'_> {
    match pattern.split_last() {
        Some((&b'*', prefix)) => Pattern::Prefix(prefix),
        _ => Pattern::Exact(pattern),
    }
}

impl Store {
    pub fn new() -> Self {
        Self {
            items: BTreeMap::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn find(&self, key: &[u8]) -> Option<&Item> {
        self.items.get(key)
    }

    pub fn find_mut(&mut self, key: &[u8]) -> Option<&mut Item> {
        self.items.get_mut(key)
    }

    pub fn insert(&mut self, key: &[u8], item: Item) {
        self.items.insert(key.to_vec().into_boxed_slice(), item);
    }

    pub fn remove(&mut self, key: &[u8]) -> Option<Item> {
        self.items.remove(key)
    }

    /// Keys matching `pattern` (exact key or `prefix*` wildcard), visited
    /// in sorted order, capped at `limit` (`0` means unbounded). Expired
    /// entries encountered during the walk are evicted, matching the
    /// source's lazy-destroy-on-walk behavior; they never appear in the
    /// result.
    pub fn matching_keys(&mut self, pattern: &[u8], limit: usize, now: i64) -> Vec<Box<[u8]>> {
        let expired = self.collect_matching_and_evict(pattern, limit, now);
        expired
    }

    /// Counts keys matching `pattern`, touching every still-valid match and
    /// evicting expired entries encountered along the way, without
    /// allocating the full key list. Mirrors `gbCountCallback`, which
    /// folds the access-time touch into the same pass as the validity
    /// check rather than doing it in a second loop over collected keys.
    pub fn count_matching(&mut self, pattern: &[u8], limit: usize, now: i64) -> usize {
        let candidates = self.candidates(pattern);
        let mut found = 0;
        for key in candidates {
            let valid = match self.items.get(&key) {
                Some(item) if crate::lifecycle::is_expired(item, now) => {
                    self.items.remove(&key);
                    false
                }
                Some(_) => true,
                None => false,
            };
            if !valid {
                continue;
            }
            if let Some(item) = self.items.get_mut(&key) {
                crate::lifecycle::touch(item, now);
            }
            found += 1;
            if limit != 0 && found >= limit {
                break;
            }
        }
        found
    }

    fn candidates(&self, pattern: &[u8]) -> Vec<Box<[u8]>> {
        match classify(pattern) {
            Pattern::Exact(key) => {
                if self.items.contains_key(key) {
                    vec![key.to_vec().into_boxed_slice()]
                } else {
                    Vec::new()
                }
            }
            Pattern::Prefix(prefix) => self
                .items
                .range(prefix.to_vec().into_boxed_slice()..)
                .take_while(|(k, _)| k.starts_with(prefix))
                .map(|(k, _)| k.clone())
                .collect(),
        }
    }

    fn collect_matching_and_evict(
        &mut self,
        pattern: &[u8],
        limit: usize,
        now: i64,
    ) -> Vec<Box<[u8]>> {
        let candidates = self.candidates(pattern);

        let mut matched = Vec::new();
        for key in candidates {
            let is_expired = self
                .items
                .get(&key)
                .map(|item| crate::lifecycle::is_expired(item, now))
                .unwrap_or(false);

            if is_expired {
                self.items.remove(&key);
                continue;
            }

            matched.push(key);
            if limit != 0 && matched.len() >= limit {
                break;
            }
        }
        matched
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::item::ItemData;

    fn item() -> Item {
        Item::new(ItemData::Plain(b"v".to_vec().into_boxed_slice()), 0)
    }

    #[test]
    fn exact_pattern_matches_only_that_key() {
        let mut store = Store::new();
        store.insert(b"foo", item());
        store.insert(b"foobar", item());
        let keys = store.matching_keys(b"foo", 0, 0);
        assert_eq!(keys, vec![b"foo".to_vec().into_boxed_slice()]);
    }

    #[test]
    fn wildcard_pattern_matches_prefix() {
        let mut store = Store::new();
        store.insert(b"user:1", item());
        store.insert(b"user:2", item());
        store.insert(b"other", item());
        let mut keys = store.matching_keys(b"user:*", 0, 0);
        keys.sort();
        assert_eq!(
            keys,
            vec![
                b"user:1".to_vec().into_boxed_slice(),
                b"user:2".to_vec().into_boxed_slice(),
            ]
        );
    }

    #[test]
    fn limit_caps_result_count() {
        let mut store = Store::new();
        for k in [&b"a1"[..], &b"a2"[..], &b"a3"[..]] {
            store.insert(k, item());
        }
        let keys = store.matching_keys(b"a*", 2, 0);
        assert_eq!(keys.len(), 2);
    }

    #[test]
    fn walk_evicts_expired_entries() {
        let mut store = Store::new();
        let mut expiring = item();
        expiring.set_ttl(10);
        store.insert(b"a1", expiring);
        store.insert(b"a2", item());

        let keys = store.matching_keys(b"a*", 0, 20);
        assert_eq!(keys, vec![b"a2".to_vec().into_boxed_slice()]);
        assert!(store.find(b"a1").is_none());
    }
}
