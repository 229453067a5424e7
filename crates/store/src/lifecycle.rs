// Copyright 2024 Gibson Core Authors.
// Licensed under the BSD-3-Clause license.

//! Expiry and lock predicates, rewritten from `gbIsItemStillValid` /
//! `gbItemIsLocked` in `query.c`. Expiry is lazy: nothing proactively
//! sweeps the store, these are only ever consulted on access or during a
//! pattern walk.

use crate::item::Item;

/// An item with `ttl <= 0` never expires. Otherwise it is expired once
/// `now - created_time >= ttl`, matching the source's `>=` comparison
/// (an item is destroyed the instant its TTL is reached, not one second
/// after).
pub fn is_expired(item: &Item, now: i64) -> bool {
    let ttl = item.ttl();
    if ttl <= 0 {
        return false;
    }
    now - item.created_time() >= ttl
}

/// `lock == 0` is unlocked. `lock == -1` is locked indefinitely. Otherwise
/// the item is locked until `created_time + lock`, matching
/// `gbItemIsLocked`'s use of the item's creation time (not last access) as
/// the lock's epoch.
pub fn is_locked(item: &Item, now: i64) -> bool {
    match item.lock() {
        0 => false,
        -1 => true,
        lock => now - item.created_time() < lock,
    }
}

/// Refreshes `last_access_time` on every successful read, the way
/// `gbProcessQuery` touches an item before enqueuing it in a reply.
pub fn touch(item: &mut Item, now: i64) {
    item.set_last_access_time(now);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::item::ItemData;

    fn plain(now: i64) -> Item {
        Item::new(ItemData::Plain(b"v".to_vec().into_boxed_slice()), now)
    }

    #[test]
    fn nonpositive_ttl_never_expires() {
        let mut item = plain(0);
        item.set_ttl(0);
        assert!(!is_expired(&item, 1_000_000));
        item.set_ttl(-1);
        assert!(!is_expired(&item, 1_000_000));
    }

    #[test]
    fn expires_at_exact_boundary() {
        let mut item = plain(100);
        item.set_ttl(10);
        assert!(!is_expired(&item, 109));
        assert!(is_expired(&item, 110));
    }

    #[test]
    fn lock_states() {
        let mut item = plain(100);
        assert!(!is_locked(&item, 200));
        item.set_lock(-1);
        assert!(is_locked(&item, 1_000_000));
        item.set_lock(30);
        assert!(is_locked(&item, 120));
        assert!(!is_locked(&item, 140));
    }

    #[test]
    fn touch_updates_last_access_only() {
        let mut item = plain(0);
        touch(&mut item, 50);
        assert_eq!(item.last_access_time(), 50);
        assert_eq!(item.created_time(), 0);
    }
}
