// Copyright 2024 Gibson Core Authors.
// Licensed under the BSD-3-Clause license.

//! Single-key operations: GET/SET/DEL/TTL/INC/DEC/LOCK/UNLOCK/META.
//! Rewritten from the matching `gbQuery*Handler` functions in `query.c`.

use protocol_gibson::{parse_int, parse_key, parse_key_value, parse_ttl_key_value};
use store::{lifecycle, Encoding, Item, ItemData};

use crate::context::Context;
use crate::meta::{meta_value, parse_meta_field};
use crate::reply::Reply;

/// The three outcomes of resolving a key against the store: it never had
/// an item, it had one but that item just expired, or it has a valid item
/// right now. Most handlers only care whether a valid item remains
/// (`resolve`'s `bool`), but INC/DEC must tell "never existed" apart from
/// "existed, now expired" per `gbQueryIncDecHandler`'s `item == NULL`
/// versus `gbIsNodeStillValid(...) == 0` branches.
enum Resolution {
    NeverExisted,
    ExpiredAndRemoved,
    Valid,
}

/// Removes `key` if it has expired, reporting which of the three
/// `Resolution` outcomes applies. The way `gbIsItemStillValid(...,
/// remove=true)` destroys an expired item as a side effect of checking it.
fn resolve_state(ctx: &mut Context, key: &[u8]) -> Resolution {
    let now = ctx.now();
    let expired = match ctx.store.find(key) {
        None => return Resolution::NeverExisted,
        Some(item) => lifecycle::is_expired(item, now),
    };
    if expired {
        if let Some(item) = ctx.store.remove(key) {
            ctx.record_destroy(item.size(), item.encoding() == Encoding::Lzf);
        }
        Resolution::ExpiredAndRemoved
    } else {
        Resolution::Valid
    }
}

/// Removes `key` if it has expired, returning whether a valid item
/// remains. Absent and expired both read as "no item" to the caller, the
/// way every handler but INC/DEC collapses both cases.
fn resolve(ctx: &mut Context, key: &[u8]) -> bool {
    matches!(resolve_state(ctx, key), Resolution::Valid)
}

/// Stores `value` as a new item, compressing it first if it crosses the
/// configured threshold. Mirrors `gbSingleSet`'s compress-then-fallback
/// logic.
pub(crate) fn make_item(ctx: &mut Context, value: &[u8], now: i64) -> Item {
    let vlen = value.len();
    if vlen > ctx.limits.compression_threshold {
        if let Some(compressed) = store::lzf_compress(value) {
            if compressed.len() <= vlen.saturating_sub(4) {
                let rate = 100.0 - (compressed.len() as f64 * 100.0 / vlen as f64);
                ctx.record_compression_rate(rate);
                return Item::new(
                    ItemData::Compressed(compressed.into_boxed_slice(), vlen),
                    now,
                );
            }
        }
    }
    Item::new(ItemData::Plain(value.to_vec().into_boxed_slice()), now)
}

pub fn get(ctx: &mut Context, payload: &[u8]) -> Reply {
    let key = match parse_key(payload, ctx.limits.max_key_size) {
        Ok(k) => k,
        Err(_) => return Reply::err(),
    };
    if !resolve(ctx, key) {
        return Reply::not_found();
    }
    let now = ctx.now();
    let item = ctx.store.find_mut(key).expect("resolved valid above");
    lifecycle::touch(item, now);
    Reply::item(item.encoding(), item.as_bytes())
}

pub fn set(ctx: &mut Context, payload: &[u8]) -> Reply {
    if !ctx.mem_admitted() {
        return Reply::mem();
    }
    let (ttl_bytes, key, value) = match parse_ttl_key_value(
        payload,
        ctx.limits.max_key_size,
        ctx.limits.max_value_size,
    ) {
        Ok(v) => v,
        Err(_) => return Reply::err(),
    };
    let ttl = match parse_int(ttl_bytes) {
        Ok(v) => v,
        Err(_) => return Reply::nan(),
    };

    let now = ctx.now();
    if let Some(existing) = ctx.store.find(key) {
        if lifecycle::is_locked(existing, now) {
            return Reply::locked();
        }
    }
    if let Some(prev) = ctx.store.remove(key) {
        ctx.record_destroy(prev.size(), prev.encoding() == Encoding::Lzf);
    }

    let mut item = make_item(ctx, value, now);
    item.set_ttl(ctx.clamp_ttl(ttl));
    ctx.record_create(item.size(), item.encoding() == Encoding::Lzf);
    let reply = Reply::item(item.encoding(), item.as_bytes());
    ctx.store.insert(key, item);
    reply
}

pub fn del(ctx: &mut Context, payload: &[u8]) -> Reply {
    let key = match parse_key(payload, ctx.limits.max_key_size) {
        Ok(k) => k,
        Err(_) => return Reply::err(),
    };
    if !resolve(ctx, key) {
        return Reply::not_found();
    }
    let now = ctx.now();
    if lifecycle::is_locked(ctx.store.find(key).expect("resolved valid above"), now) {
        return Reply::locked();
    }
    if let Some(item) = ctx.store.remove(key) {
        ctx.record_destroy(item.size(), item.encoding() == Encoding::Lzf);
    }
    Reply::ok()
}

pub fn ttl(ctx: &mut Context, payload: &[u8]) -> Reply {
    let (key, value) =
        match parse_key_value(payload, ctx.limits.max_key_size, ctx.limits.max_value_size) {
            Ok(v) => v,
            Err(_) => return Reply::err(),
        };
    if !resolve(ctx, key) {
        return Reply::not_found();
    }
    let parsed = match parse_int(value) {
        Ok(v) => v,
        Err(_) => return Reply::nan(),
    };
    let now = ctx.now();
    let clamped = ctx.clamp_ttl(parsed);
    let item = ctx.store.find_mut(key).expect("resolved valid above");
    item.set_created_time(now);
    lifecycle::touch(item, now);
    item.set_ttl(clamped);
    Reply::ok()
}

pub fn lock(ctx: &mut Context, payload: &[u8]) -> Reply {
    let (key, value) =
        match parse_key_value(payload, ctx.limits.max_key_size, ctx.limits.max_value_size) {
            Ok(v) => v,
            Err(_) => return Reply::err(),
        };
    if !resolve(ctx, key) {
        return Reply::not_found();
    }
    let parsed = match parse_int(value) {
        Ok(v) => v,
        Err(_) => return Reply::nan(),
    };
    let now = ctx.now();
    let item = ctx.store.find_mut(key).expect("resolved valid above");
    if lifecycle::is_locked(item, now) {
        return Reply::locked();
    }
    item.set_created_time(now);
    item.set_lock(parsed);
    Reply::ok()
}

pub fn unlock(ctx: &mut Context, payload: &[u8]) -> Reply {
    let key = match parse_key(payload, ctx.limits.max_key_size) {
        Ok(k) => k,
        Err(_) => return Reply::err(),
    };
    if !resolve(ctx, key) {
        return Reply::not_found();
    }
    let now = ctx.now();
    let item = ctx.store.find_mut(key).expect("resolved valid above");
    item.set_lock(0);
    lifecycle::touch(item, now);
    Reply::ok()
}

pub fn meta(ctx: &mut Context, payload: &[u8]) -> Reply {
    let (key, field_bytes) =
        match parse_key_value(payload, ctx.limits.max_key_size, ctx.limits.max_value_size) {
            Ok(v) => v,
            Err(_) => return Reply::err(),
        };
    if !resolve(ctx, key) {
        return Reply::not_found();
    }
    let field = match parse_meta_field(field_bytes) {
        Some(f) => f,
        None => return Reply::err(),
    };
    let now = ctx.now();
    let item = ctx.store.find_mut(key).expect("resolved valid above");
    lifecycle::touch(item, now);
    Reply::number(meta_value(item, field, now))
}

fn inc_dec(ctx: &mut Context, payload: &[u8], delta: i64) -> Reply {
    let key = match parse_key(payload, ctx.limits.max_key_size) {
        Ok(k) => k,
        Err(_) => return Reply::err(),
    };

    let now = ctx.now();
    match resolve_state(ctx, key) {
        Resolution::NeverExisted => {
            // Only a key that never existed synthesizes NUMBER(1),
            // regardless of delta direction, matching
            // `gbQueryIncDecHandler`'s `item == NULL` branch.
            let item = Item::new(ItemData::Number(1), now);
            ctx.record_create(item.size(), false);
            let reply = Reply::number(1);
            ctx.store.insert(key, item);
            return reply;
        }
        Resolution::ExpiredAndRemoved => return Reply::not_found(),
        Resolution::Valid => {}
    }

    let item = ctx.store.find(key).expect("resolved valid above");
    if lifecycle::is_locked(item, now) {
        return Reply::locked();
    }

    match item.encoding() {
        Encoding::Number => {
            let item = ctx.store.find_mut(key).expect("resolved valid above");
            item.add_number(delta);
            lifecycle::touch(item, now);
            let ItemData::Number(v) = item.data() else {
                unreachable!()
            };
            Reply::number(*v)
        }
        Encoding::Plain => {
            let parsed = match item.data() {
                ItemData::Plain(bytes) => parse_int(bytes),
                _ => unreachable!(),
            };
            match parsed {
                Ok(v) => {
                    let new_value = v + delta;
                    let item = ctx.store.find_mut(key).expect("resolved valid above");
                    item.promote_to_number(new_value);
                    lifecycle::touch(item, now);
                    Reply::number(new_value)
                }
                Err(_) => Reply::nan(),
            }
        }
        Encoding::Lzf => Reply::nan(),
    }
}

pub fn inc(ctx: &mut Context, payload: &[u8]) -> Reply {
    inc_dec(ctx, payload, 1)
}

pub fn dec(ctx: &mut Context, payload: &[u8]) -> Reply {
    inc_dec(ctx, payload, -1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reply::ReplyBody;
    use crate::test_support::test_context_at;

    #[test]
    fn set_then_get_round_trips() {
        let (mut ctx, _clock) = test_context_at(1000);
        let reply = set(&mut ctx, b"-1 foo bar");
        assert!(matches!(reply.body, ReplyBody::Item { .. }));
        let reply = get(&mut ctx, b"foo");
        match reply.body {
            ReplyBody::Item { bytes, encoding } => {
                assert_eq!(bytes, b"bar");
                assert_eq!(encoding, Encoding::Plain);
            }
            other => panic!("unexpected reply: {other:?}"),
        }
    }

    #[test]
    fn get_on_expired_item_returns_not_found_and_evicts() {
        let (mut ctx, clock) = test_context_at(0);
        set(&mut ctx, b"2 foo bar");
        clock.set(3);
        assert_eq!(
            get(&mut ctx, b"foo").body,
            ReplyBody::Code(crate::reply::ReplyCode::ErrNotFound)
        );
        assert_eq!(ctx.store.len(), 0);
    }

    #[test]
    fn inc_on_absent_key_creates_number_one() {
        let (mut ctx, _clock) = test_context_at(0);
        let reply = inc(&mut ctx, b"foo");
        assert_eq!(
            reply.body,
            ReplyBody::Data {
                encoding: Encoding::Number,
                bytes: b"1".to_vec()
            }
        );
        let reply = dec(&mut ctx, b"bar");
        assert_eq!(
            reply.body,
            ReplyBody::Data {
                encoding: Encoding::Number,
                bytes: b"1".to_vec()
            }
        );
    }

    #[test]
    fn inc_on_expired_key_returns_not_found_and_does_not_resurrect() {
        let (mut ctx, clock) = test_context_at(0);
        set(&mut ctx, b"2 foo 10");
        clock.set(3);
        let reply = inc(&mut ctx, b"foo");
        assert_eq!(
            reply.body,
            ReplyBody::Code(crate::reply::ReplyCode::ErrNotFound)
        );
        assert_eq!(ctx.store.len(), 0);
    }

    #[test]
    fn inc_promotes_plain_numeric_string() {
        let (mut ctx, _clock) = test_context_at(0);
        set(&mut ctx, b"-1 foo 42");
        let reply = inc(&mut ctx, b"foo");
        assert_eq!(
            reply.body,
            ReplyBody::Data {
                encoding: Encoding::Number,
                bytes: b"43".to_vec()
            }
        );
    }

    #[test]
    fn inc_on_non_numeric_plain_is_nan() {
        let (mut ctx, _clock) = test_context_at(0);
        set(&mut ctx, b"-1 foo notanumber");
        let reply = inc(&mut ctx, b"foo");
        assert_eq!(reply.body, ReplyBody::Code(crate::reply::ReplyCode::ErrNan));
    }

    #[test]
    fn locked_item_rejects_set() {
        let (mut ctx, _clock) = test_context_at(0);
        set(&mut ctx, b"-1 foo bar");
        lock(&mut ctx, b"foo 60");
        let reply = set(&mut ctx, b"-1 foo baz");
        assert_eq!(reply.body, ReplyBody::Code(crate::reply::ReplyCode::ErrLocked));
        let reply = get(&mut ctx, b"foo");
        match reply.body {
            ReplyBody::Item { bytes, .. } => assert_eq!(bytes, b"bar"),
            other => panic!("unexpected reply: {other:?}"),
        }
    }

    #[test]
    fn unlock_does_not_require_a_lock() {
        let (mut ctx, _clock) = test_context_at(0);
        set(&mut ctx, b"-1 foo bar");
        let reply = unlock(&mut ctx, b"foo");
        assert_eq!(reply.body, ReplyBody::Code(crate::reply::ReplyCode::Ok));
    }

    #[test]
    fn meta_left_reports_remaining_ttl() {
        let (mut ctx, _clock) = test_context_at(100);
        set(&mut ctx, b"50 foo bar");
        let reply = meta(&mut ctx, b"foo left");
        assert_eq!(
            reply.body,
            ReplyBody::Data {
                encoding: Encoding::Number,
                bytes: b"50".to_vec()
            }
        );
    }

    #[test]
    fn meta_unknown_field_is_err() {
        let (mut ctx, _clock) = test_context_at(0);
        set(&mut ctx, b"-1 foo bar");
        let reply = meta(&mut ctx, b"foo bogus");
        assert_eq!(reply.body, ReplyBody::Code(crate::reply::ReplyCode::Err));
    }
}
