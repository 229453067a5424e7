// Copyright 2024 Gibson Core Authors.
// Licensed under the BSD-3-Clause license.

//! Bulk (pattern/prefix) operations: MGET/MSET/MDEL/MTTL/MINC/MDEC/
//! MLOCK/MUNLOCK/COUNT/KEYS. Rewritten from the matching
//! `gbQueryMulti*Handler`/`gb*Callback` pairs in `query.c`. Every handler
//! here shares the same shape as the source: parse a pattern (and
//! sometimes a value), walk the store for matches, and apply a per-match
//! predicate/mutator. `store::Store::matching_keys` already evicts
//! expired entries during the walk, so every key handed to a callback
//! below is guaranteed present and unexpired; callbacks only need to
//! check the lock.

use protocol_gibson::{parse_int, parse_key, parse_key_optvalue, parse_key_value};
use store::{lifecycle, Encoding, ItemData};

use crate::context::Context;
use crate::reply::Reply;
use crate::single::make_item;

const UNLIMITED: usize = 0;

fn mutating_reply(found: usize) -> Reply {
    if found > 0 {
        Reply::number(found as i64)
    } else {
        Reply::not_found()
    }
}

pub fn mset(ctx: &mut Context, payload: &[u8]) -> Reply {
    if !ctx.mem_admitted() {
        return Reply::mem();
    }
    let (pattern, value) =
        match parse_key_value(payload, ctx.limits.max_key_size, ctx.limits.max_value_size) {
            Ok(v) => v,
            Err(_) => return Reply::err(),
        };

    let now = ctx.now();
    let keys = ctx.store.matching_keys(pattern, UNLIMITED, now);
    let mut found = 0;
    for key in keys {
        let locked = ctx
            .store
            .find(&key)
            .map(|item| lifecycle::is_locked(item, now))
            .unwrap_or(false);
        if locked {
            continue;
        }
        if let Some(prev) = ctx.store.remove(&key) {
            ctx.record_destroy(prev.size(), prev.encoding() == Encoding::Lzf);
        }
        let item = make_item(ctx, value, now);
        ctx.record_create(item.size(), item.encoding() == Encoding::Lzf);
        ctx.store.insert(&key, item);
        found += 1;
    }
    mutating_reply(found)
}

pub fn mttl(ctx: &mut Context, payload: &[u8]) -> Reply {
    if !ctx.mem_admitted() {
        return Reply::mem();
    }
    let (pattern, value) =
        match parse_key_value(payload, ctx.limits.max_key_size, ctx.limits.max_value_size) {
            Ok(v) => v,
            Err(_) => return Reply::err(),
        };
    let ttl = match parse_int(value) {
        Ok(v) => v,
        Err(_) => return Reply::nan(),
    };

    let now = ctx.now();
    let clamped = ctx.clamp_ttl(ttl);
    let keys = ctx.store.matching_keys(pattern, UNLIMITED, now);
    let mut found = 0;
    for key in keys {
        if let Some(item) = ctx.store.find_mut(&key) {
            lifecycle::touch(item, now);
            item.set_ttl(clamped);
            found += 1;
        }
    }
    mutating_reply(found)
}

fn inc_dec_bulk(ctx: &mut Context, payload: &[u8], delta: i64) -> Reply {
    if !ctx.mem_admitted() {
        return Reply::mem();
    }
    let pattern = match parse_key(payload, ctx.limits.max_key_size) {
        Ok(p) => p,
        Err(_) => return Reply::err(),
    };

    let now = ctx.now();
    let keys = ctx.store.matching_keys(pattern, UNLIMITED, now);
    let mut found = 0;
    for key in keys {
        let (locked, encoding) = match ctx.store.find(&key) {
            Some(item) => (lifecycle::is_locked(item, now), item.encoding()),
            None => continue,
        };
        if locked {
            continue;
        }
        match encoding {
            Encoding::Number => {
                let item = ctx.store.find_mut(&key).expect("checked present above");
                item.add_number(delta);
                lifecycle::touch(item, now);
                found += 1;
            }
            Encoding::Plain => {
                let parsed = match ctx.store.find(&key).expect("checked present above").data() {
                    ItemData::Plain(bytes) => parse_int(bytes),
                    _ => unreachable!(),
                };
                if let Ok(v) = parsed {
                    let item = ctx.store.find_mut(&key).expect("checked present above");
                    item.promote_to_number(v + delta);
                    lifecycle::touch(item, now);
                    found += 1;
                }
            }
            Encoding::Lzf => {}
        }
    }
    mutating_reply(found)
}

pub fn minc(ctx: &mut Context, payload: &[u8]) -> Reply {
    inc_dec_bulk(ctx, payload, 1)
}

pub fn mdec(ctx: &mut Context, payload: &[u8]) -> Reply {
    inc_dec_bulk(ctx, payload, -1)
}

pub fn mlock(ctx: &mut Context, payload: &[u8]) -> Reply {
    if !ctx.mem_admitted() {
        return Reply::mem();
    }
    let (pattern, value) =
        match parse_key_value(payload, ctx.limits.max_key_size, ctx.limits.max_value_size) {
            Ok(v) => v,
            Err(_) => return Reply::err(),
        };
    let locktime = match parse_int(value) {
        Ok(v) => v,
        Err(_) => return Reply::nan(),
    };

    let now = ctx.now();
    let keys = ctx.store.matching_keys(pattern, UNLIMITED, now);
    let mut found = 0;
    for key in keys {
        let locked = ctx
            .store
            .find(&key)
            .map(|item| lifecycle::is_locked(item, now))
            .unwrap_or(true);
        if locked {
            continue;
        }
        let item = ctx.store.find_mut(&key).expect("checked present above");
        item.set_created_time(now);
        item.set_lock(locktime);
        found += 1;
    }
    mutating_reply(found)
}

pub fn munlock(ctx: &mut Context, payload: &[u8]) -> Reply {
    if !ctx.mem_admitted() {
        return Reply::mem();
    }
    let pattern = match parse_key(payload, ctx.limits.max_key_size) {
        Ok(p) => p,
        Err(_) => return Reply::err(),
    };

    let now = ctx.now();
    let keys = ctx.store.matching_keys(pattern, UNLIMITED, now);
    let mut found = 0;
    for key in keys {
        if let Some(item) = ctx.store.find_mut(&key) {
            item.set_lock(0);
            lifecycle::touch(item, now);
            found += 1;
        }
    }
    mutating_reply(found)
}

pub fn mdel(ctx: &mut Context, payload: &[u8]) -> Reply {
    let pattern = match parse_key(payload, ctx.limits.max_key_size) {
        Ok(p) => p,
        Err(_) => return Reply::err(),
    };

    let now = ctx.now();
    let keys = ctx.store.matching_keys(pattern, UNLIMITED, now);
    let mut found = 0;
    for key in keys {
        let locked = ctx
            .store
            .find(&key)
            .map(|item| lifecycle::is_locked(item, now))
            .unwrap_or(true);
        if locked {
            continue;
        }
        if let Some(item) = ctx.store.remove(&key) {
            ctx.record_destroy(item.size(), item.encoding() == Encoding::Lzf);
            found += 1;
        }
    }
    mutating_reply(found)
}

pub fn mget(ctx: &mut Context, payload: &[u8]) -> Reply {
    let (pattern, value) =
        match parse_key_optvalue(payload, ctx.limits.max_key_size, ctx.limits.max_value_size) {
            Ok(v) => v,
            Err(_) => return Reply::err(),
        };
    let limit = match value {
        Some(v) if !v.is_empty() => match parse_int(v) {
            Ok(n) if n > 0 => n as usize,
            Ok(_) => UNLIMITED,
            Err(_) => return Reply::nan(),
        },
        _ => UNLIMITED,
    };

    let now = ctx.now();
    let keys = ctx.store.matching_keys(pattern, limit, now);
    let mut pairs = Vec::with_capacity(keys.len());
    for key in keys {
        if let Some(item) = ctx.store.find_mut(&key) {
            lifecycle::touch(item, now);
            pairs.push((key.to_vec(), item.encoding(), item.as_bytes()));
        }
    }
    if pairs.is_empty() {
        Reply::not_found()
    } else {
        Reply::kv_set(pairs)
    }
}

pub fn keys(ctx: &mut Context, payload: &[u8]) -> Reply {
    let pattern = match parse_key(payload, ctx.limits.max_key_size) {
        Ok(p) => p,
        Err(_) => return Reply::err(),
    };

    let now = ctx.now();
    let matched = ctx.store.matching_keys(pattern, UNLIMITED, now);
    if matched.is_empty() {
        return Reply::not_found();
    }
    let pairs = matched
        .into_iter()
        .enumerate()
        .map(|(i, key)| (i.to_string().into_bytes(), Encoding::Plain, key.to_vec()))
        .collect();
    Reply::kv_set(pairs)
}

pub fn count(ctx: &mut Context, payload: &[u8]) -> Reply {
    let pattern = match parse_key(payload, ctx.limits.max_key_size) {
        Ok(p) => p,
        Err(_) => return Reply::err(),
    };

    let now = ctx.now();
    let found = ctx.store.count_matching(pattern, UNLIMITED, now);
    Reply::number(found as i64)
}
