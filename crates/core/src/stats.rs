// Copyright 2024 Gibson Core Authors.
// Licensed under the BSD-3-Clause license.

//! STATS, rewritten from `gbQueryStatsHandler`. Produces the exact label
//! set and order the source does; `item_pool_*`/`memory_available`/
//! `memory_usable`/`memory_fragmentation` come from the object pool and
//! allocator, both named as external collaborators the core only reports
//! through ("out of scope" per spec.md §1). This crate has no real
//! allocator to query, so those fields are derived from the values this
//! crate *does* track, documented in DESIGN.md.

use store::Encoding;

use crate::context::Context;
use crate::reply::Reply;

const VERSION: &str = env!("CARGO_PKG_VERSION");
const BUILD_DATETIME: &str = "unknown";

fn long(pairs: &mut Vec<(Vec<u8>, Encoding, Vec<u8>)>, key: &str, value: i64) {
    pairs.push((
        key.as_bytes().to_vec(),
        Encoding::Number,
        value.to_string().into_bytes(),
    ));
}

fn string(pairs: &mut Vec<(Vec<u8>, Encoding, Vec<u8>)>, key: &str, value: &str) {
    pairs.push((
        key.as_bytes().to_vec(),
        Encoding::Plain,
        value.as_bytes().to_vec(),
    ));
}

/// `sprintf("%f", ...)`: six decimal places, matching `APPEND_FLOAT_STAT`.
fn float(pairs: &mut Vec<(Vec<u8>, Encoding, Vec<u8>)>, key: &str, value: f64) {
    string(pairs, key, &format!("{value:.6}"));
}

pub fn stats(ctx: &mut Context, _payload: &[u8]) -> Reply {
    let now = ctx.now();
    let mut pairs = Vec::with_capacity(24);

    string(&mut pairs, "server_version", VERSION);
    string(&mut pairs, "server_build_datetime", BUILD_DATETIME);
    string(&mut pairs, "server_allocator", "malloc");
    string(
        &mut pairs,
        "server_arch",
        if std::mem::size_of::<i64>() == 8 {
            "64"
        } else {
            "32"
        },
    );
    long(&mut pairs, "server_started", ctx.stats.started);
    long(&mut pairs, "server_time", now);
    long(&mut pairs, "first_item_seen", ctx.stats.first_item_seen);
    long(&mut pairs, "last_item_seen", ctx.stats.last_item_seen);
    long(&mut pairs, "total_items", ctx.store.len() as i64);
    long(
        &mut pairs,
        "total_compressed_items",
        ctx.stats.total_compressed_items as i64,
    );
    long(&mut pairs, "total_clients", ctx.stats.total_clients as i64);
    long(&mut pairs, "total_cron_done", ctx.stats.total_cron_done as i64);
    long(
        &mut pairs,
        "total_connections",
        ctx.stats.total_connections as i64,
    );
    long(&mut pairs, "total_requests", ctx.stats.total_requests as i64);

    // No pooled allocator backs this rewrite; every item is a plain heap
    // allocation, so the pool's "used"/"capacity" collapse to the live
    // item count.
    let nitems = ctx.store.len() as i64;
    long(&mut pairs, "item_pool_current_used", nitems);
    long(&mut pairs, "item_pool_current_capacity", nitems);
    long(&mut pairs, "item_pool_total_capacity", nitems);
    long(
        &mut pairs,
        "item_pool_object_size",
        std::mem::size_of::<store::Item>() as i64,
    );
    long(&mut pairs, "item_pool_max_block_size", nitems);

    let mem_used = ctx.stats.mem_used as i64;
    let max_mem = ctx.limits.max_mem as i64;
    long(&mut pairs, "memory_available", (max_mem - mem_used).max(0));
    long(&mut pairs, "memory_usable", max_mem);
    long(&mut pairs, "memory_used", mem_used);
    long(&mut pairs, "memory_peak", ctx.stats.mem_peak as i64);
    // No real allocator to ask for fragmentation; 1.0 reads as "no
    // fragmentation" until a real allocator is wired in.
    float(&mut pairs, "memory_fragmentation", 1.0);
    long(&mut pairs, "item_size_avg", ctx.stats.item_size_avg as i64);
    long(&mut pairs, "compr_rate_avg", ctx.stats.compr_rate_avg as i64);

    let reqs_per_client_avg = if ctx.stats.total_connections == 0 {
        0.0
    } else {
        ctx.stats.total_requests as f64 / ctx.stats.total_connections as f64
    };
    float(&mut pairs, "reqs_per_client_avg", reqs_per_client_avg);

    Reply::kv_set(pairs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reply::ReplyBody;
    use crate::test_support::test_context_at;

    const EXPECTED_LABELS: &[&str] = &[
        "server_version",
        "server_build_datetime",
        "server_allocator",
        "server_arch",
        "server_started",
        "server_time",
        "first_item_seen",
        "last_item_seen",
        "total_items",
        "total_compressed_items",
        "total_clients",
        "total_cron_done",
        "total_connections",
        "total_requests",
        "item_pool_current_used",
        "item_pool_current_capacity",
        "item_pool_total_capacity",
        "item_pool_object_size",
        "item_pool_max_block_size",
        "memory_available",
        "memory_usable",
        "memory_used",
        "memory_peak",
        "memory_fragmentation",
        "item_size_avg",
        "compr_rate_avg",
        "reqs_per_client_avg",
    ];

    #[test]
    fn every_required_label_present_exactly_once() {
        let (mut ctx, _clock) = test_context_at(1000);
        let reply = stats(&mut ctx, b"");
        let ReplyBody::KvSet(pairs) = reply.body else {
            panic!("expected a kv set reply");
        };
        for label in EXPECTED_LABELS {
            let count = pairs.iter().filter(|(k, _, _)| k == label.as_bytes()).count();
            assert_eq!(count, 1, "label {label} should appear exactly once");
        }
        assert_eq!(pairs.len(), EXPECTED_LABELS.len());
    }

    #[test]
    fn reqs_per_client_avg_is_zero_with_no_connections() {
        let (mut ctx, _clock) = test_context_at(1000);
        let reply = stats(&mut ctx, b"");
        let ReplyBody::KvSet(pairs) = reply.body else {
            panic!("expected a kv set reply");
        };
        let (_, _, value) = pairs
            .iter()
            .find(|(k, _, _)| k == b"reqs_per_client_avg")
            .unwrap();
        assert_eq!(value, b"0.000000");
    }
}
