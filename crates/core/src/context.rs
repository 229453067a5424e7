// Copyright 2024 Gibson Core Authors.
// Licensed under the BSD-3-Clause license.

//! The explicit, passed-by-reference server state every handler operates
//! on. The source keeps limits, stats, and the index on one global
//! `gbServer` struct reached through `client->server`; per the design
//! notes this rewrite threads a `Context` through every handler call
//! instead, so the core stays testable without a running server.

use std::sync::Arc;

use cache_config::Limits;
use common::Clock;
use store::Store;

/// Counters and gauges the STATS opcode reads directly, separate from the
/// `metriken` registry the server binary also publishes to. Field names
/// track `server->stats` in the source.
#[derive(Debug, Default)]
pub struct ServerStats {
    pub started: i64,
    pub first_item_seen: i64,
    pub last_item_seen: i64,
    pub total_compressed_items: u64,
    pub total_clients: u64,
    pub total_cron_done: u64,
    pub total_connections: u64,
    pub total_requests: u64,
    pub mem_used: usize,
    pub mem_peak: usize,
    pub item_size_avg: usize,
    /// `(old + new)/2`, not a true mean. Preserved bit-for-bit; see
    /// DESIGN.md.
    pub compr_rate_avg: f64,
}

/// Everything a handler needs: the key store, the configured limits, the
/// counters STATS reports, and a clock so tests can control wall-clock
/// time deterministically instead of sleeping.
pub struct Context {
    pub store: Store,
    pub limits: Limits,
    pub stats: ServerStats,
    clock: Arc<dyn Clock>,
}

impl Context {
    pub fn new(limits: Limits, clock: Arc<dyn Clock>) -> Self {
        let now = clock.now();
        Self {
            store: Store::new(),
            limits,
            stats: ServerStats {
                started: now,
                ..ServerStats::default()
            },
            clock,
        }
    }

    pub fn now(&self) -> i64 {
        self.clock.now()
    }

    /// Clamps a caller-supplied TTL to `max_item_ttl`, leaving the
    /// immortal sentinels (`<= 0`) untouched. Mirrors the clamp
    /// `gbQuerySetHandler`/`gbQueryTtlHandler` apply before storing a TTL.
    pub fn clamp_ttl(&self, ttl: i64) -> i64 {
        if ttl > 0 {
            ttl.min(self.limits.max_item_ttl)
        } else {
            ttl
        }
    }

    pub fn mem_admitted(&self) -> bool {
        self.stats.mem_used <= self.limits.max_mem
    }

    /// Records a freshly created item of `size` bytes with the given
    /// compression outcome. Mirrors the bookkeeping at the tail of
    /// `gbCreateItem`.
    pub fn record_create(&mut self, size: usize, compressed: bool) {
        let now = self.now();
        if self.stats.first_item_seen == 0 {
            self.stats.first_item_seen = now;
        }
        self.stats.last_item_seen = now;
        if compressed {
            self.stats.total_compressed_items += 1;
        }
        self.stats.mem_used += size;
        if self.stats.mem_used > self.stats.mem_peak {
            self.stats.mem_peak = self.stats.mem_used;
        }
        self.recompute_size_avg();
    }

    /// Mirrors `gbDestroyItem`'s stats rollback.
    pub fn record_destroy(&mut self, size: usize, compressed: bool) {
        if compressed {
            self.stats.total_compressed_items = self.stats.total_compressed_items.saturating_sub(1);
        }
        self.stats.mem_used = self.stats.mem_used.saturating_sub(size);
        self.recompute_size_avg();
    }

    fn recompute_size_avg(&mut self) {
        let nitems = self.store.len();
        self.stats.item_size_avg = if nitems == 0 {
            0
        } else {
            self.stats.mem_used / nitems
        };
    }

    /// `(old + new)/2`. Not a true running mean; preserved exactly per the
    /// source's `gbSingleSet` update rule.
    pub fn record_compression_rate(&mut self, rate: f64) {
        if self.stats.compr_rate_avg == 0.0 {
            self.stats.compr_rate_avg = rate;
        } else {
            self.stats.compr_rate_avg = (self.stats.compr_rate_avg + rate) / 2.0;
        }
    }
}
