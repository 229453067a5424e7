// Copyright 2024 Gibson Core Authors.
// Licensed under the BSD-3-Clause license.

//! The query-processing core: opcode dispatch, item lifecycle rules, and
//! the single-key and bulk handlers that sit between the wire parser
//! (`protocol_gibson`) and the key store (`store`). Grounded in
//! `entrystore/src/segcache/memcache.rs`'s `Execute`/`Storage` split: this
//! crate is the `Execute` side, calling into `store::Store` the way that
//! file calls into a `Storage` implementor, except there is only ever one
//! concrete store here rather than a trait object per cache engine.

mod bulk;
mod context;
mod dispatch;
mod meta;
mod reply;
mod single;
mod stats;

pub use context::{Context, ServerStats};
pub use dispatch::{DispatchError, Dispatcher};
pub use reply::{Reply, ReplyBody, ReplyCode};

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use common::ManualClock;
    use std::sync::Arc;

    /// A context plus the clock driving it, so tests can advance time
    /// without a real sleep.
    pub fn test_context_at(now: i64) -> (Context, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new(now));
        let ctx = Context::new(cache_config::Limits::default(), clock.clone());
        (ctx, clock)
    }
}
