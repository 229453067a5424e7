// Copyright 2024 Gibson Core Authors.
// Licensed under the BSD-3-Clause license.

//! Item lifecycle and the prefix-indexed key store. This crate is the
//! rewrite's equivalent of `entrystore`/`storage/segcache`: it owns the
//! cached value's representation and its expiry/lock rules, and exposes a
//! thin adapter over an ordered, prefix-searchable key index. It knows
//! nothing about opcodes or wire parsing — that lives in `crates/core`.

mod compress;
mod index;
mod item;
pub mod lifecycle;

pub use compress::{lzf_compress, lzf_decompress};
pub use index::Store;
pub use item::{Encoding, Item, ItemData};
pub use lifecycle::{is_expired, is_locked, touch};
