// Copyright 2024 Gibson Core Authors.
// Licensed under the BSD-3-Clause license.

//! The cached value plus its metadata, rewritten from `gbItem` in
//! `query.c`. The original stores a `NUMBER`-encoded value directly in the
//! `data` pointer (an integer-in-pointer trick); per the design notes this
//! rewrite replaces that with a tagged variant so the "a NUMBER item owns
//! no heap buffer" invariant is enforced by the type system instead of by
//! convention.

/// In-memory representation of an item's payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemData {
    /// Raw, uncompressed bytes.
    Plain(Box<[u8]>),
    /// LZF-compressed bytes, plus the decompressed length needed to
    /// reconstruct the original value. Decompressed lazily on read.
    Compressed(Box<[u8]>, usize),
    /// An inline integer. No heap buffer is owned.
    Number(i64),
}

/// Wire-facing encoding tag, exposed to clients through `META encoding` and
/// the reply encoder's item framing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i64)]
pub enum Encoding {
    Plain = 0,
    Lzf = 1,
    Number = 2,
}

impl ItemData {
    pub fn encoding(&self) -> Encoding {
        match self {
            ItemData::Plain(_) => Encoding::Plain,
            ItemData::Compressed(..) => Encoding::Lzf,
            ItemData::Number(_) => Encoding::Number,
        }
    }
}

/// A cached value with its lifecycle metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Item {
    data: ItemData,
    /// Byte length of `data` for `Plain`/`Compressed`; the machine word
    /// width for `Number`, matching `item->size` in the source.
    size: usize,
    created_time: i64,
    last_access_time: i64,
    /// Seconds; `-1` or `0` mean no expiry.
    ttl: i64,
    /// Seconds of lock duration measured from `created_time`; `0` =
    /// unlocked, `-1` = locked indefinitely.
    lock: i64,
}

impl Item {
    /// Creates a new item with no TTL and no lock, born at `now`. Mirrors
    /// `gbCreateItem` with `ttl = -1`.
    pub fn new(data: ItemData, now: i64) -> Self {
        let size = match &data {
            ItemData::Plain(b) => b.len(),
            ItemData::Compressed(b, _) => b.len(),
            ItemData::Number(_) => std::mem::size_of::<i64>(),
        };
        Self {
            data,
            size,
            created_time: now,
            last_access_time: now,
            ttl: -1,
            lock: 0,
        }
    }

    pub fn data(&self) -> &ItemData {
        &self.data
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn encoding(&self) -> Encoding {
        self.data.encoding()
    }

    pub fn created_time(&self) -> i64 {
        self.created_time
    }

    pub fn last_access_time(&self) -> i64 {
        self.last_access_time
    }

    pub fn ttl(&self) -> i64 {
        self.ttl
    }

    pub fn lock(&self) -> i64 {
        self.lock
    }

    pub fn set_last_access_time(&mut self, now: i64) {
        self.last_access_time = now;
    }

    pub fn set_created_time(&mut self, now: i64) {
        self.created_time = now;
    }

    pub fn set_ttl(&mut self, ttl: i64) {
        self.ttl = ttl;
    }

    pub fn set_lock(&mut self, lock: i64) {
        self.lock = lock;
    }

    /// `left = ttl <= 0 ? -1 : ttl - (now - created_time)`, for `META left`.
    pub fn ttl_remaining(&self, now: i64) -> i64 {
        if self.ttl <= 0 {
            -1
        } else {
            self.ttl - (now - self.created_time)
        }
    }

    /// Returns the item's logical byte value: the stored bytes for
    /// `Plain`/`Compressed` (decompressing as needed), or the decimal
    /// rendering of a `Number` item, matching how `gbClientEnqueueItem`
    /// serializes a `GB_ENC_NUMBER` item on the wire.
    pub fn as_bytes(&self) -> Vec<u8> {
        match &self.data {
            ItemData::Plain(b) => b.to_vec(),
            ItemData::Compressed(b, original_len) => crate::compress::lzf_decompress(b, *original_len),
            ItemData::Number(n) => n.to_string().into_bytes(),
        }
    }

    /// Replaces `Plain` data with an inline integer, freeing the owned
    /// buffer. Used by INC/DEC's PLAIN-to-NUMBER promotion.
    pub fn promote_to_number(&mut self, value: i64) {
        self.data = ItemData::Number(value);
        self.size = std::mem::size_of::<i64>();
    }

    /// Adds `delta` to a `Number` item in place. Panics if the item is not
    /// `Number`-encoded; callers must check `encoding()` first.
    pub fn add_number(&mut self, delta: i64) {
        match &mut self.data {
            ItemData::Number(n) => *n = n.wrapping_add(delta),
            _ => unreachable!("add_number called on a non-NUMBER item"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn number_item_has_word_size() {
        let item = Item::new(ItemData::Number(42), 0);
        assert_eq!(item.size(), std::mem::size_of::<i64>());
        assert_eq!(item.encoding(), Encoding::Number);
    }

    #[test]
    fn ttl_remaining_is_immortal_for_nonpositive_ttl() {
        let mut item = Item::new(ItemData::Plain(b"x".to_vec().into_boxed_slice()), 100);
        item.set_ttl(0);
        assert_eq!(item.ttl_remaining(500), -1);
        item.set_ttl(-1);
        assert_eq!(item.ttl_remaining(500), -1);
    }

    #[test]
    fn ttl_remaining_counts_down() {
        let mut item = Item::new(ItemData::Plain(b"x".to_vec().into_boxed_slice()), 100);
        item.set_ttl(60);
        assert_eq!(item.ttl_remaining(130), 30);
    }
}
