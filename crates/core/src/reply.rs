// Copyright 2024 Gibson Core Authors.
// Licensed under the BSD-3-Clause license.

//! The core's output contract, rewritten from the four
//! `gbClientEnqueue*` calls in `query.c`. The reply encoder itself (wire
//! framing, write buffering) is out of scope per spec.md §1 — this is
//! just the value every handler hands back to the dispatcher.

use store::Encoding;

/// One reply, plus whether the connection should close after it is sent
/// (set only by END).
#[derive(Debug, Clone, PartialEq)]
pub struct Reply {
    pub body: ReplyBody,
    pub close_after: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ReplyBody {
    /// A bare status code, no payload.
    Code(ReplyCode),
    /// An item's bytes, tagged with its encoding. Used by GET and any
    /// handler that hands back a stored item verbatim.
    Item { encoding: Encoding, bytes: Vec<u8> },
    /// A synthetic payload not backed by a stored item (META field
    /// values, INC/DEC results, bulk-op counts).
    Data { encoding: Encoding, bytes: Vec<u8> },
    /// `count` key/value pairs, as staged by MGET/KEYS/STATS.
    KvSet(Vec<(Vec<u8>, Encoding, Vec<u8>)>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplyCode {
    Ok,
    Err,
    ErrNan,
    ErrNotFound,
    ErrLocked,
    ErrMem,
}

impl Reply {
    pub fn code(code: ReplyCode) -> Self {
        Self {
            body: ReplyBody::Code(code),
            close_after: false,
        }
    }

    pub fn ok() -> Self {
        Self::code(ReplyCode::Ok)
    }

    pub fn not_found() -> Self {
        Self::code(ReplyCode::ErrNotFound)
    }

    pub fn locked() -> Self {
        Self::code(ReplyCode::ErrLocked)
    }

    pub fn nan() -> Self {
        Self::code(ReplyCode::ErrNan)
    }

    pub fn err() -> Self {
        Self::code(ReplyCode::Err)
    }

    pub fn mem() -> Self {
        Self::code(ReplyCode::ErrMem)
    }

    pub fn item(encoding: Encoding, bytes: Vec<u8>) -> Self {
        Self {
            body: ReplyBody::Item { encoding, bytes },
            close_after: false,
        }
    }

    pub fn data(encoding: Encoding, bytes: Vec<u8>) -> Self {
        Self {
            body: ReplyBody::Data { encoding, bytes },
            close_after: false,
        }
    }

    pub fn number(value: i64) -> Self {
        Self::data(Encoding::Number, value.to_string().into_bytes())
    }

    pub fn kv_set(pairs: Vec<(Vec<u8>, Encoding, Vec<u8>)>) -> Self {
        Self {
            body: ReplyBody::KvSet(pairs),
            close_after: false,
        }
    }

    pub fn closing(mut self) -> Self {
        self.close_after = true;
        self
    }
}
