// Copyright 2024 Gibson Core Authors.
// Licensed under the BSD-3-Clause license.

//! Opcode dispatch and payload parsing for the cache's binary request
//! frames. Split out of `crates/core` the way `protocol-memcache` and
//! `protocol-common` are split out of the teacher's `core/server`: this
//! crate knows nothing about item storage, only about slicing a request
//! payload into fields.

mod opcode;
mod parsing;

pub use opcode::Opcode;
pub use parsing::{
    parse_int, parse_key, parse_key_optvalue, parse_key_value, parse_ttl_key_value, ParseError,
};

/// Size, in bytes, of the opcode prefix on every request frame.
pub const OPCODE_LEN: usize = 2;

/// Splits a raw request frame into its opcode and payload. The opcode is
/// little-endian on the wire, per this rewrite's choice (the original C
/// source read it as a native `short`, which is platform-endian; picking
/// little-endian explicitly is this rewrite's documented choice).
pub fn split_frame(frame: &[u8]) -> Option<(Opcode, &[u8])> {
    if frame.len() < OPCODE_LEN {
        return None;
    }
    let raw = u16::from_le_bytes([frame[0], frame[1]]);
    Some((Opcode::from_u16(raw)?, &frame[OPCODE_LEN..]))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_frame_reads_little_endian_opcode() {
        let mut frame = (Opcode::Get as u16).to_le_bytes().to_vec();
        frame.extend_from_slice(b"foo");
        let (opcode, payload) = split_frame(&frame).unwrap();
        assert_eq!(opcode, Opcode::Get);
        assert_eq!(payload, b"foo");
    }

    #[test]
    fn split_frame_rejects_short_buffers() {
        assert!(split_frame(b"a").is_none());
    }

    #[test]
    fn split_frame_rejects_unknown_opcode() {
        let frame = 0xFFFFu16.to_le_bytes();
        assert!(split_frame(&frame).is_none());
    }
}
