// Copyright 2024 Gibson Core Authors.
// Licensed under the BSD-3-Clause license.

//! Frame and reply encoding for the TCP front end. spec.md §6 treats both
//! the request framing and the reply encoder as external collaborators
//! the core calls into ("out of scope" per §1); this module is that
//! collaborator's concrete implementation for the `gibsond` binary. The
//! wire shape (length-delimited frames, a tag byte per reply variant) is
//! this rewrite's own choice, following the length-prefixed framing
//! `protocol-memcache`'s binary header module uses for its requests.

use gibson_core::{Reply, ReplyBody, ReplyCode};
use store::Encoding;

const LEN_PREFIX: usize = 4;

/// Opcode + payload bytes for one complete request, once a full frame has
/// arrived in `buf`. Pops the frame off the front of `buf` on success.
pub fn take_frame(buf: &mut Vec<u8>) -> Option<Vec<u8>> {
    if buf.len() < LEN_PREFIX {
        return None;
    }
    let len = u32::from_le_bytes([buf[0], buf[1], buf[2], buf[3]]) as usize;
    if buf.len() < LEN_PREFIX + len {
        return None;
    }
    let frame = buf[LEN_PREFIX..LEN_PREFIX + len].to_vec();
    buf.drain(..LEN_PREFIX + len);
    Some(frame)
}

fn encoding_byte(encoding: Encoding) -> u8 {
    match encoding {
        Encoding::Plain => 0,
        Encoding::Lzf => 1,
        Encoding::Number => 2,
    }
}

fn code_byte(code: ReplyCode) -> u8 {
    use ReplyCode::*;
    match code {
        Ok => 0,
        Err => 1,
        ErrNan => 2,
        ErrNotFound => 3,
        ErrLocked => 4,
        ErrMem => 5,
    }
}

fn push_field(out: &mut Vec<u8>, bytes: &[u8]) {
    out.extend_from_slice(&(bytes.len() as u32).to_le_bytes());
    out.extend_from_slice(bytes);
}

/// Encodes a reply body into a length-prefixed wire frame ready to write
/// to the socket.
pub fn encode_reply(reply: &Reply) -> Vec<u8> {
    use ReplyBody::*;

    let mut body = Vec::new();
    match &reply.body {
        Code(code) => {
            body.push(0);
            body.push(code_byte(*code));
        }
        Item { encoding, bytes } => {
            body.push(1);
            body.push(encoding_byte(*encoding));
            push_field(&mut body, bytes);
        }
        Data { encoding, bytes } => {
            body.push(2);
            body.push(encoding_byte(*encoding));
            push_field(&mut body, bytes);
        }
        KvSet(pairs) => {
            body.push(3);
            body.extend_from_slice(&(pairs.len() as u32).to_le_bytes());
            for (key, encoding, value) in pairs {
                push_field(&mut body, key);
                body.push(encoding_byte(*encoding));
                push_field(&mut body, value);
            }
        }
    }

    let mut frame = Vec::with_capacity(LEN_PREFIX + body.len());
    frame.extend_from_slice(&(body.len() as u32).to_le_bytes());
    frame.extend_from_slice(&body);
    frame
}
