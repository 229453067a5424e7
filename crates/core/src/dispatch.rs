// Copyright 2024 Gibson Core Authors.
// Licensed under the BSD-3-Clause license.

//! The dispatcher, rewritten from `gbProcessQuery`: reads the opcode
//! prefix, bumps the request counter, and routes to a handler.

use logger::klog;
use protocol_gibson::{split_frame, Opcode};
use thiserror::Error;

use crate::context::Context;
use crate::reply::Reply;
use crate::{bulk, single, stats};

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchError {
    /// The frame is shorter than the 2-byte opcode prefix, or the opcode
    /// byte pattern doesn't correspond to any known operation. The
    /// source leaves this case to the caller; per spec.md §4.8 a rewrite
    /// may drop the frame or close the connection. This crate reports it
    /// as an error and leaves the choice to the caller.
    #[error("malformed or unknown opcode")]
    UnknownOpcode,
}

#[derive(Debug, Default)]
pub struct Dispatcher;

impl Dispatcher {
    pub fn new() -> Self {
        Self
    }

    /// Dispatches one complete request frame (opcode + payload) against
    /// `ctx`, returning the reply to send back.
    pub fn dispatch(&self, ctx: &mut Context, frame: &[u8]) -> Result<Reply, DispatchError> {
        ctx.stats.total_requests += 1;

        let (opcode, payload) = split_frame(frame).ok_or(DispatchError::UnknownOpcode)?;

        let reply = match opcode {
            Opcode::Get => single::get(ctx, payload),
            Opcode::Set => single::set(ctx, payload),
            Opcode::Del => single::del(ctx, payload),
            Opcode::Ttl => single::ttl(ctx, payload),
            Opcode::Lock => single::lock(ctx, payload),
            Opcode::Unlock => single::unlock(ctx, payload),
            Opcode::Meta => single::meta(ctx, payload),
            Opcode::Inc => single::inc(ctx, payload),
            Opcode::Dec => single::dec(ctx, payload),
            Opcode::MGet => bulk::mget(ctx, payload),
            Opcode::MSet => bulk::mset(ctx, payload),
            Opcode::MDel => bulk::mdel(ctx, payload),
            Opcode::MTtl => bulk::mttl(ctx, payload),
            Opcode::MInc => bulk::minc(ctx, payload),
            Opcode::MDec => bulk::mdec(ctx, payload),
            Opcode::MLock => bulk::mlock(ctx, payload),
            Opcode::MUnlock => bulk::munlock(ctx, payload),
            Opcode::Count => bulk::count(ctx, payload),
            Opcode::Keys => bulk::keys(ctx, payload),
            Opcode::Stats => stats::stats(ctx, payload),
            Opcode::Ping => Reply::ok(),
            Opcode::End => Reply::ok().closing(),
        };

        klog!("opcode={:?} reply={:?}", opcode, reply.body);
        Ok(reply)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reply::ReplyBody;
    use crate::test_support::test_context_at;

    #[test]
    fn ping_replies_ok_without_closing() {
        let (mut ctx, _clock) = test_context_at(0);
        let dispatcher = Dispatcher::new();
        let mut frame = vec![18, 0];
        frame.extend_from_slice(b"");
        let reply = dispatcher.dispatch(&mut ctx, &frame).unwrap();
        assert_eq!(reply.body, ReplyBody::Code(crate::reply::ReplyCode::Ok));
        assert!(!reply.close_after);
    }

    #[test]
    fn end_replies_ok_and_closes() {
        let (mut ctx, _clock) = test_context_at(0);
        let dispatcher = Dispatcher::new();
        let frame = vec![21, 0];
        let reply = dispatcher.dispatch(&mut ctx, &frame).unwrap();
        assert!(reply.close_after);
    }

    #[test]
    fn unknown_opcode_is_an_error() {
        let (mut ctx, _clock) = test_context_at(0);
        let dispatcher = Dispatcher::new();
        let frame = vec![255, 255];
        assert_eq!(
            dispatcher.dispatch(&mut ctx, &frame),
            Err(DispatchError::UnknownOpcode)
        );
    }

    #[test]
    fn dispatch_routes_set_and_get() {
        let (mut ctx, _clock) = test_context_at(0);
        let dispatcher = Dispatcher::new();

        let mut set_frame = vec![1, 0];
        set_frame.extend_from_slice(b"-1 foo bar");
        let reply = dispatcher.dispatch(&mut ctx, &set_frame).unwrap();
        assert!(matches!(reply.body, ReplyBody::Item { .. }));

        let mut get_frame = vec![0, 0];
        get_frame.extend_from_slice(b"foo");
        let reply = dispatcher.dispatch(&mut ctx, &get_frame).unwrap();
        match reply.body {
            ReplyBody::Item { bytes, .. } => assert_eq!(bytes, b"bar"),
            other => panic!("unexpected reply: {other:?}"),
        }

        assert_eq!(ctx.stats.total_requests, 2);
    }
}
