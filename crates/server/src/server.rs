// Copyright 2024 Gibson Core Authors.
// Licensed under the BSD-3-Clause license.

//! The single-threaded event loop, grounded in `server/segcache/src/
//! main.rs`'s launch pattern but collapsed to one `mio::Poll` running on
//! the calling thread per spec.md §5 ("single-threaded cooperative"; no
//! worker pool, no session/queue crates). Every accepted connection's
//! frames are dispatched against one shared `Context` — there is no
//! locking because there is no concurrent handler.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;

use log::{debug, info, warn};
use mio::net::TcpListener;
use mio::{Events, Interest, Poll, Token};

use common::SystemClock;
use gibson_core::{Context, Dispatcher};

use crate::connection::Connection;

const LISTENER: Token = Token(0);

pub struct Server {
    poll: Poll,
    listener: TcpListener,
    connections: HashMap<Token, Connection>,
    next_token: usize,
    ctx: Context,
    dispatcher: Dispatcher,
}

impl Server {
    pub fn bind(addr: SocketAddr, limits: cache_config::Limits) -> std::io::Result<Self> {
        let poll = Poll::new()?;
        let mut listener = TcpListener::bind(addr)?;
        poll.registry()
            .register(&mut listener, LISTENER, Interest::READABLE)?;

        Ok(Self {
            poll,
            listener,
            connections: HashMap::new(),
            next_token: 1,
            ctx: Context::new(limits, Arc::new(SystemClock)),
            dispatcher: Dispatcher::new(),
        })
    }

    /// Runs the event loop forever. Each iteration blocks until at least
    /// one socket is ready, then drains every ready connection's frames
    /// before polling again — requests from one client are processed in
    /// arrival order, as spec.md §5 requires.
    pub fn run(&mut self) -> std::io::Result<()> {
        let mut events = Events::with_capacity(1024);
        info!("listening on {:?}", self.listener.local_addr());

        loop {
            self.poll.poll(&mut events, None)?;

            for event in events.iter() {
                match event.token() {
                    LISTENER => self.accept_all()?,
                    token => self.service(token),
                }
            }
        }
    }

    fn accept_all(&mut self) -> std::io::Result<()> {
        loop {
            match self.listener.accept() {
                Ok((mut stream, peer)) => {
                    let token = Token(self.next_token);
                    self.next_token += 1;
                    self.poll.registry().register(
                        &mut stream,
                        token,
                        Interest::READABLE | Interest::WRITABLE,
                    )?;
                    debug!("accepted connection from {peer} as {token:?}");
                    self.ctx.stats.total_clients += 1;
                    self.ctx.stats.total_connections += 1;
                    self.connections.insert(token, Connection::new(stream));
                }
                Err(ref e) if e.kind() == std::io::ErrorKind::WouldBlock => return Ok(()),
                Err(e) => return Err(e),
            }
        }
    }

    fn service(&mut self, token: Token) {
        let Some(conn) = self.connections.get_mut(&token) else {
            return;
        };

        let alive = match conn.read_available() {
            Ok(alive) => alive,
            Err(e) => {
                warn!("read error on {token:?}: {e}");
                false
            }
        };

        for frame in conn.drain_frames() {
            match self.dispatcher.dispatch(&mut self.ctx, &frame) {
                Ok(reply) => conn.queue_reply(&reply),
                Err(e) => warn!("dispatch error on {token:?}: {e}"),
            }
        }

        if let Some(conn) = self.connections.get_mut(&token) {
            if let Err(e) = conn.flush() {
                warn!("write error on {token:?}: {e}");
            }
        }

        let should_close = !alive
            || self
                .connections
                .get(&token)
                .map(|c| c.wants_to_close())
                .unwrap_or(true);

        if should_close {
            if let Some(mut conn) = self.connections.remove(&token) {
                let _ = self.poll.registry().deregister(&mut conn.stream);
            }
        }
    }
}
