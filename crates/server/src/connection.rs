// Copyright 2024 Gibson Core Authors.
// Licensed under the BSD-3-Clause license.

use std::io::{Read, Write};

use mio::net::TcpStream;

use crate::codec::{encode_reply, take_frame};

/// Per-client read/write buffering. One of these exists per accepted
/// connection; the event loop in `server.rs` drives it.
pub struct Connection {
    pub stream: TcpStream,
    read_buf: Vec<u8>,
    write_buf: Vec<u8>,
    pub closing: bool,
}

impl Connection {
    pub fn new(stream: TcpStream) -> Self {
        Self {
            stream,
            read_buf: Vec::with_capacity(4096),
            write_buf: Vec::new(),
            closing: false,
        }
    }

    /// Reads whatever is available into the read buffer. Returns `false`
    /// if the peer closed the connection.
    pub fn read_available(&mut self) -> std::io::Result<bool> {
        let mut chunk = [0u8; 4096];
        loop {
            match self.stream.read(&mut chunk) {
                Ok(0) => return Ok(false),
                Ok(n) => self.read_buf.extend_from_slice(&chunk[..n]),
                Err(ref e) if e.kind() == std::io::ErrorKind::WouldBlock => return Ok(true),
                Err(ref e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        }
    }

    /// Pulls every complete request frame currently buffered.
    pub fn drain_frames(&mut self) -> Vec<Vec<u8>> {
        let mut frames = Vec::new();
        while let Some(frame) = take_frame(&mut self.read_buf) {
            frames.push(frame);
        }
        frames
    }

    pub fn queue_reply(&mut self, reply: &gibson_core::Reply) {
        self.write_buf.extend_from_slice(&encode_reply(reply));
        if reply.close_after {
            self.closing = true;
        }
    }

    /// Flushes as much of the write buffer as the socket will take right
    /// now.
    pub fn flush(&mut self) -> std::io::Result<()> {
        while !self.write_buf.is_empty() {
            match self.stream.write(&self.write_buf) {
                Ok(0) => break,
                Ok(n) => {
                    self.write_buf.drain(..n);
                }
                Err(ref e) if e.kind() == std::io::ErrorKind::WouldBlock => break,
                Err(ref e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        }
        Ok(())
    }

    pub fn wants_to_close(&self) -> bool {
        self.closing && self.write_buf.is_empty()
    }
}
